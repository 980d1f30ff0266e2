use crate::flow::facts::{FactResult, FactValue, InMemoryFactStore};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::SnapshotLoadError;

/// Reads a fact export with `path,kind,value,complete` columns.
///
/// An empty value yields an incomplete fact with no value; `complete=false`
/// with a value yields a placeholder. Collection members are separated by `;`.
pub(crate) fn parse_facts<R: Read>(reader: R) -> Result<InMemoryFactStore, SnapshotLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut store = InMemoryFactStore::new();

    for (index, record) in csv_reader.deserialize::<FactRow>().enumerate() {
        let row = record?;
        // Header is line 1.
        let line = index + 2;
        let (path, result) = row
            .into_result()
            .map_err(|reason| SnapshotLoadError::InvalidRow { line, reason })?;
        store.insert(path, result);
    }

    Ok(store)
}

#[derive(Debug, Deserialize)]
struct FactRow {
    path: String,
    kind: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    complete: Option<String>,
}

impl FactRow {
    fn into_result(self) -> Result<(String, FactResult), String> {
        if !self.path.starts_with('/') {
            return Err(format!("fact path `{}` must start with `/`", self.path));
        }
        let complete = match self.complete.as_deref() {
            None => true,
            Some(flag) => parse_bool(flag)
                .ok_or_else(|| format!("invalid complete flag `{flag}` for {}", self.path))?,
        };
        let Some(raw) = self.value else {
            return Ok((self.path, FactResult::incomplete()));
        };
        let value = parse_value(&self.kind, &raw)
            .map_err(|reason| format!("{} ({})", reason, self.path))?;
        let result = if complete {
            FactResult::complete(value)
        } else {
            FactResult::placeholder(value)
        };
        Ok((self.path, result))
    }
}

fn parse_value(kind: &str, raw: &str) -> Result<FactValue, String> {
    match kind.to_ascii_lowercase().as_str() {
        "boolean" | "bool" => parse_bool(raw)
            .map(FactValue::Boolean)
            .ok_or_else(|| format!("invalid boolean `{raw}`")),
        "text" | "string" => Ok(FactValue::Text(raw.to_string())),
        "number" | "dollar" => raw
            .replace(',', "")
            .parse::<f64>()
            .map(FactValue::Number)
            .map_err(|_| format!("invalid number `{raw}`")),
        "collection" => Ok(FactValue::Collection(
            raw.split(';')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        "item" | "item_ref" => Ok(FactValue::ItemRef(raw.to_string())),
        other => Err(format!("unknown fact kind `{other}`")),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
