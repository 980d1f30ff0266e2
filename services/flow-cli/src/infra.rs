use chrono::NaiveDate;
use interview_flow::error::AppError;
use interview_flow::flow::batches::BatchState;
use interview_flow::flow::{FlowDeclaration, FlowGraph, ImportProfileState, InMemoryFactStore};
use interview_flow::snapshot::{load_facts, load_imports};
use serde::Serialize;
use std::path::{Path, PathBuf};

const SAMPLE_FLOW: &str = "sample_flow.json";
const SAMPLE_FACTS: &str = "sample_facts.csv";

fn sample_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

pub(crate) fn load_graph(path: Option<PathBuf>) -> Result<FlowGraph, AppError> {
    let path = path.unwrap_or_else(|| sample_path(SAMPLE_FLOW));
    Ok(FlowDeclaration::load_graph(path)?)
}

pub(crate) fn load_snapshot_inputs(
    facts: Option<PathBuf>,
    imports: Option<PathBuf>,
) -> Result<(InMemoryFactStore, ImportProfileState), AppError> {
    let facts = load_facts(facts.unwrap_or_else(|| sample_path(SAMPLE_FACTS)))?;
    let imports = match imports {
        Some(path) => load_imports(path)?,
        None => ImportProfileState::default(),
    };
    Ok((facts, imports))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_batch_state(raw: &str) -> Result<BatchState, String> {
    let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
    serde_json::from_value(value).map_err(|_| {
        format!(
            "unknown batch state '{raw}' \
             (expected locked, unlocked, publishable or unpublishable)"
        )
    })
}
