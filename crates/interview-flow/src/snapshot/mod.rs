//! Loading fact snapshots, import profiles and submission status from disk.

mod parser;

use crate::flow::alerts::SubmissionStatus;
use crate::flow::facts::InMemoryFactStore;
use crate::flow::import::ImportProfileState;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum SnapshotLoadError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    InvalidRow { line: usize, reason: String },
}

impl fmt::Display for SnapshotLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotLoadError::Io(err) => write!(f, "failed to read snapshot: {}", err),
            SnapshotLoadError::Csv(err) => write!(f, "invalid fact CSV data: {}", err),
            SnapshotLoadError::Json(err) => write!(f, "invalid snapshot JSON: {}", err),
            SnapshotLoadError::InvalidRow { line, reason } => {
                write!(f, "invalid fact on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for SnapshotLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotLoadError::Io(err) => Some(err),
            SnapshotLoadError::Csv(err) => Some(err),
            SnapshotLoadError::Json(err) => Some(err),
            SnapshotLoadError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SnapshotLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for SnapshotLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Parses a `path,kind,value,complete` CSV export.
pub fn facts_from_csv<R: Read>(reader: R) -> Result<InMemoryFactStore, SnapshotLoadError> {
    parser::parse_facts(reader)
}

/// Parses a JSON object mapping fact paths to `{ complete, value }`.
pub fn facts_from_json<R: Read>(reader: R) -> Result<InMemoryFactStore, SnapshotLoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Loads facts from a `.csv` or `.json` file; other extensions are read as CSV.
pub fn load_facts<P: AsRef<Path>>(path: P) -> Result<InMemoryFactStore, SnapshotLoadError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let store = if is_json {
        facts_from_json(reader)?
    } else {
        facts_from_csv(reader)?
    };
    info!(path = %path.display(), facts = store.len(), "loaded fact snapshot");
    Ok(store)
}

pub fn load_imports<P: AsRef<Path>>(path: P) -> Result<ImportProfileState, SnapshotLoadError> {
    load_json(path)
}

pub fn load_submission<P: AsRef<Path>>(path: P) -> Result<SubmissionStatus, SnapshotLoadError> {
    load_json(path)
}

fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, SnapshotLoadError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
