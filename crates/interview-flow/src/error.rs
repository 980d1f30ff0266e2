//! Top-level error for the command-line front end.

use crate::config::ConfigError;
use crate::flow::declaration::DefinitionLoadError;
use crate::flow::router::NavigationError;
use crate::snapshot::SnapshotLoadError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Definition(DefinitionLoadError),
    Snapshot(SnapshotLoadError),
    Navigation(NavigationError),
    Json(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {err}"),
            AppError::Definition(err) => write!(f, "flow definition error: {err}"),
            AppError::Snapshot(err) => write!(f, "fact snapshot error: {err}"),
            AppError::Navigation(err) => write!(f, "navigation error: {err}"),
            AppError::Json(err) => write!(f, "could not render output: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Definition(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Navigation(err) => Some(err),
            AppError::Json(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<DefinitionLoadError> for AppError {
    fn from(value: DefinitionLoadError) -> Self {
        Self::Definition(value)
    }
}

impl From<SnapshotLoadError> for AppError {
    fn from(value: SnapshotLoadError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<NavigationError> for AppError {
    fn from(value: NavigationError) -> Self {
        Self::Navigation(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
