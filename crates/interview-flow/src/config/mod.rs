use crate::flow::settings::{EngineSettings, KNOCKOUT_CATEGORY};
use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the engine and its command-line front end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let engine = EngineConfig {
            excluded_categories: env::var("FLOW_EXCLUDED_CATEGORIES")
                .map(|value| split_list(&value))
                .unwrap_or_else(|_| vec![KNOCKOUT_CATEGORY.to_string()]),
            experimental: read_flag("FLOW_EXPERIMENTAL")?,
            essar_signing: read_flag("FLOW_ESSAR_SIGNING")?,
            submission_blocking_facts: read_list("FLOW_SUBMISSION_BLOCKING_FACTS"),
            optional_facts: read_list("FLOW_OPTIONAL_FACTS"),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            experimental: self.engine.experimental,
            essar_signing: self.engine.essar_signing,
            excluded_categories: self.engine.excluded_categories.clone(),
            submission_blocking_facts: self.engine.submission_blocking_facts.clone(),
            optional_facts: self.engine.optional_facts.clone(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Feature switches and fact lists handed to the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub excluded_categories: Vec<String>,
    pub experimental: bool,
    pub essar_signing: bool,
    pub submission_blocking_facts: Vec<String>,
    pub optional_facts: Vec<String>,
}

fn read_flag(var: &'static str) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidBoolean { var, value }),
        Err(_) => Ok(false),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn read_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|value| split_list(&value))
        .unwrap_or_default()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBoolean { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBoolean { var, value } => {
                write!(
                    f,
                    "{var} must be a boolean (true/false, 1/0, yes/no, on/off), got '{value}'"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
