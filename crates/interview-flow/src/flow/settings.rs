use serde::{Deserialize, Serialize};

pub const KNOCKOUT_CATEGORY: &str = "/flow/knockout";

/// Deployment switches that conditions and the checklist consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Backs the `experimental` condition.
    pub experimental: bool,
    /// Enables the electronic signing path condition.
    pub essar_signing: bool,
    /// Category routes the checklist never shows.
    pub excluded_categories: Vec<String>,
    /// Facts that must all hold `false` before a return may be submitted.
    pub submission_blocking_facts: Vec<String>,
    /// Writable facts that never count towards a section being started.
    pub optional_facts: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            experimental: false,
            essar_signing: false,
            excluded_categories: vec![KNOCKOUT_CATEGORY.to_string()],
            submission_blocking_facts: Vec::new(),
            optional_facts: Vec::new(),
        }
    }
}

impl EngineSettings {
    pub fn is_excluded_category(&self, route: &str) -> bool {
        self.excluded_categories.iter().any(|excluded| excluded == route)
    }

    pub fn is_optional_fact(&self, path: &str) -> bool {
        self.optional_facts.iter().any(|optional| optional == path)
    }
}
