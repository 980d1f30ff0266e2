//! Content batches: review workflow metadata attached to screen content.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub type ContentBatches = BTreeMap<String, BatchDetails>;

/// Workflow step a content batch is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "WIP")]
    Wip,
    #[serde(rename = "DF Review")]
    DfReview,
    #[serde(rename = "CC Review")]
    CcReview,
    #[serde(rename = "Translation Check")]
    TranslationCheck,
    #[serde(rename = "Complete")]
    Complete,
}

impl BatchStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Wip,
            Self::DfReview,
            Self::CcReview,
            Self::TranslationCheck,
            Self::Complete,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Wip => "WIP",
            Self::DfReview => "DF Review",
            Self::CcReview => "CC Review",
            Self::TranslationCheck => "Translation Check",
            Self::Complete => "Complete",
        }
    }

    const fn is_review(self) -> bool {
        matches!(self, Self::DfReview | Self::CcReview | Self::TranslationCheck)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchType {
    Admin,
    #[default]
    Content,
}

/// Derived publication state used to filter screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Locked,
    Unlocked,
    Publishable,
    Unpublishable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchHistoryItem {
    pub status: BatchStatus,
    #[serde(default, deserialize_with = "optional_date")]
    pub completed: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDetails {
    #[serde(rename = "type", default)]
    pub batch_type: BatchType,
    pub status: BatchStatus,
    #[serde(default, deserialize_with = "optional_date")]
    pub started: Option<NaiveDate>,
    #[serde(default)]
    pub history: Vec<BatchHistoryItem>,
}

impl BatchDetails {
    /// Days since the batch entered its current status, when known.
    pub fn days_in_status(&self, today: NaiveDate) -> Option<i64> {
        let entered = self
            .history
            .iter()
            .filter_map(|item| item.completed)
            .max()
            .or(self.started)?;
        Some((today - entered).num_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenStatus {
    pub is_open: bool,
    pub is_locked: bool,
    pub is_publishable: bool,
}

impl Default for ScreenStatus {
    fn default() -> Self {
        Self {
            is_open: false,
            is_locked: false,
            is_publishable: true,
        }
    }
}

/// Folds the statuses of a screen's batches. An unregistered batch name stops
/// the fold and returns the state accumulated so far.
pub fn screen_status(batch_names: &[String], batches: &ContentBatches) -> ScreenStatus {
    let mut status = ScreenStatus::default();
    for name in batch_names {
        let Some(batch) = batches.get(name) else {
            return status;
        };
        if batch.status != BatchStatus::Complete {
            status.is_open = true;
            status.is_publishable = false;
        }
        if batch.status.is_review() {
            status.is_locked = true;
        }
    }
    status
}

pub fn screen_is_in_state(
    state: BatchState,
    batch_names: &[String],
    batches: &ContentBatches,
) -> bool {
    let status = screen_status(batch_names, batches);
    match state {
        BatchState::Locked => status.is_locked,
        BatchState::Unlocked => !status.is_locked,
        BatchState::Publishable => status.is_publishable,
        BatchState::Unpublishable => !status.is_publishable,
    }
}

/// Whether any of the screen's batches is currently at `step`.
pub fn screen_is_in_workflow_step(
    step: BatchStatus,
    batch_names: &[String],
    batches: &ContentBatches,
) -> bool {
    batch_names
        .iter()
        .filter_map(|name| batches.get(name))
        .any(|batch| batch.status == step)
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
