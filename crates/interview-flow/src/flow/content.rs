use crate::flow::condition::{one_or_many, Condition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Warning,
    Error,
}

impl AlertKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Boolean,
    Text,
    Enum,
    MultiEnum,
    Dollar,
    Date,
    Address,
    Tin,
    Pin,
    /// Picks an existing collection item; never required.
    Select,
}

/// Restricts a fact field to one rendering of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOnlyOn {
    Edit,
    DataView,
}

/// One declared element of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(flatten)]
    pub node: ContentNode,
    #[serde(default, deserialize_with = "one_or_many")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub batches: Vec<String>,
}

impl ContentItem {
    pub fn new(node: ContentNode) -> Self {
        Self {
            node,
            conditions: Vec::new(),
            batches: Vec::new(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    Heading {
        i18n_key: String,
    },
    InfoDisplay {
        i18n_key: String,
    },
    Fact {
        path: String,
        kind: FactKind,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        display_only_on: Option<DisplayOnlyOn>,
    },
    SetFactAction {
        path: String,
        source: String,
    },
    TaxReturnAlert {
        alert_type: AlertKind,
        i18n_key: String,
        #[serde(default)]
        fact_paths: Vec<String>,
    },
    MefAlert {
        alert_type: AlertKind,
        i18n_key: String,
        mef_error_code: String,
        #[serde(default)]
        fact_paths: Vec<String>,
    },
    CollectionItemManager {
        path: String,
        #[serde(default)]
        loop_name: Option<String>,
    },
    CollectionDataPreview,
    SaveAndContinueButton,
    SetFactAndContinueButton,
    ExitButton,
    SubmitButton,
    KnockoutButton,
    InternalLink {
        route: String,
    },
    CollectionDataViewInternalLink {
        route: String,
    },
}

impl ContentNode {
    pub fn heading(i18n_key: impl Into<String>) -> Self {
        ContentNode::Heading {
            i18n_key: i18n_key.into(),
        }
    }

    pub fn fact(path: impl Into<String>, kind: FactKind) -> Self {
        ContentNode::Fact {
            path: path.into(),
            kind,
            read_only: false,
            display_only_on: None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, ContentNode::Heading { .. })
    }

    /// Whether this element lets the filer leave the screen.
    pub fn is_navigation_control(&self) -> bool {
        match self {
            ContentNode::SaveAndContinueButton
            | ContentNode::SetFactAndContinueButton
            | ContentNode::ExitButton
            | ContentNode::SubmitButton
            | ContentNode::KnockoutButton
            | ContentNode::CollectionItemManager { .. }
            | ContentNode::CollectionDataPreview
            | ContentNode::InternalLink { .. }
            | ContentNode::CollectionDataViewInternalLink { .. } => true,
            ContentNode::Heading { .. }
            | ContentNode::InfoDisplay { .. }
            | ContentNode::Fact { .. }
            | ContentNode::SetFactAction { .. }
            | ContentNode::TaxReturnAlert { .. }
            | ContentNode::MefAlert { .. } => false,
        }
    }

    pub fn fact_path(&self) -> Option<&str> {
        match self {
            ContentNode::Fact { path, .. } => Some(path),
            _ => None,
        }
    }

    /// A fact the filer must answer: writable, shown while editing and not a
    /// collection picker.
    pub fn required_fact_path(&self) -> Option<&str> {
        match self {
            ContentNode::Fact {
                path,
                kind,
                read_only,
                display_only_on,
            } if !read_only
                && *kind != FactKind::Select
                && *display_only_on != Some(DisplayOnlyOn::DataView) =>
            {
                Some(path)
            }
            _ => None,
        }
    }
}
