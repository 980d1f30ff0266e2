//! Declarative flow definition as stored on disk.

use crate::flow::batches::BatchDetails;
use crate::flow::condition::{one_or_many, Condition};
use crate::flow::content::{AlertKind, ContentItem};
use crate::flow::graph::{FlowDefinitionError, FlowGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Root of a flow definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDeclaration {
    #[serde(default)]
    pub batches: BTreeMap<String, BatchDetails>,
    pub categories: Vec<FlowNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNode {
    Category(CategoryDecl),
    Subcategory(SubcategoryDecl),
    SubSubcategory(SubSubcategoryDecl),
    CollectionLoop(CollectionLoopDecl),
    /// Applies `condition` to every descendant.
    Gate(GateDecl),
    Screen(ScreenDecl),
    Assertion(AssertionDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDecl {
    pub route: String,
    #[serde(default)]
    pub children: Vec<FlowNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryDecl {
    pub route: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub complete_if: Vec<Condition>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub display_only_if: Vec<Condition>,
    #[serde(default)]
    pub skip_data_view: bool,
    #[serde(default)]
    pub is_sign_and_submit: bool,
    #[serde(default)]
    pub lock_future_sections_if_collection_items_incomplete: bool,
    #[serde(default)]
    pub collection_context: Option<String>,
    #[serde(default)]
    pub children: Vec<FlowNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSubcategoryDecl {
    pub route: String,
    #[serde(default)]
    pub children: Vec<FlowNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionLoopDecl {
    pub loop_name: String,
    /// Defaults to the enclosing collection context.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub auto_iterate: bool,
    #[serde(default)]
    pub is_inner: bool,
    #[serde(default)]
    pub collection_item_completed_condition: Option<Condition>,
    #[serde(default)]
    pub done_path: Option<String>,
    #[serde(default)]
    pub knockout_route: Option<String>,
    #[serde(default)]
    pub children: Vec<FlowNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecl {
    pub condition: Condition,
    #[serde(default)]
    pub children: Vec<FlowNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDecl {
    pub route: String,
    /// Appended after every enclosing gate condition.
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub route_automatically: Option<bool>,
    #[serde(default)]
    pub is_knockout: bool,
    #[serde(default)]
    pub act_as_data_view: bool,
    #[serde(default)]
    pub has_screen_route_override: bool,
    pub content: Vec<ContentItem>,
}

/// Summary assertion shown on a subcategory's data view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionDecl {
    pub assertion_type: AlertKind,
    pub i18n_key: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub edit_route: Option<String>,
}

#[derive(Debug)]
pub enum DefinitionLoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(FlowDefinitionError),
}

impl fmt::Display for DefinitionLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionLoadError::Io(err) => write!(f, "failed to read flow definition: {}", err),
            DefinitionLoadError::Json(err) => write!(f, "invalid flow definition JSON: {}", err),
            DefinitionLoadError::Invalid(err) => write!(f, "invalid flow definition: {}", err),
        }
    }
}

impl std::error::Error for DefinitionLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DefinitionLoadError::Io(err) => Some(err),
            DefinitionLoadError::Json(err) => Some(err),
            DefinitionLoadError::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DefinitionLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for DefinitionLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<FlowDefinitionError> for DefinitionLoadError {
    fn from(err: FlowDefinitionError) -> Self {
        Self::Invalid(err)
    }
}

impl FlowDeclaration {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DefinitionLoadError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionLoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses and builds the graph in one step.
    pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<FlowGraph, DefinitionLoadError> {
        let declaration = Self::from_path(path)?;
        Ok(FlowGraph::build(&declaration)?)
    }
}
