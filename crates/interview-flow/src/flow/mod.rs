//! Flow model: declaration, graph, condition evaluation, navigation and
//! checklist aggregation.

pub mod alerts;
pub mod batches;
pub mod checklist;
pub mod condition;
pub mod content;
pub mod declaration;
pub mod facts;
pub mod graph;
pub mod import;
pub mod loops;
pub mod path;
pub mod progress;
pub mod router;
pub mod screen;
pub mod settings;

#[cfg(test)]
mod tests;

pub use alerts::{AlertConfig, AlertConfigs, RejectionCode, SubmissionStatus};
pub use batches::{BatchDetails, BatchState, BatchStatus, ContentBatches, ScreenStatus};
pub use checklist::{compute_checklist, ChecklistCategory, ChecklistSubcategoryState, FoldState};
pub use condition::{conditions_pass, Condition, ConditionOperator};
pub use content::{AlertKind, ContentItem, ContentNode, FactKind};
pub use declaration::{DefinitionLoadError, FlowDeclaration, FlowNode};
pub use facts::{FactResult, FactStore, FactValue, InMemoryFactStore, Snapshot};
pub use graph::{
    CollectionLoop, FlowDefinitionError, FlowGraph, LoopId, ScreenId, Subcategory, SubcategoryId,
};
pub use import::{ImportProfile, ImportProfileState, ImportSection, ImportValue};
pub use loops::LoopProgress;
pub use progress::{subcategory_progress, LoopSummary, ResumePoint, SubcategoryProgress};
pub use router::{
    next_screen, next_screen_from_route, Destination, NavigationError, NavigationOptions,
    NavigationResult, CHECKLIST_ROUTE,
};
pub use screen::{RouteOptions, Screen};
pub use settings::EngineSettings;
