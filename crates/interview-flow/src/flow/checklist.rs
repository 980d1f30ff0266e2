//! Checklist state: one left-to-right pass over every displayed subcategory
//! deciding which sections are complete, which one is next, and where each
//! row links to.

use crate::flow::alerts::{loop_alerts, mef_alerts, screen_alerts, AlertConfigs, SubmissionStatus};
use crate::flow::condition::conditions_pass;
use crate::flow::facts::Snapshot;
use crate::flow::graph::{Category, FlowGraph, Subcategory};
use crate::flow::path;
use crate::flow::progress::subcategory_has_some_completed_facts;
use crate::flow::screen::RouteOptions;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistCategory {
    pub route: String,
    pub active: bool,
    pub subcategories: Vec<ChecklistSubcategoryState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistSubcategoryState {
    pub subcategory_route: String,
    pub is_complete: bool,
    pub is_next: bool,
    pub is_started_but_not_complete: bool,
    pub has_incomplete_collection_item: bool,
    pub navigation_url: Option<String>,
    pub alerts: AlertConfigs,
    pub mef_alerts: AlertConfigs,
}

impl ChecklistSubcategoryState {
    /// Rows that are neither complete nor next cannot be opened yet.
    pub fn is_locked(&self) -> bool {
        !self.is_complete && !self.is_next
    }
}

/// State carried from one subcategory to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldState {
    /// Every displayed subcategory before this point is complete.
    pub prev_subcategory_complete: bool,
    /// The current category holds a complete or next subcategory.
    pub category_active: bool,
}

impl Default for FoldState {
    fn default() -> Self {
        Self {
            prev_subcategory_complete: true,
            category_active: false,
        }
    }
}

impl FoldState {
    fn enter_category(self) -> Self {
        Self {
            category_active: false,
            ..self
        }
    }
}

/// Computes the checklist for `snapshot`. Categories excluded by the engine
/// settings are skipped, as are subcategories whose display guard fails.
pub fn compute_checklist(
    graph: &FlowGraph,
    snapshot: &Snapshot<'_>,
    submission: Option<&SubmissionStatus>,
) -> Vec<ChecklistCategory> {
    let (categories, _) = graph
        .categories()
        .iter()
        .filter(|category| !snapshot.settings().is_excluded_category(&category.route))
        .fold((Vec::new(), FoldState::default()), |(mut categories, state), category| {
            let (row, state) = category_state(graph, category, snapshot, submission, state);
            categories.push(row);
            (categories, state)
        });
    debug!(categories = categories.len(), "computed checklist");
    categories
}

fn category_state(
    graph: &FlowGraph,
    category: &Category,
    snapshot: &Snapshot<'_>,
    submission: Option<&SubmissionStatus>,
    state: FoldState,
) -> (ChecklistCategory, FoldState) {
    let mut state = state.enter_category();
    let mut subcategories = Vec::with_capacity(category.subcategories.len());
    for id in &category.subcategories {
        let subcategory = graph.subcategory(*id);
        let (row, next_state) = subcategory_state(graph, subcategory, snapshot, submission, state);
        state = next_state;
        subcategories.extend(row);
    }
    let row = ChecklistCategory {
        route: category.route.clone(),
        active: state.category_active,
        subcategories,
    };
    (row, state)
}

/// One step of the fold. Hidden subcategories produce no row and leave the
/// state untouched.
pub fn subcategory_state(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    snapshot: &Snapshot<'_>,
    submission: Option<&SubmissionStatus>,
    state: FoldState,
) -> (Option<ChecklistSubcategoryState>, FoldState) {
    let item_id = subcategory.context_item(snapshot);
    let item = item_id.as_deref();

    if !conditions_pass(&subcategory.display_only_if, snapshot, item) {
        trace!(subcategory = %subcategory.route, "subcategory hidden");
        return (None, state);
    }

    let mut state = state;
    let started = subcategory_has_some_completed_facts(graph, subcategory, snapshot, item);
    let has_incomplete_collection_item = state.prev_subcategory_complete
        && started
        && subcategory.loops.iter().any(|id| {
            let collection_loop = graph.collection_loop(*id);
            collection_loop.is_available(graph, snapshot, item)
                && collection_loop.has_incomplete_item(snapshot)
        });
    let locked_by_items = subcategory.lock_future_sections_if_collection_items_incomplete
        && has_incomplete_collection_item;

    let mut is_complete = state.prev_subcategory_complete
        && !subcategory.completion_conditions.is_empty()
        && conditions_pass(&subcategory.completion_conditions, snapshot, item)
        && !locked_by_items;
    let mut is_next = state.prev_subcategory_complete && !is_complete;
    if is_next {
        state.prev_subcategory_complete = false;
    }
    if is_next || is_complete {
        state.category_active = true;
    }

    let mut is_started_but_not_complete = is_next && started;
    let navigation_url = if is_next || is_complete {
        let show_data_view = is_complete || is_started_but_not_complete;
        navigation_url(graph, subcategory, snapshot, item, state, show_data_view)
    } else {
        None
    };

    if is_next && navigation_url.is_none() {
        // Nothing to open: the section counts as done and the walk moves on.
        trace!(subcategory = %subcategory.route, "next subcategory has no reachable screen");
        is_next = false;
        is_complete = true;
        is_started_but_not_complete = false;
        state.prev_subcategory_complete = true;
    }

    let mut alerts = AlertConfigs::default();
    if state.category_active {
        screen_alerts(graph, &subcategory.screens, snapshot, item, &mut alerts);
        alerts.merge(loop_alerts(graph, &subcategory.loops, snapshot));
    }
    let mef_alerts = match submission {
        Some(status) if status.has_rejections() => {
            mef_alerts(graph, &subcategory.screens, snapshot, item, status)
        }
        _ => AlertConfigs::default(),
    };

    trace!(
        subcategory = %subcategory.route,
        is_complete,
        is_next,
        started,
        "checklist row"
    );

    let row = ChecklistSubcategoryState {
        subcategory_route: subcategory.route.clone(),
        is_complete,
        is_next,
        is_started_but_not_complete,
        has_incomplete_collection_item,
        navigation_url,
        alerts,
        mef_alerts,
    };
    (Some(row), state)
}

fn navigation_url(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
    state: FoldState,
    show_data_view: bool,
) -> Option<String> {
    if !state.category_active {
        return None;
    }

    if subcategory.has_data_view && show_data_view {
        let override_screen = subcategory
            .screens
            .iter()
            .map(|id| graph.screen(*id))
            .filter(|screen| screen.act_as_data_view)
            .find(|screen| screen.is_available(snapshot, item_id));
        if let Some(screen) = override_screen {
            return Some(screen.full_route(item_id, RouteOptions::REVIEW));
        }
        let params = path::route_params(subcategory.collection_name.as_deref(), item_id, true);
        return Some(path::with_query(&format!("/data-view{}", subcategory.route), &params));
    }

    subcategory
        .screens
        .iter()
        .map(|id| graph.screen(*id))
        .find(|screen| screen.is_available(snapshot, item_id))
        .map(|screen| screen.full_route(item_id, RouteOptions::default()))
}
