//! Next-screen routing.
//!
//! Rules are applied in priority order: loop iteration, loop hub return, the
//! forward scan, knockout short-circuit, review-mode redirection, same
//! subcategory continuation and finally the cross-subcategory exit.

use crate::flow::facts::Snapshot;
use crate::flow::graph::{FlowGraph, ScreenId};
use crate::flow::path;
use crate::flow::screen::{LoopMembership, RouteOptions, Screen};
use serde::Serialize;
use tracing::{debug, warn};

pub const CHECKLIST_ROUTE: &str = "/checklist";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationOptions {
    /// Review mode: leaving a sub-subcategory returns to its data view.
    pub navigate_to_data_view_at_end_of_sub_subcategory: bool,
}

impl NavigationOptions {
    pub const REVIEW: Self = Self {
        navigate_to_data_view_at_end_of_sub_subcategory: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    Screen { screen: ScreenId },
    Checklist,
    /// Read-only summary of a subcategory, optionally anchored at one
    /// sub-subcategory.
    DataView {
        subcategory_route: String,
        section: Option<String>,
    },
    /// Hub of a non-auto-iterating loop for one item.
    LoopDataView { loop_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationResult {
    pub destination: Destination,
    pub item_id: Option<String>,
}

impl NavigationResult {
    pub fn screen(screen: ScreenId, item_id: Option<String>) -> Self {
        Self {
            destination: Destination::Screen { screen },
            item_id,
        }
    }

    fn checklist(item_id: Option<&str>) -> Self {
        Self {
            destination: Destination::Checklist,
            item_id: item_id.map(str::to_string),
        }
    }

    pub fn screen_id(&self) -> Option<ScreenId> {
        match self.destination {
            Destination::Screen { screen } => Some(screen),
            _ => None,
        }
    }

    pub fn full_route(&self, graph: &FlowGraph) -> String {
        match &self.destination {
            Destination::Screen { screen } => graph
                .screen(*screen)
                .full_route(self.item_id.as_deref(), RouteOptions::default()),
            Destination::Checklist => CHECKLIST_ROUTE.to_string(),
            Destination::DataView {
                subcategory_route,
                section: Some(section),
            } => format!("/data-view{subcategory_route}#{section}"),
            Destination::DataView {
                subcategory_route,
                section: None,
            } => format!("/data-view{subcategory_route}"),
            Destination::LoopDataView { loop_name } => {
                let base = format!("/data-view/loop/{}", path::encode_component(loop_name));
                match &self.item_id {
                    Some(item_id) => format!("{base}/{item_id}"),
                    None => base,
                }
            }
        }
    }
}

/// Traversal defects: a broken flow definition, never a runtime state.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("screen {screen} is not part of the flow")]
    ScreenNotInFlow { screen: String },
    #[error("no available screen follows {screen}")]
    NoAvailableNextScreen { screen: String },
    #[error("collection loop {loop_name} is not part of the flow")]
    UnknownLoop { loop_name: String },
    #[error("collection loop {loop_name} has no available screen for item {item_id}")]
    LoopWithoutAvailableScreen { loop_name: String, item_id: String },
    #[error("screen {screen} is not inside a sub-subcategory")]
    MissingSubSubcategory { screen: String },
}

/// Resolves `route` (`subcategory_route/route`) and routes from it.
pub fn next_screen_from_route(
    graph: &FlowGraph,
    route: &str,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
    options: NavigationOptions,
) -> Result<NavigationResult, NavigationError> {
    let current = graph
        .screen_by_route(route)
        .ok_or_else(|| NavigationError::ScreenNotInFlow {
            screen: route.to_string(),
        })?;
    next_screen(graph, current, snapshot, item_id, options)
}

pub fn next_screen(
    graph: &FlowGraph,
    current: ScreenId,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
    options: NavigationOptions,
) -> Result<NavigationResult, NavigationError> {
    let Some(current_screen) = graph.screens().get(current.index()) else {
        warn!(index = current.index(), "navigation requested from unknown screen");
        return Err(NavigationError::ScreenNotInFlow {
            screen: format!("#{}", current.index()),
        });
    };

    if let (Some(membership), Some(item)) = (&current_screen.collection_loop, item_id) {
        if let Some(result) = end_of_loop(graph, current, membership, snapshot, item)? {
            return Ok(result);
        }
    }

    let following = graph.screen_ids().skip(current.index() + 1);
    let Some((next, next_item)) = scan(graph, current, item_id, snapshot, following) else {
        warn!(screen = %current_screen.screen_route, "no available next screen");
        return Err(NavigationError::NoAvailableNextScreen {
            screen: current_screen.screen_route.clone(),
        });
    };
    let next_screen = graph.screen(next);

    if next_screen.is_knockout {
        debug!(from = %current_screen.screen_route, to = %next_screen.screen_route, "knockout");
        return Ok(NavigationResult::screen(next, next_item));
    }

    let same_sub_subcategory =
        current_screen.sub_subcategory_route == next_screen.sub_subcategory_route;
    if options.navigate_to_data_view_at_end_of_sub_subcategory && !same_sub_subcategory {
        return review_mode_exit(graph, current, snapshot, item_id);
    }

    if current_screen.subcategory_route == next_screen.subcategory_route {
        debug!(
            from = %current_screen.screen_route,
            to = %next_screen.screen_route,
            "same subcategory"
        );
        return Ok(NavigationResult::screen(next, next_item));
    }

    Ok(subcategory_exit(graph, current_screen, item_id))
}

/// Handles the last available screen of a loop iteration: advance to the
/// next item of an auto-iterating loop, or return to a non-auto loop's hub.
fn end_of_loop(
    graph: &FlowGraph,
    current: ScreenId,
    membership: &LoopMembership,
    snapshot: &Snapshot<'_>,
    item_id: &str,
) -> Result<Option<NavigationResult>, NavigationError> {
    let collection_loop = graph
        .collection_loop_by_name(&membership.loop_name)
        .ok_or_else(|| NavigationError::UnknownLoop {
            loop_name: membership.loop_name.clone(),
        })?;
    if collection_loop.end_screen(graph, snapshot, Some(item_id)) != Some(current) {
        return Ok(None);
    }

    if !membership.auto_iterate {
        debug!(
            loop_name = %membership.loop_name,
            item_id,
            "loop iteration finished, returning to hub"
        );
        return Ok(Some(NavigationResult {
            destination: Destination::LoopDataView {
                loop_name: membership.loop_name.clone(),
            },
            item_id: Some(item_id.to_string()),
        }));
    }

    let Some(next_item) = collection_loop.next_item(snapshot, item_id) else {
        return Ok(None);
    };
    let first = collection_loop
        .first_available_screen(graph, snapshot, Some(&next_item))
        .ok_or_else(|| NavigationError::LoopWithoutAvailableScreen {
            loop_name: membership.loop_name.clone(),
            item_id: next_item.clone(),
        })?;
    debug!(loop_name = %membership.loop_name, item_id = %next_item, "advancing to next loop item");
    Ok(Some(NavigationResult::screen(first, Some(next_item))))
}

/// Walks `candidates` in order and returns the first automatically routed,
/// available screen with the repetition context it must be shown under.
///
/// Crossing into a different loop clears the context before the candidate's
/// availability is checked; entering an auto-iterating loop binds its first
/// item. Skipped candidates still advance this state.
fn scan(
    graph: &FlowGraph,
    current: ScreenId,
    item_id: Option<&str>,
    snapshot: &Snapshot<'_>,
    candidates: impl IntoIterator<Item = ScreenId>,
) -> Option<(ScreenId, Option<String>)> {
    let mut previous_loop = graph.screen(current).loop_name();
    let mut previous_item = item_id.map(str::to_string);

    for id in candidates {
        let screen = graph.screen(id);
        let loop_changed = previous_loop != screen.loop_name();
        let mut candidate_item = if loop_changed {
            None
        } else {
            previous_item.clone()
        };

        if screen.is_auto_iterating() && (previous_item.is_none() || loop_changed) {
            candidate_item = screen
                .collection_context
                .as_deref()
                .and_then(|collection| snapshot.collection_items(collection).into_iter().next());
        }

        previous_loop = screen.loop_name();
        previous_item = candidate_item.clone();

        if screen.route_automatically && screen.is_available(snapshot, candidate_item.as_deref()) {
            return Some((id, candidate_item));
        }
    }
    None
}

/// Review mode left the current sub-subcategory: stay inside a split
/// sub-subcategory when possible, otherwise return to its data view.
fn review_mode_exit(
    graph: &FlowGraph,
    current: ScreenId,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> Result<NavigationResult, NavigationError> {
    let current_screen = graph.screen(current);
    if current_screen.act_as_data_view {
        return Ok(NavigationResult::checklist(item_id));
    }

    let sub_subcategory = current_screen
        .sub_subcategory_route
        .as_deref()
        .and_then(|route| graph.sub_subcategory_by_route(route))
        .ok_or_else(|| NavigationError::MissingSubSubcategory {
            screen: current_screen.screen_route.clone(),
        })?;
    let remaining = sub_subcategory
        .screens
        .iter()
        .copied()
        .skip_while(|id| *id != current)
        .skip(1);

    if let Some((next, next_item)) = scan(graph, current, item_id, snapshot, remaining) {
        debug!(to = %graph.screen(next).screen_route, "continuing split sub-subcategory");
        return Ok(NavigationResult::screen(next, next_item));
    }

    debug!(from = %current_screen.screen_route, "review finished, returning to data view");
    Ok(data_view(graph, current_screen, item_id, true))
}

/// Leaving the subcategory returns to the checklist when the subcategory
/// has no separate summary to show; otherwise to its data view.
fn subcategory_exit(
    graph: &FlowGraph,
    current_screen: &Screen,
    item_id: Option<&str>,
) -> NavigationResult {
    let go_to_checklist = match graph.subcategory_by_route(&current_screen.subcategory_route) {
        Some(subcategory) => {
            let has_screen_acting_as_data_view = subcategory
                .screens
                .iter()
                .any(|id| graph.screen(*id).act_as_data_view);
            let has_collection_hub =
                subcategory.collection_name.is_some() && !subcategory.loops.is_empty();
            has_screen_acting_as_data_view || !subcategory.has_data_view || has_collection_hub
        }
        None => true,
    };

    debug!(from = %current_screen.screen_route, go_to_checklist, "leaving subcategory");
    if go_to_checklist {
        NavigationResult::checklist(item_id)
    } else {
        data_view(graph, current_screen, item_id, false)
    }
}

fn data_view(
    graph: &FlowGraph,
    current_screen: &Screen,
    item_id: Option<&str>,
    review_mode: bool,
) -> NavigationResult {
    if let (Some(membership), Some(item)) = (&current_screen.collection_loop, item_id) {
        if !membership.auto_iterate {
            return NavigationResult {
                destination: Destination::LoopDataView {
                    loop_name: membership.loop_name.clone(),
                },
                item_id: Some(item.to_string()),
            };
        }
    }

    let section = if review_mode {
        current_screen
            .sub_subcategory_route
            .as_deref()
            .and_then(|route| graph.sub_subcategory_by_route(route))
            .map(|sub_subcategory| sub_subcategory.route_suffix.clone())
    } else {
        None
    };
    NavigationResult {
        destination: Destination::DataView {
            subcategory_route: current_screen.subcategory_route.clone(),
            section,
        },
        item_id: item_id.map(str::to_string),
    }
}
