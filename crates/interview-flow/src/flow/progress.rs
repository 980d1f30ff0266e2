//! Progress helpers: whether a section has been started and where a filer
//! should resume inside it.

use crate::flow::condition::conditions_pass;
use crate::flow::content::ContentNode;
use crate::flow::facts::Snapshot;
use crate::flow::graph::{CollectionLoop, FlowGraph, ScreenId, Section, Subcategory};
use crate::flow::loops::LoopProgress;
use crate::flow::screen::Screen;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumePoint {
    pub screen: ScreenId,
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    pub loop_name: String,
    #[serde(flatten)]
    pub progress: LoopProgress,
    /// Guided continuation point; auto-iterating loops only.
    pub resume_at: Option<ResumePoint>,
}

/// Where a filer stands inside one subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryProgress {
    pub subcategory_route: String,
    pub item_id: Option<String>,
    pub started: bool,
    pub resume_at: Option<ResumePoint>,
    pub loops: Vec<LoopSummary>,
    /// i18n keys of the assertions that currently hold.
    pub active_assertions: Vec<String>,
}

pub fn subcategory_progress(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    snapshot: &Snapshot<'_>,
) -> SubcategoryProgress {
    let item_id = subcategory.context_item(snapshot);
    let item = item_id.as_deref();

    let loops = subcategory
        .loops
        .iter()
        .map(|id| {
            let collection_loop = graph.collection_loop(*id);
            LoopSummary {
                loop_name: collection_loop.loop_name.clone(),
                progress: collection_loop.progress(snapshot),
                resume_at: collection_loop
                    .resume_point(graph, snapshot)
                    .map(|(screen, item)| ResumePoint {
                        screen,
                        item_id: Some(item),
                    }),
            }
        })
        .collect();

    SubcategoryProgress {
        subcategory_route: subcategory.route.clone(),
        started: subcategory_has_some_completed_facts(graph, subcategory, snapshot, item),
        resume_at: first_incomplete_screen_of_subcategory(graph, subcategory, snapshot, item),
        loops,
        active_assertions: subcategory
            .active_assertions(snapshot, item)
            .into_iter()
            .map(|assertion| assertion.i18n_key.clone())
            .collect(),
        item_id,
    }
}

/// A subcategory is started once a required writable fact on one of its
/// available non-loop screens is complete, or once a non-auto loop has
/// members. Auto-iterating loops are ignored: their collections can be
/// populated before the filer ever enters the section.
pub fn subcategory_has_some_completed_facts(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> bool {
    let answered_screen = subcategory.screens.iter().any(|id| {
        let screen = graph.screen(*id);
        screen.collection_loop.is_none()
            && screen.is_available(snapshot, item_id)
            && screen
                .required_fact_paths(snapshot, item_id)
                .into_iter()
                .any(|path| snapshot.lookup(path, item_id).is_some_and(|fact| fact.complete))
    });

    answered_screen
        || subcategory.loops.iter().any(|id| {
            let collection_loop = graph.collection_loop(*id);
            !collection_loop.auto_iterate && collection_loop.has_members(snapshot)
        })
}

/// First available screen of the loop with an unanswered required fact, as
/// long as the item has not met the loop's completion condition.
pub fn first_incomplete_screen_of_loop(
    graph: &FlowGraph,
    collection_loop: &CollectionLoop,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> Option<ScreenId> {
    if let (Some(item), Some(_)) = (item_id, &collection_loop.item_completed_condition) {
        if collection_loop.is_item_complete(snapshot, item) {
            return None;
        }
    }
    first_incomplete_screen(graph, &collection_loop.screens, snapshot, item_id)
}

/// Walks the subcategory's sections in order and returns the first screen
/// still waiting for an answer. Loops with an unfinished item resume at that
/// item; loops whose done marker is unset fall back to their hub screen.
pub fn first_incomplete_screen_of_subcategory(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> Option<ResumePoint> {
    for section in &subcategory.sections {
        match *section {
            Section::SubSubcategory(id) => {
                // Members of a loop nested in the section resume through the loop.
                let screens: Vec<ScreenId> = graph
                    .sub_subcategory(id)
                    .screens
                    .iter()
                    .copied()
                    .filter(|screen| graph.screen(*screen).collection_loop.is_none())
                    .collect();
                if let Some(screen) = first_incomplete_screen(graph, &screens, snapshot, item_id) {
                    return Some(ResumePoint {
                        screen,
                        item_id: item_id.map(str::to_string),
                    });
                }
            }
            Section::CollectionLoop(id) => {
                let collection_loop = graph.collection_loop(id);
                if let Some(point) = loop_resume_point(graph, collection_loop, snapshot) {
                    return Some(point);
                }
                let hub = pending_hub(graph, subcategory, collection_loop, snapshot, item_id);
                if let Some(hub) = hub {
                    return Some(ResumePoint {
                        screen: hub,
                        item_id: item_id.map(str::to_string),
                    });
                }
            }
        }
    }
    None
}

fn loop_resume_point(
    graph: &FlowGraph,
    collection_loop: &CollectionLoop,
    snapshot: &Snapshot<'_>,
) -> Option<ResumePoint> {
    if !collection_loop.has_incomplete_item(snapshot) {
        return None;
    }
    collection_loop.items(snapshot).into_iter().find_map(|item| {
        first_incomplete_screen_of_loop(graph, collection_loop, snapshot, Some(&item))
            .map(|screen| ResumePoint {
                screen,
                item_id: Some(item),
            })
    })
}

/// Collection manager screen of a loop whose done marker is not yet true.
fn pending_hub(
    graph: &FlowGraph,
    subcategory: &Subcategory,
    collection_loop: &CollectionLoop,
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> Option<ScreenId> {
    let done_path = collection_loop.done_path.as_deref()?;
    let done = snapshot
        .lookup(done_path, None)
        .is_some_and(|fact| fact.complete && fact.is_truthy());
    if done {
        return None;
    }

    let hub_section = subcategory
        .sub_subcategories
        .iter()
        .map(|id| graph.sub_subcategory(*id))
        .find(|sub_subcategory| sub_subcategory.full_route == collection_loop.full_route)?;
    hub_section
        .screens
        .iter()
        .copied()
        .find(|id| is_collection_hub(graph.screen(*id)))
        .filter(|id| graph.screen(*id).is_available(snapshot, item_id))
}

fn is_collection_hub(screen: &Screen) -> bool {
    screen
        .content
        .iter()
        .any(|item| matches!(item.node, ContentNode::CollectionItemManager { .. }))
}

fn first_incomplete_screen(
    graph: &FlowGraph,
    screens: &[ScreenId],
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> Option<ScreenId> {
    screens.iter().copied().find(|id| {
        let screen = graph.screen(*id);
        screen.is_available(snapshot, item_id) && has_unanswered_fact(screen, snapshot, item_id)
    })
}

/// Required writable facts and conditional set-fact actions both count.
fn has_unanswered_fact(screen: &Screen, snapshot: &Snapshot<'_>, item_id: Option<&str>) -> bool {
    let incomplete = |path: &str| !snapshot.lookup(path, item_id).is_some_and(|fact| fact.complete);

    let unanswered_field = screen
        .required_fact_paths(snapshot, item_id)
        .into_iter()
        .any(incomplete);

    unanswered_field
        || screen.content.iter().any(|item| match &item.node {
            ContentNode::SetFactAction { path, .. } => {
                conditions_pass(&item.conditions, snapshot, item_id) && incomplete(path)
            }
            _ => false,
        })
}
