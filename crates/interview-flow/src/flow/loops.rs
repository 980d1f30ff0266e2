//! Collection loop resolution: item order, per-item completion, and entry and
//! exit screens of repeated sub-flows.

use crate::flow::facts::Snapshot;
use crate::flow::graph::{CollectionLoop, FlowGraph, ScreenId};
use serde::Serialize;

/// Completion counts across the items of one loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopProgress {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
}

impl CollectionLoop {
    /// Item ids in collection order.
    pub fn items(&self, snapshot: &Snapshot<'_>) -> Vec<String> {
        snapshot.collection_items(&self.collection_name)
    }

    /// Items following `item_id` in collection order.
    pub fn next_item(&self, snapshot: &Snapshot<'_>, item_id: &str) -> Option<String> {
        let items = self.items(snapshot);
        let position = items.iter().position(|candidate| candidate == item_id)?;
        items.into_iter().nth(position + 1)
    }

    /// Whether `item_id` satisfies the loop's item-completion condition. Loops
    /// without one never report completed items.
    pub fn is_item_complete(&self, snapshot: &Snapshot<'_>, item_id: &str) -> bool {
        self.item_completed_condition
            .as_ref()
            .is_some_and(|condition| condition.evaluate(snapshot, Some(item_id)))
    }

    pub fn progress(&self, snapshot: &Snapshot<'_>) -> LoopProgress {
        let items = self.items(snapshot);
        let complete = items
            .iter()
            .filter(|item| self.is_item_complete(snapshot, item))
            .count();
        LoopProgress {
            total: items.len(),
            complete,
            incomplete: items.len() - complete,
        }
    }

    /// True when the loop tracks item completion and at least one member of
    /// its (complete) collection has not reached it.
    pub fn has_incomplete_item(&self, snapshot: &Snapshot<'_>) -> bool {
        if self.item_completed_condition.is_none() {
            return false;
        }
        self.items(snapshot)
            .iter()
            .any(|item| !self.is_item_complete(snapshot, item))
    }

    pub fn has_members(&self, snapshot: &Snapshot<'_>) -> bool {
        !self.items(snapshot).is_empty()
    }

    /// First screen of the loop available at `item_id`.
    pub fn first_available_screen(
        &self,
        graph: &FlowGraph,
        snapshot: &Snapshot<'_>,
        item_id: Option<&str>,
    ) -> Option<ScreenId> {
        self.screens
            .iter()
            .copied()
            .find(|id| graph.screen(*id).is_available(snapshot, item_id))
    }

    /// Last screen of the loop available at `item_id`: the point at which
    /// one iteration ends.
    pub fn end_screen(
        &self,
        graph: &FlowGraph,
        snapshot: &Snapshot<'_>,
        item_id: Option<&str>,
    ) -> Option<ScreenId> {
        self.screens
            .iter()
            .rev()
            .copied()
            .find(|id| graph.screen(*id).is_available(snapshot, item_id))
    }

    /// Where guided continuation should resume inside an auto-iterating
    /// loop: the first available screen of the first item that is not yet
    /// complete. Non-auto loops resume at their hub instead.
    pub fn resume_point(
        &self,
        graph: &FlowGraph,
        snapshot: &Snapshot<'_>,
    ) -> Option<(ScreenId, String)> {
        if !self.auto_iterate {
            return None;
        }
        self.items(snapshot)
            .into_iter()
            .filter(|item| !self.is_item_complete(snapshot, item))
            .find_map(|item| {
                self.first_available_screen(graph, snapshot, Some(&item))
                    .map(|screen| (screen, item))
            })
    }

    /// Whether any screen of the loop is available at `item_id`.
    pub fn is_available(
        &self,
        graph: &FlowGraph,
        snapshot: &Snapshot<'_>,
        item_id: Option<&str>,
    ) -> bool {
        self.first_available_screen(graph, snapshot, item_id).is_some()
    }
}
