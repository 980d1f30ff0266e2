//! Aggregation of tax return and rejection (MeF) alerts for checklist rows.

use crate::flow::condition::conditions_pass;
use crate::flow::content::{AlertKind, ContentNode};
use crate::flow::facts::Snapshot;
use crate::flow::graph::{FlowGraph, LoopId, ScreenId};
use crate::flow::screen::{RouteOptions, Screen};
use serde::{Deserialize, Serialize};

/// Rejection codes returned for a submitted return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub rejection_codes: Vec<RejectionCode>,
}

impl SubmissionStatus {
    pub fn has_rejections(&self) -> bool {
        !self.rejection_codes.is_empty()
    }

    fn is_rejected_with(&self, code: &str) -> bool {
        self.rejection_codes
            .iter()
            .any(|rejection| rejection.mef_error_code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCode {
    #[serde(alias = "MeFErrorCode")]
    pub mef_error_code: String,
    #[serde(default)]
    pub translation_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertConfig {
    pub alert_type: AlertKind,
    pub i18n_key: String,
    pub route: String,
    pub subcategory_route: String,
    pub sub_subcategory_route: Option<String>,
    pub loop_name: Option<String>,
    pub item_id: Option<String>,
    pub fact_paths: Vec<String>,
    /// Set for alerts raised by a submission rejection.
    pub mef_error_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertConfigs {
    pub warnings: Vec<AlertConfig>,
    pub errors: Vec<AlertConfig>,
}

impl AlertConfigs {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    /// Adds `alert` unless the same message is already present for the same item.
    pub fn push(&mut self, alert: AlertConfig) {
        let bucket = match alert.alert_type {
            AlertKind::Warning => &mut self.warnings,
            AlertKind::Error => &mut self.errors,
        };
        let duplicate = bucket
            .iter()
            .any(|existing| {
                existing.i18n_key == alert.i18n_key && existing.item_id == alert.item_id
            });
        if !duplicate {
            bucket.push(alert);
        }
    }

    pub fn merge(&mut self, other: AlertConfigs) {
        for alert in other.warnings.into_iter().chain(other.errors) {
            self.push(alert);
        }
    }
}

/// Tax return alerts active on `screens` at `item_id`.
///
/// Without a repetition context an alert on a loop screen is also active when
/// it holds for any member of the loop's collection, and is then reported
/// against the first such member.
pub fn screen_alerts(
    graph: &FlowGraph,
    screens: &[ScreenId],
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
    alerts: &mut AlertConfigs,
) {
    for id in screens {
        let screen = graph.screen(*id);
        let loop_items = match (&screen.collection_loop, &screen.collection_context) {
            (Some(_), Some(collection)) => snapshot.collection_items(collection),
            _ => Vec::new(),
        };

        for (item, alert_type, i18n_key) in screen.alert_items() {
            let declared_passes = conditions_pass(&item.conditions, snapshot, item_id);
            // Without a context, report against the first member the alert holds for.
            let alert_item = match item_id {
                Some(id) => declared_passes.then(|| id.to_string()),
                None => loop_items
                    .iter()
                    .find(|candidate| {
                        conditions_pass(&item.conditions, snapshot, Some(candidate.as_str()))
                    })
                    .cloned(),
            };
            let active = match item_id {
                Some(_) => declared_passes,
                None => declared_passes || alert_item.is_some(),
            };
            if !active {
                continue;
            }

            alerts.push(alert_config(
                screen,
                alert_type,
                i18n_key,
                item_id,
                alert_item,
                fact_paths(&item.node),
                None,
            ));
        }
    }
}

/// Per-item alerts of every loop in `loops`.
pub fn loop_alerts(graph: &FlowGraph, loops: &[LoopId], snapshot: &Snapshot<'_>) -> AlertConfigs {
    let mut alerts = AlertConfigs::default();
    for id in loops {
        let collection_loop = graph.collection_loop(*id);
        for item in collection_loop.items(snapshot) {
            screen_alerts(graph, &collection_loop.screens, snapshot, Some(&item), &mut alerts);
        }
    }
    alerts
}

/// Rejection alerts whose MeF code appears in `status` and whose conditions hold.
pub fn mef_alerts(
    graph: &FlowGraph,
    screens: &[ScreenId],
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
    status: &SubmissionStatus,
) -> AlertConfigs {
    let mut alerts = AlertConfigs::default();
    for id in screens {
        let screen = graph.screen(*id);
        for item in &screen.content {
            let ContentNode::MefAlert {
                alert_type,
                i18n_key,
                mef_error_code,
                fact_paths,
            } = &item.node
            else {
                continue;
            };
            if !status.is_rejected_with(mef_error_code)
                || !conditions_pass(&item.conditions, snapshot, item_id)
            {
                continue;
            }
            alerts.push(alert_config(
                screen,
                *alert_type,
                i18n_key,
                item_id,
                item_id.map(str::to_string),
                fact_paths.clone(),
                Some(mef_error_code.clone()),
            ));
        }
    }
    alerts
}

fn fact_paths(node: &ContentNode) -> Vec<String> {
    match node {
        ContentNode::TaxReturnAlert { fact_paths, .. }
        | ContentNode::MefAlert { fact_paths, .. } => {
            fact_paths.clone()
        }
        _ => Vec::new(),
    }
}

fn alert_config(
    screen: &Screen,
    alert_type: AlertKind,
    i18n_key: &str,
    route_item: Option<&str>,
    item_id: Option<String>,
    fact_paths: Vec<String>,
    mef_error_code: Option<String>,
) -> AlertConfig {
    AlertConfig {
        alert_type,
        i18n_key: i18n_key.to_string(),
        route: screen.full_route(route_item, RouteOptions::default()),
        subcategory_route: screen.subcategory_route.clone(),
        sub_subcategory_route: screen.sub_subcategory_route.clone(),
        loop_name: screen.loop_name().map(str::to_string),
        item_id,
        fact_paths,
        mef_error_code,
    }
}
