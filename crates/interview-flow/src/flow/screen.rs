use crate::flow::condition::{conditions_pass, Condition};
use crate::flow::content::{AlertKind, ContentItem, ContentNode};
use crate::flow::facts::Snapshot;
use crate::flow::graph::FlowDefinitionError;
use crate::flow::path;
use serde::Serialize;

/// Membership of a screen in a repeated sub-flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopMembership {
    pub loop_name: String,
    pub auto_iterate: bool,
    pub is_inner: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    pub review_mode: bool,
}

impl RouteOptions {
    pub const REVIEW: Self = Self { review_mode: true };
}

/// One step of the interview. Built and validated once by the graph builder.
#[derive(Debug, Clone)]
pub struct Screen {
    pub route: String,
    /// `subcategory_route/route`; unique across the graph.
    pub screen_route: String,
    pub category_route: String,
    pub subcategory_route: String,
    pub sub_subcategory_route: Option<String>,
    pub conditions: Vec<Condition>,
    /// Collection whose item id parameterizes this screen.
    pub collection_context: Option<String>,
    pub collection_loop: Option<LoopMembership>,
    pub route_automatically: bool,
    pub is_knockout: bool,
    pub act_as_data_view: bool,
    pub has_screen_route_override: bool,
    pub content: Vec<ContentItem>,
    /// Unique content batch names in declaration order.
    pub batches: Vec<String>,
}

impl Screen {
    pub fn full_route(&self, item_id: Option<&str>, options: RouteOptions) -> String {
        if self.has_screen_route_override {
            if let Some(sub_subcategory) = &self.sub_subcategory_route {
                return format!("/data-view{sub_subcategory}");
            }
        }
        let params = path::route_params(
            self.collection_context.as_deref(),
            item_id,
            options.review_mode,
        );
        path::with_query(&self.screen_route, &params)
    }

    /// Screens of an auto-iterating loop are unavailable while the loop's
    /// collection is empty; otherwise every condition must pass.
    pub fn is_available(&self, snapshot: &Snapshot<'_>, item_id: Option<&str>) -> bool {
        if let (Some(membership), Some(collection)) =
            (&self.collection_loop, &self.collection_context)
        {
            if membership.auto_iterate && snapshot.collection_items(collection).is_empty() {
                return false;
            }
        }
        conditions_pass(&self.conditions, snapshot, item_id)
    }

    pub fn loop_name(&self) -> Option<&str> {
        self.collection_loop
            .as_ref()
            .map(|membership| membership.loop_name.as_str())
    }

    pub fn is_auto_iterating(&self) -> bool {
        self.collection_loop
            .as_ref()
            .is_some_and(|membership| membership.auto_iterate)
    }

    pub fn fact_paths(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|item| item.node.fact_path())
    }

    /// Paths of facts the filer must answer on this screen at `item_id`.
    pub(crate) fn required_fact_paths(
        &self,
        snapshot: &Snapshot<'_>,
        item_id: Option<&str>,
    ) -> Vec<&str> {
        self.content
            .iter()
            .filter(|item| conditions_pass(&item.conditions, snapshot, item_id))
            .filter_map(|item| item.node.required_fact_path())
            .filter(|path| !snapshot.settings().is_optional_fact(path))
            .collect()
    }

    /// Tax return alerts declared on this screen.
    pub(crate) fn alert_items(&self) -> impl Iterator<Item = (&ContentItem, AlertKind, &str)> {
        self.content.iter().filter_map(|item| match &item.node {
            ContentNode::TaxReturnAlert {
                alert_type,
                i18n_key,
                ..
            } => Some((item, *alert_type, i18n_key.as_str())),
            _ => None,
        })
    }

    /// Structural checks applied while the graph is built.
    pub(crate) fn validate(&self) -> Result<(), FlowDefinitionError> {
        let headings: Vec<&ContentItem> = self
            .content
            .iter()
            .filter(|item| item.node.is_heading())
            .collect();

        match headings.as_slice() {
            [] => {
                return Err(FlowDefinitionError::MissingHeading {
                    screen: self.screen_route.clone(),
                })
            }
            [only] if !only.conditions.is_empty() => {
                return Err(FlowDefinitionError::SingleConditionalHeading {
                    screen: self.screen_route.clone(),
                })
            }
            [_] => {}
            many if many.iter().any(|heading| heading.conditions.is_empty()) => {
                return Err(FlowDefinitionError::AmbiguousHeadings {
                    screen: self.screen_route.clone(),
                })
            }
            _ => {}
        }

        if !self
            .content
            .iter()
            .any(|item| item.node.is_navigation_control())
        {
            return Err(FlowDefinitionError::MissingNavigationControl {
                screen: self.screen_route.clone(),
            });
        }

        if self.sub_subcategory_route.is_none() && self.fact_paths().next().is_some() {
            return Err(FlowDefinitionError::FactsOutsideSubSubcategory {
                screen: self.screen_route.clone(),
            });
        }

        Ok(())
    }
}
