//! Immutable flow graph built once from a [`FlowDeclaration`].
//!
//! Categories own subcategories, which own screens directly or through
//! sub-subcategories and collection loops. All nodes live in flat arenas
//! addressed by typed ids; `screens` is the flattened document order used by
//! the router.

use crate::flow::batches::ContentBatches;
use crate::flow::condition::{conditions_pass, Condition};
use crate::flow::content::AlertKind;
use crate::flow::declaration::{
    AssertionDecl, CollectionLoopDecl, FlowDeclaration, FlowNode, ScreenDecl, SubcategoryDecl,
};
use crate::flow::facts::Snapshot;
use crate::flow::screen::{LoopMembership, Screen};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

const CATEGORY_PREFIX: &str = "/flow";

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(usize);

        impl $name {
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(ScreenId);
arena_id!(SubcategoryId);
arena_id!(SubSubcategoryId);
arena_id!(LoopId);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowDefinitionError {
    #[error("screen {screen} has no heading")]
    MissingHeading { screen: String },
    #[error("screen {screen} declares several headings but not all of them are conditional")]
    AmbiguousHeadings { screen: String },
    #[error("screen {screen} declares a single heading that is conditional")]
    SingleConditionalHeading { screen: String },
    #[error("screen {screen} has no button or link to leave it")]
    MissingNavigationControl { screen: String },
    #[error("screen {screen} collects facts but is not inside a sub-subcategory")]
    FactsOutsideSubSubcategory { screen: String },
    #[error("duplicate screen route {route}")]
    DuplicateScreenRoute { route: String },
    #[error("duplicate subcategory route {route}")]
    DuplicateSubcategoryRoute { route: String },
    #[error("duplicate collection loop {loop_name}")]
    DuplicateLoop { loop_name: String },
    #[error("collection loop {loop_name} has no screens")]
    EmptyLoop { loop_name: String },
    #[error("collection loop {loop_name} has no collection and none is in scope")]
    LoopWithoutCollection { loop_name: String },
    #[error("collection loop {loop_name} is nested inside loop {parent}")]
    NestedLoop { loop_name: String, parent: String },
    #[error("inner collection loop {loop_name} must sit inside a sub-subcategory")]
    InnerLoopOutsideSubSubcategory { loop_name: String },
    #[error("{kind} `{name}` must be declared inside a {parent}")]
    MisplacedNode {
        kind: &'static str,
        name: String,
        parent: &'static str,
    },
    #[error("screen {screen} references unknown content batch {batch}")]
    UnknownBatch { screen: String, batch: String },
    #[error("flow declares no screens")]
    EmptyFlow,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub route: String,
    pub subcategories: Vec<SubcategoryId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subcategory {
    pub route: String,
    pub category_route: String,
    pub completion_conditions: Vec<Condition>,
    pub display_only_if: Vec<Condition>,
    /// Every screen of the subcategory, loop members included.
    pub screens: Vec<ScreenId>,
    pub sub_subcategories: Vec<SubSubcategoryId>,
    pub loops: Vec<LoopId>,
    /// Top-level sub-subcategories and loops in declaration order.
    pub sections: Vec<Section>,
    /// Collection (or item reference) that parameterizes the subcategory.
    pub collection_name: Option<String>,
    pub has_data_view: bool,
    pub is_sign_and_submit: bool,
    pub lock_future_sections_if_collection_items_incomplete: bool,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Section {
    SubSubcategory(SubSubcategoryId),
    CollectionLoop(LoopId),
}

#[derive(Debug, Clone, Serialize)]
pub struct SubSubcategory {
    /// The declared route segment; used as the data-view anchor.
    pub route_suffix: String,
    pub full_route: String,
    pub subcategory_route: String,
    pub screens: Vec<ScreenId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionLoop {
    pub loop_name: String,
    pub auto_iterate: bool,
    pub is_inner: bool,
    /// Route of the hub the loop returns to: the sub-subcategory for inner
    /// loops, the subcategory otherwise.
    pub full_route: String,
    pub subcategory_route: String,
    pub collection_name: String,
    pub item_completed_condition: Option<Condition>,
    pub done_path: Option<String>,
    pub knockout_route: Option<String>,
    pub screens: Vec<ScreenId>,
    pub sub_subcategories: Vec<SubSubcategoryId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assertion {
    pub assertion_type: AlertKind,
    pub i18n_key: String,
    pub conditions: Vec<Condition>,
    pub edit_route: Option<String>,
    pub sub_subcategory_route: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlowGraph {
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    sub_subcategories: Vec<SubSubcategory>,
    loops: Vec<CollectionLoop>,
    screens: Vec<Screen>,
    batches: ContentBatches,
    screens_by_route: HashMap<String, ScreenId>,
    subcategories_by_route: HashMap<String, SubcategoryId>,
    sub_subcategories_by_route: HashMap<String, SubSubcategoryId>,
    loops_by_name: HashMap<String, LoopId>,
}

impl FlowGraph {
    pub fn build(declaration: &FlowDeclaration) -> Result<Self, FlowDefinitionError> {
        let mut builder = GraphBuilder::new(declaration.batches.clone());
        let root = Scope::default();
        for node in &declaration.categories {
            builder.visit(node, &root)?;
        }
        let graph = builder.finish()?;

        info!(
            categories = graph.categories.len(),
            subcategories = graph.subcategories.len(),
            screens = graph.screens.len(),
            loops = graph.loops.len(),
            "flow graph built"
        );
        Ok(graph)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Screens in flattened document order.
    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn screen(&self, id: ScreenId) -> &Screen {
        &self.screens[id.0]
    }

    pub fn screen_ids(&self) -> impl Iterator<Item = ScreenId> {
        (0..self.screens.len()).map(ScreenId)
    }

    /// Looks a screen up by `subcategory_route/route`.
    pub fn screen_by_route(&self, route: &str) -> Option<ScreenId> {
        self.screens_by_route.get(route).copied()
    }

    pub fn subcategory(&self, id: SubcategoryId) -> &Subcategory {
        &self.subcategories[id.0]
    }

    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    pub fn subcategory_by_route(&self, route: &str) -> Option<&Subcategory> {
        self.subcategories_by_route
            .get(route)
            .map(|id| &self.subcategories[id.0])
    }

    pub fn sub_subcategory(&self, id: SubSubcategoryId) -> &SubSubcategory {
        &self.sub_subcategories[id.0]
    }

    pub fn sub_subcategory_by_route(&self, route: &str) -> Option<&SubSubcategory> {
        self.sub_subcategories_by_route
            .get(route)
            .map(|id| &self.sub_subcategories[id.0])
    }

    pub fn collection_loop(&self, id: LoopId) -> &CollectionLoop {
        &self.loops[id.0]
    }

    pub fn collection_loops(&self) -> &[CollectionLoop] {
        &self.loops
    }

    pub fn collection_loop_by_name(&self, loop_name: &str) -> Option<&CollectionLoop> {
        self.loops_by_name
            .get(loop_name)
            .map(|id| &self.loops[id.0])
    }

    pub fn content_batches(&self) -> &ContentBatches {
        &self.batches
    }
}

impl Subcategory {
    /// Item the subcategory is shown for: the member referenced by its
    /// collection context fact, when that fact is a complete item reference.
    pub fn context_item(&self, snapshot: &Snapshot<'_>) -> Option<String> {
        self.collection_name
            .as_deref()
            .and_then(|collection| snapshot.referenced_item(collection))
    }

    /// Assertions whose conditions hold at `item_id`.
    pub fn active_assertions<'s>(
        &'s self,
        snapshot: &Snapshot<'_>,
        item_id: Option<&str>,
    ) -> Vec<&'s Assertion> {
        self.assertions
            .iter()
            .filter(|assertion| conditions_pass(&assertion.conditions, snapshot, item_id))
            .collect()
    }
}

/// Placement inherited from enclosing nodes while walking the declaration.
#[derive(Debug, Clone, Default)]
struct Scope {
    category: Option<usize>,
    subcategory: Option<SubcategoryId>,
    sub_subcategory: Option<SubSubcategoryId>,
    collection_loop: Option<LoopId>,
    collection_context: Option<String>,
    conditions: Vec<Condition>,
}

struct GraphBuilder {
    graph: FlowGraph,
}

impl GraphBuilder {
    fn new(batches: ContentBatches) -> Self {
        Self {
            graph: FlowGraph {
                categories: Vec::new(),
                subcategories: Vec::new(),
                sub_subcategories: Vec::new(),
                loops: Vec::new(),
                screens: Vec::new(),
                batches,
                screens_by_route: HashMap::new(),
                subcategories_by_route: HashMap::new(),
                sub_subcategories_by_route: HashMap::new(),
                loops_by_name: HashMap::new(),
            },
        }
    }

    fn finish(self) -> Result<FlowGraph, FlowDefinitionError> {
        if self.graph.screens.is_empty() {
            return Err(FlowDefinitionError::EmptyFlow);
        }
        Ok(self.graph)
    }

    fn visit(&mut self, node: &FlowNode, scope: &Scope) -> Result<(), FlowDefinitionError> {
        match node {
            FlowNode::Category(decl) => {
                if scope.category.is_some() {
                    return Err(misplaced("category", &decl.route, "flow root"));
                }
                let index = self.graph.categories.len();
                self.graph.categories.push(Category {
                    route: format!("{CATEGORY_PREFIX}/{}", decl.route),
                    subcategories: Vec::new(),
                });
                let inner = Scope {
                    category: Some(index),
                    ..scope.clone()
                };
                self.visit_all(&decl.children, &inner)
            }
            FlowNode::Subcategory(decl) => self.visit_subcategory(decl, scope),
            FlowNode::SubSubcategory(decl) => {
                let subcategory = scope
                    .subcategory
                    .ok_or_else(|| misplaced("sub-subcategory", &decl.route, "subcategory"))?;
                let subcategory_route = &self.graph.subcategory(subcategory).route;
                let full_route = format!("{subcategory_route}/{}", decl.route);
                let id = match self.graph.sub_subcategories_by_route.get(&full_route) {
                    Some(existing) => *existing,
                    None => self.add_sub_subcategory(subcategory, &decl.route, full_route, scope),
                };
                let inner = Scope {
                    sub_subcategory: Some(id),
                    ..scope.clone()
                };
                self.visit_all(&decl.children, &inner)
            }
            FlowNode::CollectionLoop(decl) => self.visit_loop(decl, scope),
            FlowNode::Gate(decl) => {
                let mut inner = scope.clone();
                inner.conditions.push(decl.condition.clone());
                self.visit_all(&decl.children, &inner)
            }
            FlowNode::Screen(decl) => self.add_screen(decl, scope),
            FlowNode::Assertion(decl) => self.add_assertion(decl, scope),
        }
    }

    fn visit_all(&mut self, nodes: &[FlowNode], scope: &Scope) -> Result<(), FlowDefinitionError> {
        nodes.iter().try_for_each(|node| self.visit(node, scope))
    }

    fn visit_subcategory(
        &mut self,
        decl: &SubcategoryDecl,
        scope: &Scope,
    ) -> Result<(), FlowDefinitionError> {
        let category_index = match (scope.category, scope.subcategory) {
            (Some(index), None) => index,
            _ => return Err(misplaced("subcategory", &decl.route, "category")),
        };
        let category_route = self.graph.categories[category_index].route.clone();
        let route = format!("{category_route}/{}", decl.route);
        if self.graph.subcategories_by_route.contains_key(&route) {
            return Err(FlowDefinitionError::DuplicateSubcategoryRoute { route });
        }

        let id = SubcategoryId(self.graph.subcategories.len());
        self.graph.subcategories.push(Subcategory {
            route: route.clone(),
            category_route,
            completion_conditions: decl.complete_if.clone(),
            display_only_if: decl.display_only_if.clone(),
            screens: Vec::new(),
            sub_subcategories: Vec::new(),
            loops: Vec::new(),
            sections: Vec::new(),
            collection_name: decl.collection_context.clone(),
            has_data_view: !decl.skip_data_view,
            is_sign_and_submit: decl.is_sign_and_submit,
            lock_future_sections_if_collection_items_incomplete: decl
                .lock_future_sections_if_collection_items_incomplete,
            assertions: Vec::new(),
        });
        self.graph.subcategories_by_route.insert(route, id);
        self.graph.categories[category_index].subcategories.push(id);

        let inner = Scope {
            subcategory: Some(id),
            collection_context: decl
                .collection_context
                .clone()
                .or_else(|| scope.collection_context.clone()),
            ..scope.clone()
        };
        self.visit_all(&decl.children, &inner)
    }

    fn add_sub_subcategory(
        &mut self,
        subcategory: SubcategoryId,
        route_suffix: &str,
        full_route: String,
        scope: &Scope,
    ) -> SubSubcategoryId {
        let id = SubSubcategoryId(self.graph.sub_subcategories.len());
        self.graph.sub_subcategories.push(SubSubcategory {
            route_suffix: route_suffix.to_string(),
            full_route: full_route.clone(),
            subcategory_route: self.graph.subcategory(subcategory).route.clone(),
            screens: Vec::new(),
        });
        self.graph.sub_subcategories_by_route.insert(full_route, id);
        self.graph.subcategories[subcategory.0].sub_subcategories.push(id);
        match scope.collection_loop {
            Some(loop_id) => self.graph.loops[loop_id.0].sub_subcategories.push(id),
            None => self.graph.subcategories[subcategory.0]
                .sections
                .push(Section::SubSubcategory(id)),
        }
        id
    }

    fn visit_loop(
        &mut self,
        decl: &CollectionLoopDecl,
        scope: &Scope,
    ) -> Result<(), FlowDefinitionError> {
        let subcategory = scope
            .subcategory
            .ok_or_else(|| misplaced("collection loop", &decl.loop_name, "subcategory"))?;
        if let Some(parent) = scope.collection_loop {
            return Err(FlowDefinitionError::NestedLoop {
                loop_name: decl.loop_name.clone(),
                parent: self.graph.loops[parent.0].loop_name.clone(),
            });
        }
        if self.graph.loops_by_name.contains_key(&decl.loop_name) {
            return Err(FlowDefinitionError::DuplicateLoop {
                loop_name: decl.loop_name.clone(),
            });
        }
        let collection_name = decl
            .collection
            .clone()
            .or_else(|| scope.collection_context.clone())
            .ok_or_else(|| FlowDefinitionError::LoopWithoutCollection {
                loop_name: decl.loop_name.clone(),
            })?;

        let subcategory_route = self.graph.subcategory(subcategory).route.clone();
        let full_route = if decl.is_inner {
            let sub_subcategory = scope.sub_subcategory.ok_or_else(|| {
                FlowDefinitionError::InnerLoopOutsideSubSubcategory {
                    loop_name: decl.loop_name.clone(),
                }
            })?;
            self.graph.sub_subcategory(sub_subcategory).full_route.clone()
        } else {
            subcategory_route.clone()
        };

        let id = LoopId(self.graph.loops.len());
        self.graph.loops.push(CollectionLoop {
            loop_name: decl.loop_name.clone(),
            auto_iterate: decl.auto_iterate,
            is_inner: decl.is_inner,
            full_route,
            subcategory_route,
            collection_name: collection_name.clone(),
            item_completed_condition: decl.collection_item_completed_condition.clone(),
            done_path: decl.done_path.clone(),
            knockout_route: decl.knockout_route.clone(),
            screens: Vec::new(),
            sub_subcategories: Vec::new(),
        });
        self.graph.loops_by_name.insert(decl.loop_name.clone(), id);
        self.graph.subcategories[subcategory.0].loops.push(id);
        self.graph.subcategories[subcategory.0]
            .sections
            .push(Section::CollectionLoop(id));

        let inner = Scope {
            collection_loop: Some(id),
            collection_context: Some(collection_name),
            ..scope.clone()
        };
        self.visit_all(&decl.children, &inner)?;

        if self.graph.loops[id.0].screens.is_empty() {
            return Err(FlowDefinitionError::EmptyLoop {
                loop_name: decl.loop_name.clone(),
            });
        }
        Ok(())
    }

    fn add_screen(&mut self, decl: &ScreenDecl, scope: &Scope) -> Result<(), FlowDefinitionError> {
        let (Some(category_index), Some(subcategory)) = (scope.category, scope.subcategory) else {
            return Err(misplaced("screen", &decl.route, "subcategory"));
        };
        let subcategory_route = self.graph.subcategory(subcategory).route.clone();
        let screen_route = format!("{subcategory_route}/{}", decl.route);
        if self.graph.screens_by_route.contains_key(&screen_route) {
            return Err(FlowDefinitionError::DuplicateScreenRoute {
                route: screen_route,
            });
        }

        let mut conditions = scope.conditions.clone();
        conditions.extend(decl.condition.iter().cloned());

        let mut batches: Vec<String> = Vec::new();
        for name in decl.content.iter().flat_map(|item| &item.batches) {
            if !self.graph.batches.contains_key(name) {
                return Err(FlowDefinitionError::UnknownBatch {
                    screen: screen_route,
                    batch: name.clone(),
                });
            }
            if !batches.contains(name) {
                batches.push(name.clone());
            }
        }

        let collection_loop = scope.collection_loop.map(|id| {
            let definition = &self.graph.loops[id.0];
            LoopMembership {
                loop_name: definition.loop_name.clone(),
                auto_iterate: definition.auto_iterate,
                is_inner: definition.is_inner,
            }
        });

        let screen = Screen {
            route: decl.route.clone(),
            screen_route: screen_route.clone(),
            category_route: self.graph.categories[category_index].route.clone(),
            subcategory_route,
            sub_subcategory_route: scope
                .sub_subcategory
                .map(|id| self.graph.sub_subcategory(id).full_route.clone()),
            conditions,
            collection_context: scope.collection_context.clone(),
            collection_loop,
            route_automatically: decl.route_automatically.unwrap_or(true),
            is_knockout: decl.is_knockout,
            act_as_data_view: decl.act_as_data_view,
            has_screen_route_override: decl.has_screen_route_override,
            content: decl.content.clone(),
            batches,
        };
        screen.validate()?;

        let id = ScreenId(self.graph.screens.len());
        self.graph.screens.push(screen);
        self.graph.screens_by_route.insert(screen_route, id);
        self.graph.subcategories[subcategory.0].screens.push(id);
        if let Some(sub_subcategory) = scope.sub_subcategory {
            self.graph.sub_subcategories[sub_subcategory.0].screens.push(id);
        }
        if let Some(loop_id) = scope.collection_loop {
            self.graph.loops[loop_id.0].screens.push(id);
        }
        Ok(())
    }

    fn add_assertion(
        &mut self,
        decl: &AssertionDecl,
        scope: &Scope,
    ) -> Result<(), FlowDefinitionError> {
        let subcategory = scope
            .subcategory
            .ok_or_else(|| misplaced("assertion", &decl.i18n_key, "subcategory"))?;
        let sub_subcategory_route = scope
            .sub_subcategory
            .map(|id| self.graph.sub_subcategory(id).full_route.clone());
        let mut conditions = scope.conditions.clone();
        conditions.extend(decl.conditions.iter().cloned());

        self.graph.subcategories[subcategory.0].assertions.push(Assertion {
            assertion_type: decl.assertion_type,
            i18n_key: decl.i18n_key.clone(),
            conditions,
            edit_route: decl.edit_route.clone(),
            sub_subcategory_route,
        });
        Ok(())
    }
}

fn misplaced(kind: &'static str, name: &str, parent: &'static str) -> FlowDefinitionError {
    FlowDefinitionError::MisplacedNode {
        kind,
        name: name.to_string(),
        parent,
    }
}
