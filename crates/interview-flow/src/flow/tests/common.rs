//! Declaration builders and snapshot fixtures shared by the flow tests.

use crate::flow::condition::Condition;
use crate::flow::content::{ContentItem, ContentNode, FactKind};
use crate::flow::declaration::{
    CategoryDecl, CollectionLoopDecl, FlowDeclaration, FlowNode, GateDecl, ScreenDecl,
    SubSubcategoryDecl, SubcategoryDecl,
};
use crate::flow::facts::{InMemoryFactStore, Snapshot};
use crate::flow::graph::{FlowGraph, ScreenId};
use crate::flow::import::ImportProfileState;
use crate::flow::settings::EngineSettings;

pub(super) fn screen(route: &str) -> ScreenDecl {
    ScreenDecl {
        route: route.to_string(),
        condition: None,
        route_automatically: None,
        is_knockout: false,
        act_as_data_view: false,
        has_screen_route_override: false,
        content: vec![
            ContentItem::new(ContentNode::heading(format!("heading.{route}"))),
            ContentItem::new(ContentNode::SaveAndContinueButton),
        ],
    }
}

/// A screen asking one boolean fact.
pub(super) fn fact_screen(route: &str, path: &str) -> ScreenDecl {
    let mut decl = screen(route);
    decl.content
        .insert(1, ContentItem::new(ContentNode::fact(path, FactKind::Boolean)));
    decl
}

pub(super) fn gated(mut decl: ScreenDecl, condition: Condition) -> ScreenDecl {
    decl.condition = Some(condition);
    decl
}

pub(super) fn with_content(mut decl: ScreenDecl, item: ContentItem) -> ScreenDecl {
    decl.content.push(item);
    decl
}

pub(super) fn node(decl: ScreenDecl) -> FlowNode {
    FlowNode::Screen(decl)
}

pub(super) fn gate(condition: Condition, children: Vec<FlowNode>) -> FlowNode {
    FlowNode::Gate(GateDecl {
        condition,
        children,
    })
}

pub(super) fn section(route: &str, children: Vec<FlowNode>) -> FlowNode {
    FlowNode::SubSubcategory(SubSubcategoryDecl {
        route: route.to_string(),
        children,
    })
}

pub(super) fn subcategory(route: &str, children: Vec<FlowNode>) -> SubcategoryDecl {
    SubcategoryDecl {
        route: route.to_string(),
        children,
        ..SubcategoryDecl::default()
    }
}

pub(super) fn category(route: &str, subcategories: Vec<SubcategoryDecl>) -> FlowNode {
    FlowNode::Category(CategoryDecl {
        route: route.to_string(),
        children: subcategories.into_iter().map(FlowNode::Subcategory).collect(),
    })
}

pub(super) fn collection_loop(
    loop_name: &str,
    collection: &str,
    auto_iterate: bool,
    children: Vec<FlowNode>,
) -> CollectionLoopDecl {
    CollectionLoopDecl {
        loop_name: loop_name.to_string(),
        collection: Some(collection.to_string()),
        auto_iterate,
        children,
        ..CollectionLoopDecl::default()
    }
}

pub(super) fn build(categories: Vec<FlowNode>) -> FlowGraph {
    FlowGraph::build(&FlowDeclaration {
        batches: Default::default(),
        categories,
    })
    .expect("fixture flow is valid")
}

pub(super) fn screen_id(graph: &FlowGraph, route: &str) -> ScreenId {
    graph
        .screen_by_route(route)
        .unwrap_or_else(|| panic!("screen {route} exists"))
}

/// Owns everything a [`Snapshot`] borrows.
pub(super) struct Fixture {
    pub(super) store: InMemoryFactStore,
    pub(super) imports: ImportProfileState,
    pub(super) settings: EngineSettings,
}

impl Fixture {
    pub(super) fn new(store: InMemoryFactStore) -> Self {
        Self {
            store,
            imports: ImportProfileState::default(),
            settings: EngineSettings::default(),
        }
    }

    pub(super) fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(&self.store, &self.imports, &self.settings)
    }
}
