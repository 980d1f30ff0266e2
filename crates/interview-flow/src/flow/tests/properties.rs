use super::common::{
    build, category, collection_loop, fact_screen, gated, node, screen, section, subcategory,
    Fixture,
};
use crate::flow::checklist::compute_checklist;
use crate::flow::condition::Condition;
use crate::flow::declaration::{FlowNode, SubcategoryDecl};
use crate::flow::facts::InMemoryFactStore;
use crate::flow::graph::FlowGraph;
use crate::flow::router::{next_screen, NavigationError, NavigationOptions};
use proptest::prelude::*;
use std::collections::HashSet;

fn guarded(index: usize) -> SubcategoryDecl {
    let route = format!("s{index}");
    let mut decl = subcategory(
        &route,
        vec![section(
            "main",
            vec![node(fact_screen(&format!("{route}-intro"), &format!("/answer{index}")))],
        )],
    );
    decl.complete_if = vec![Condition::is_true(format!("/done{index}"))];
    decl
}

/// Spreads `count` subcategories over categories of at most three.
fn sequential_flow(count: usize) -> FlowGraph {
    let categories = (0..count)
        .collect::<Vec<_>>()
        .chunks(3)
        .enumerate()
        .map(|(index, chunk)| {
            category(
                &format!("c{index}"),
                chunk.iter().map(|position| guarded(*position)).collect(),
            )
        })
        .collect();
    build(categories)
}

/// One subcategory holding an auto-iterating loop, followed by another
/// subcategory; a walk from the first screen ends at the household data view.
fn looping_flow() -> FlowGraph {
    build(vec![
        category(
            "family",
            vec![subcategory(
                "household",
                vec![
                    node(screen("welcome")),
                    node(gated(screen("pets"), Condition::is_true("/hasPet"))),
                    node(screen("dependents-intro")),
                    FlowNode::CollectionLoop(collection_loop(
                        "dependents",
                        "/dependents",
                        true,
                        vec![
                            node(screen("dependent-name")),
                            node(gated(
                                screen("dependent-school"),
                                Condition::is_true("/dependents/*/isStudent"),
                            )),
                            node(screen("dependent-done")),
                        ],
                    )),
                    node(screen("dependents-summary")),
                ],
            )],
        ),
        category("income", vec![subcategory("jobs", vec![node(screen("jobs-intro"))])]),
    ])
}

proptest! {
    #[test]
    fn nothing_is_next_or_complete_after_an_unfinished_subcategory(
        done in proptest::collection::vec(any::<bool>(), 1..10),
    ) {
        let graph = sequential_flow(done.len());
        let mut store = InMemoryFactStore::new();
        for (index, value) in done.iter().enumerate() {
            store = store.with_bool(format!("/done{index}"), *value);
        }
        let fixture = Fixture::new(store);
        let rows: Vec<_> = compute_checklist(&graph, &fixture.snapshot(), None)
            .into_iter()
            .flat_map(|category| category.subcategories)
            .collect();
        prop_assert_eq!(rows.len(), done.len());

        let first_unfinished = done.iter().position(|value| !value);
        for (index, row) in rows.iter().enumerate() {
            match first_unfinished {
                Some(stop) if index < stop => {
                    prop_assert!(row.is_complete && !row.is_next);
                }
                Some(stop) if index == stop => {
                    prop_assert!(row.is_next && !row.is_complete);
                }
                Some(_) => {
                    prop_assert!(!row.is_next && !row.is_complete);
                    prop_assert!(row.navigation_url.is_none());
                }
                None => prop_assert!(row.is_complete && !row.is_next),
            }
        }
        prop_assert!(rows.iter().filter(|row| row.is_next).count() <= 1);
    }

    #[test]
    fn walking_the_flow_terminates_without_revisiting_items(
        items in 0usize..5,
        students in proptest::collection::vec(any::<bool>(), 5),
        has_pet in any::<bool>(),
    ) {
        let graph = looping_flow();
        let ids: Vec<String> = (0..items).map(|index| format!("d{index}")).collect();
        let mut store = InMemoryFactStore::new()
            .with_bool("/hasPet", has_pet)
            .with_collection("/dependents", ids.clone());
        for (id, student) in ids.iter().zip(&students) {
            store = store.with_bool(format!("/dependents/#{id}/isStudent"), *student);
        }
        let fixture = Fixture::new(store);
        let snapshot = fixture.snapshot();

        let mut current = graph.screen_ids().next().expect("flow has screens");
        let mut item: Option<String> = None;
        let mut visited = HashSet::new();
        let bound = graph.screens().len() * (items + 1);

        for _ in 0..=bound {
            let first_visit = visited.insert((current, item.clone()));
            prop_assert!(first_visit, "revisited {:?}", (current, &item));
            let options = NavigationOptions::default();
            match next_screen(&graph, current, &snapshot, item.as_deref(), options) {
                Ok(result) => match result.screen_id() {
                    Some(next) => {
                        current = next;
                        item = result.item_id;
                    }
                    None => break,
                },
                Err(NavigationError::NoAvailableNextScreen { .. }) => break,
                Err(other) => prop_assert!(false, "unexpected navigation error: {}", other),
            }
        }
        prop_assert!(visited.len() <= bound);
        let loop_visits = visited
            .iter()
            .filter(|(screen, _)| graph.screen(*screen).loop_name() == Some("dependents"))
            .filter(|(screen, _)| graph.screen(*screen).route == "dependent-name")
            .count();
        prop_assert_eq!(loop_visits, items);
    }
}
