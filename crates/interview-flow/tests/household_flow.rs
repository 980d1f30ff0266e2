use interview_flow::flow::batches::{screen_is_in_state, screen_status, BatchState, BatchStatus};
use interview_flow::flow::{
    compute_checklist, next_screen_from_route, ChecklistCategory, ChecklistSubcategoryState,
    Destination, EngineSettings, FactResult, FactValue, FlowDeclaration, FlowGraph,
    ImportProfileState, InMemoryFactStore, NavigationOptions, Snapshot,
};
use interview_flow::snapshot::load_facts;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn household_graph() -> FlowGraph {
    FlowDeclaration::load_graph(fixture("household_flow.json")).expect("fixture flow builds")
}

fn household_facts() -> InMemoryFactStore {
    load_facts(fixture("household_facts.csv")).expect("fixture facts load")
}

fn find<'a>(rows: &'a [ChecklistCategory], route: &str) -> Option<&'a ChecklistSubcategoryState> {
    rows.iter()
        .flat_map(|category| &category.subcategories)
        .find(|row| row.subcategory_route == route)
}

#[test]
fn fixture_flow_builds_with_every_section() {
    let graph = household_graph();

    assert_eq!(graph.categories().len(), 3);
    assert_eq!(graph.subcategories().len(), 5);
    assert_eq!(graph.collection_loops().len(), 2);

    let dependents = graph
        .collection_loop_by_name("dependents")
        .expect("dependents loop");
    assert!(!dependents.auto_iterate);
    assert_eq!(dependents.collection_name, "/familyAndHousehold");
    assert_eq!(dependents.full_route, "/flow/you-and-your-family/dependents");

    let about_you = graph
        .subcategory_by_route("/flow/you-and-your-family/about-you")
        .expect("about you");
    assert_eq!(about_you.collection_name.as_deref(), Some("/primaryFiler"));
    assert_eq!(about_you.sub_subcategories.len(), 2);
}

#[test]
fn checklist_reflects_the_household_snapshot() {
    let graph = household_graph();
    let store = household_facts();
    let imports = ImportProfileState::default();
    let settings = EngineSettings::default();
    let snapshot = Snapshot::new(&store, &imports, &settings);

    let rows = compute_checklist(&graph, &snapshot, None);
    assert_eq!(rows.len(), 3);

    let about_you = find(&rows, "/flow/you-and-your-family/about-you").expect("about you row");
    assert!(about_you.is_complete);
    assert_eq!(
        about_you.navigation_url.as_deref(),
        Some("/data-view/flow/you-and-your-family/about-you?%2FprimaryFiler=f1&reviewMode=true")
    );

    assert!(find(&rows, "/flow/you-and-your-family/spouse").is_none());

    let dependents = find(&rows, "/flow/you-and-your-family/dependents").expect("dependents row");
    assert!(dependents.is_next);
    assert!(!dependents.is_complete);
    assert!(dependents.is_started_but_not_complete);
    assert!(dependents.has_incomplete_collection_item);
    assert_eq!(dependents.alerts.errors.len(), 1);
    assert_eq!(dependents.alerts.errors[0].item_id.as_deref(), Some("d2"));
    assert_eq!(
        dependents.alerts.errors[0].fact_paths,
        vec!["/familyAndHousehold/*/tin".to_string()]
    );

    let income = rows.iter().find(|row| row.route == "/flow/income").expect("income");
    assert!(!income.active);
    assert!(income
        .subcategories
        .iter()
        .all(|row| row.navigation_url.is_none() && !row.is_next));
}

#[test]
fn finishing_the_last_dependent_unlocks_income() {
    let graph = household_graph();
    let mut store = household_facts();
    store.insert(
        "/familyAndHousehold/#d2/isComplete",
        FactResult::complete(FactValue::Boolean(true)),
    );
    let imports = ImportProfileState::default();
    let settings = EngineSettings::default();
    let snapshot = Snapshot::new(&store, &imports, &settings);

    let rows = compute_checklist(&graph, &snapshot, None);
    let jobs = find(&rows, "/flow/income/jobs").expect("jobs row");
    assert!(jobs.is_next);
    assert_eq!(
        jobs.navigation_url.as_deref(),
        Some("/data-view/flow/income/jobs?reviewMode=true")
    );
}

#[test]
fn navigation_keeps_the_filer_context() {
    let graph = household_graph();
    let store = household_facts();
    let imports = ImportProfileState::default();
    let settings = EngineSettings::default();
    let snapshot = Snapshot::new(&store, &imports, &settings);

    let result = next_screen_from_route(
        &graph,
        "/flow/you-and-your-family/about-you/intro",
        &snapshot,
        Some("f1"),
        NavigationOptions::default(),
    )
    .expect("routes");
    assert_eq!(
        result.full_route(&graph),
        "/flow/you-and-your-family/about-you/date-of-birth?%2FprimaryFiler=f1"
    );
}

#[test]
fn nonresidents_are_knocked_out() {
    let graph = household_graph();
    let store = household_facts().with_bool("/filers/#f1/isNonResident", true);
    let imports = ImportProfileState::default();
    let settings = EngineSettings::default();
    let snapshot = Snapshot::new(&store, &imports, &settings);

    let result = next_screen_from_route(
        &graph,
        "/flow/you-and-your-family/about-you/intro",
        &snapshot,
        Some("f1"),
        NavigationOptions::default(),
    )
    .expect("routes");
    let screen = result.screen_id().map(|id| graph.screen(id)).expect("screen");
    assert!(screen.is_knockout);
    assert_eq!(screen.route, "nonresident-knockout");
}

#[test]
fn auto_iterating_w2_loop_runs_once_per_form() {
    let graph = household_graph();
    let store = household_facts();
    let imports = ImportProfileState::default();
    let settings = EngineSettings::default();
    let snapshot = Snapshot::new(&store, &imports, &settings);

    let into_loop = next_screen_from_route(
        &graph,
        "/flow/income/jobs/jobs-intro",
        &snapshot,
        None,
        NavigationOptions::default(),
    )
    .expect("routes");
    assert_eq!(
        into_loop.full_route(&graph),
        "/flow/income/jobs/w2-employer?%2FformW2s=w1"
    );

    let out_of_loop = next_screen_from_route(
        &graph,
        "/flow/income/jobs/w2-wages",
        &snapshot,
        Some("w1"),
        NavigationOptions::default(),
    )
    .expect("routes");
    assert_eq!(out_of_loop.full_route(&graph), "/flow/income/jobs/jobs-summary");
    assert_eq!(out_of_loop.item_id, None);

    let leaving = next_screen_from_route(
        &graph,
        "/flow/income/jobs/jobs-summary",
        &snapshot,
        None,
        NavigationOptions::default(),
    )
    .expect("routes");
    assert_eq!(
        leaving.destination,
        Destination::DataView {
            subcategory_route: "/flow/income/jobs".into(),
            section: None,
        }
    );
}

#[test]
fn screen_batches_drive_publication_state() {
    let graph = household_graph();
    let batches = graph.content_batches();
    let batches_of = |route: &str| {
        let id = graph.screen_by_route(route).expect("screen exists");
        graph.screen(id).batches.clone()
    };

    let intro = batches_of("/flow/you-and-your-family/about-you/intro");
    let status = screen_status(&intro, batches);
    assert!(status.is_publishable);
    assert!(!status.is_open);

    let dependent = batches_of("/flow/you-and-your-family/dependents/dependent-name");
    assert!(screen_is_in_state(BatchState::Locked, &dependent, batches));
    assert!(screen_is_in_state(BatchState::Unpublishable, &dependent, batches));

    let employer = batches_of("/flow/income/jobs/w2-employer");
    assert!(screen_is_in_state(BatchState::Unlocked, &employer, batches));
    assert!(interview_flow::flow::batches::screen_is_in_workflow_step(
        BatchStatus::Wip,
        &employer,
        batches
    ));
}
