use super::common::{
    build, category, collection_loop, fact_screen, gated, node, screen, section, subcategory,
    with_content, Fixture,
};
use crate::flow::alerts::{RejectionCode, SubmissionStatus};
use crate::flow::checklist::{compute_checklist, ChecklistCategory, ChecklistSubcategoryState};
use crate::flow::condition::{Condition, ConditionOperator};
use crate::flow::content::{AlertKind, ContentItem, ContentNode};
use crate::flow::declaration::{FlowNode, SubcategoryDecl};
use crate::flow::facts::InMemoryFactStore;
use crate::flow::graph::FlowGraph;

fn guarded(route: &str, completion_fact: &str) -> SubcategoryDecl {
    let mut decl = subcategory(
        route,
        vec![section(
            "main",
            vec![node(fact_screen(&format!("{route}-intro"), &format!("/{route}Answer")))],
        )],
    );
    decl.complete_if = vec![Condition::fact(completion_fact, ConditionOperator::IsTrueAndComplete)];
    decl
}

fn unguarded(route: &str) -> SubcategoryDecl {
    subcategory(route, vec![node(screen(&format!("{route}-intro")))])
}

fn row<'a>(categories: &'a [ChecklistCategory], route: &str) -> &'a ChecklistSubcategoryState {
    categories
        .iter()
        .flat_map(|category| &category.subcategories)
        .find(|row| row.subcategory_route == route)
        .unwrap_or_else(|| panic!("row {route} present"))
}

fn checklist(graph: &FlowGraph, store: InMemoryFactStore) -> Vec<ChecklistCategory> {
    let fixture = Fixture::new(store);
    compute_checklist(graph, &fixture.snapshot(), None)
}

#[test]
fn first_incomplete_subcategory_is_next() {
    let graph = build(vec![category("family", vec![guarded("a", "/x"), unguarded("b")])]);
    let rows = checklist(&graph, InMemoryFactStore::new());

    let a = row(&rows, "/flow/family/a");
    assert!(a.is_next);
    assert!(!a.is_complete);
    assert_eq!(a.navigation_url.as_deref(), Some("/flow/family/a/a-intro"));

    let b = row(&rows, "/flow/family/b");
    assert!(!b.is_next);
    assert!(!b.is_complete);
    assert!(b.is_locked());
    assert_eq!(b.navigation_url, None);
    assert!(rows[0].active);
}

#[test]
fn completing_a_subcategory_moves_next_forward() {
    let graph = build(vec![category("family", vec![guarded("a", "/x"), unguarded("b")])]);
    let rows = checklist(&graph, InMemoryFactStore::new().with_bool("/x", true));

    let a = row(&rows, "/flow/family/a");
    assert!(a.is_complete);
    assert!(!a.is_next);
    assert_eq!(a.navigation_url.as_deref(), Some("/data-view/flow/family/a?reviewMode=true"));

    let b = row(&rows, "/flow/family/b");
    assert!(b.is_next);
    assert_eq!(b.navigation_url.as_deref(), Some("/flow/family/b/b-intro"));
}

#[test]
fn completion_is_sequential() {
    let graph = build(vec![category(
        "family",
        vec![guarded("a", "/x"), guarded("b", "/y"), guarded("c", "/z")],
    )]);
    let rows = checklist(
        &graph,
        InMemoryFactStore::new()
            .with_bool("/y", true)
            .with_bool("/z", true),
    );

    assert!(row(&rows, "/flow/family/a").is_next);
    assert!(!row(&rows, "/flow/family/b").is_complete);
    assert!(!row(&rows, "/flow/family/c").is_complete);
    let next_count = rows[0].subcategories.iter().filter(|row| row.is_next).count();
    assert_eq!(next_count, 1);
}

#[test]
fn hidden_subcategories_do_not_take_part() {
    let mut hidden = guarded("hidden", "/never");
    hidden.display_only_if = vec![Condition::is_true("/showHidden")];
    let graph = build(vec![category(
        "family",
        vec![guarded("a", "/x"), hidden, unguarded("b")],
    )]);
    let rows = checklist(&graph, InMemoryFactStore::new().with_bool("/x", true));

    assert_eq!(rows[0].subcategories.len(), 2);
    assert!(row(&rows, "/flow/family/b").is_next);
}

#[test]
fn unreachable_next_subcategory_counts_as_complete() {
    let mut gated_off = subcategory(
        "gated-off",
        vec![node(gated(screen("only"), Condition::is_true("/never")))],
    );
    gated_off.complete_if = vec![Condition::is_true("/never")];
    let graph = build(vec![category(
        "family",
        vec![guarded("a", "/x"), gated_off, unguarded("b")],
    )]);
    let rows = checklist(&graph, InMemoryFactStore::new().with_bool("/x", true));

    let skipped = row(&rows, "/flow/family/gated-off");
    assert!(!skipped.is_next);
    assert!(skipped.is_complete);
    assert!(row(&rows, "/flow/family/b").is_next);
}

#[test]
fn later_categories_stay_inactive_until_reached() {
    let graph = build(vec![
        category("family", vec![guarded("a", "/x")]),
        category("income", vec![guarded("jobs", "/jobsDone")]),
    ]);
    let rows = checklist(&graph, InMemoryFactStore::new());

    assert!(rows[0].active);
    assert!(!rows[1].active);
    let jobs = row(&rows, "/flow/income/jobs");
    assert!(!jobs.is_next);
    assert_eq!(jobs.navigation_url, None);
}

#[test]
fn excluded_categories_are_not_listed() {
    let graph = build(vec![
        category("family", vec![guarded("a", "/x")]),
        category("knockout", vec![unguarded("not-eligible")]),
    ]);
    let rows = checklist(&graph, InMemoryFactStore::new());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].route, "/flow/family");
}

fn jobs_subcategory(lock: bool) -> SubcategoryDecl {
    let mut jobs_loop = collection_loop(
        "jobs",
        "/jobs",
        false,
        vec![section("employer", vec![node(fact_screen("job-employer", "/jobs/*/hasEmployer"))])],
    );
    jobs_loop.collection_item_completed_condition = Some(Condition::is_true("/jobs/*/isComplete"));
    let mut decl = subcategory(
        "jobs",
        vec![
            node(screen("jobs-intro")),
            FlowNode::CollectionLoop(jobs_loop),
        ],
    );
    decl.complete_if = vec![Condition::is_true("/jobsDone")];
    decl.lock_future_sections_if_collection_items_incomplete = lock;
    decl
}

#[test]
fn incomplete_collection_items_lock_the_subcategory() {
    let graph = build(vec![category(
        "income",
        vec![jobs_subcategory(true), unguarded("after")],
    )]);
    let store = InMemoryFactStore::new()
        .with_bool("/jobsDone", true)
        .with_collection("/jobs", ["j1"])
        .with_bool("/jobs/#j1/isComplete", false);
    let rows = checklist(&graph, store.clone());

    let jobs = row(&rows, "/flow/income/jobs");
    assert!(jobs.has_incomplete_collection_item);
    assert!(!jobs.is_complete);
    assert!(jobs.is_next);
    assert!(jobs.is_started_but_not_complete);
    assert_eq!(
        jobs.navigation_url.as_deref(),
        Some("/data-view/flow/income/jobs?reviewMode=true")
    );
    assert!(!row(&rows, "/flow/income/after").is_next);

    let rows = checklist(&graph, store.with_bool("/jobs/#j1/isComplete", true));
    let jobs = row(&rows, "/flow/income/jobs");
    assert!(!jobs.has_incomplete_collection_item);
    assert!(jobs.is_complete);
    assert!(row(&rows, "/flow/income/after").is_next);
}

#[test]
fn incomplete_items_only_lock_when_asked_to() {
    let graph = build(vec![category("income", vec![jobs_subcategory(false)])]);
    let store = InMemoryFactStore::new()
        .with_bool("/jobsDone", true)
        .with_collection("/jobs", ["j1"]);
    let rows = checklist(&graph, store);

    let jobs = row(&rows, "/flow/income/jobs");
    assert!(jobs.has_incomplete_collection_item);
    assert!(jobs.is_complete);
}

#[test]
fn subcategory_context_comes_from_the_referenced_item() {
    let mut you = subcategory(
        "you",
        vec![section("name", vec![node(fact_screen("name", "/filers/*/firstName"))])],
    );
    you.collection_context = Some("/primaryFiler".into());
    you.complete_if = vec![Condition::is_true("/filers/*/isDone")];
    let graph = build(vec![category("family", vec![you])]);

    let rows = checklist(
        &graph,
        InMemoryFactStore::new().with_item_ref("/primaryFiler", "f1"),
    );
    assert_eq!(
        row(&rows, "/flow/family/you").navigation_url.as_deref(),
        Some("/flow/family/you/name?%2FprimaryFiler=f1")
    );

    let rows = checklist(
        &graph,
        InMemoryFactStore::new()
            .with_item_ref("/primaryFiler", "f1")
            .with_bool("/filers/#f1/isDone", true),
    );
    let you = row(&rows, "/flow/family/you");
    assert!(you.is_complete);
    assert_eq!(
        you.navigation_url.as_deref(),
        Some("/data-view/flow/family/you?%2FprimaryFiler=f1&reviewMode=true")
    );
}

#[test]
fn screens_acting_as_data_views_replace_the_summary_link() {
    let mut summary = fact_screen("summary", "/summaryConfirmed");
    summary.act_as_data_view = true;
    let mut decl = subcategory("review", vec![section("main", vec![node(summary)])]);
    decl.complete_if = vec![Condition::is_true("/reviewed")];
    let graph = build(vec![category("sign", vec![decl])]);

    let rows = checklist(&graph, InMemoryFactStore::new().with_bool("/reviewed", true));
    assert_eq!(
        row(&rows, "/flow/sign/review").navigation_url.as_deref(),
        Some("/flow/sign/review/summary?reviewMode=true")
    );
}

fn alert(kind: AlertKind, key: &str, condition: Condition) -> ContentItem {
    ContentItem::new(ContentNode::TaxReturnAlert {
        alert_type: kind,
        i18n_key: key.into(),
        fact_paths: vec![],
    })
    .when(condition)
}

#[test]
fn alerts_are_collected_for_active_categories() {
    let intro = with_content(
        screen("a-intro"),
        alert(AlertKind::Warning, "alerts.checkIncome", Condition::is_true("/lowIncome")),
    );
    let intro = with_content(
        intro,
        alert(AlertKind::Error, "alerts.missingSsn", Condition::is_true("/missingSsn")),
    );
    let mut a = subcategory("a", vec![node(intro)]);
    a.complete_if = vec![Condition::is_true("/x")];
    let later = with_content(
        screen("b-intro"),
        alert(AlertKind::Warning, "alerts.later", Condition::is_true("/lowIncome")),
    );
    let graph = build(vec![
        category("family", vec![a]),
        category("income", vec![subcategory("b", vec![node(later)])]),
    ]);

    let rows = checklist(&graph, InMemoryFactStore::new().with_bool("/lowIncome", true));
    let a = row(&rows, "/flow/family/a");
    assert_eq!(a.alerts.warnings.len(), 1);
    assert_eq!(a.alerts.warnings[0].i18n_key, "alerts.checkIncome");
    assert_eq!(a.alerts.warnings[0].route, "/flow/family/a/a-intro");
    assert!(a.alerts.errors.is_empty());
    assert!(row(&rows, "/flow/income/b").alerts.is_empty());
}

#[test]
fn loop_alerts_are_reported_per_item() {
    let employer = with_content(
        fact_screen("job-employer", "/jobs/*/hasEmployer"),
        alert(AlertKind::Error, "alerts.wagesMissing", Condition::is_true("/jobs/*/wagesMissing")),
    );
    let jobs_loop = collection_loop(
        "jobs",
        "/jobs",
        false,
        vec![section("employer", vec![node(employer)])],
    );
    let mut decl = subcategory(
        "jobs",
        vec![node(screen("jobs-intro")), FlowNode::CollectionLoop(jobs_loop)],
    );
    decl.complete_if = vec![Condition::is_true("/jobsDone")];
    let graph = build(vec![category("income", vec![decl])]);

    let store = InMemoryFactStore::new()
        .with_collection("/jobs", ["j1", "j2", "j3"])
        .with_bool("/jobs/#j1/wagesMissing", true)
        .with_bool("/jobs/#j3/wagesMissing", true);
    let rows = checklist(&graph, store);

    let errors = &row(&rows, "/flow/income/jobs").alerts.errors;
    let items: Vec<_> = errors.iter().map(|alert| alert.item_id.as_deref()).collect();
    assert_eq!(items, vec![Some("j1"), Some("j3")]);
    assert!(errors.iter().all(|alert| alert.loop_name.as_deref() == Some("jobs")));
}

#[test]
fn rejection_alerts_need_a_matching_code() {
    let intro = with_content(
        screen("a-intro"),
        ContentItem::new(ContentNode::MefAlert {
            alert_type: AlertKind::Error,
            i18n_key: "mef.ind031".into(),
            mef_error_code: "IND-031-04".into(),
            fact_paths: vec!["/priorYearAgi".into()],
        }),
    );
    let mut a = subcategory("a", vec![node(intro)]);
    a.complete_if = vec![Condition::is_true("/x")];
    let graph = build(vec![category("family", vec![a])]);
    let fixture = Fixture::new(InMemoryFactStore::new());
    let snapshot = fixture.snapshot();

    let rejected = SubmissionStatus {
        rejection_codes: vec![RejectionCode {
            mef_error_code: "IND-031-04".into(),
            translation_key: None,
        }],
    };
    let rows = compute_checklist(&graph, &snapshot, Some(&rejected));
    let mef = &row(&rows, "/flow/family/a").mef_alerts;
    assert_eq!(mef.errors.len(), 1);
    assert_eq!(mef.errors[0].mef_error_code.as_deref(), Some("IND-031-04"));

    let other = SubmissionStatus {
        rejection_codes: vec![RejectionCode {
            mef_error_code: "R0000-504-02".into(),
            translation_key: None,
        }],
    };
    let rows = compute_checklist(&graph, &snapshot, Some(&other));
    assert!(row(&rows, "/flow/family/a").mef_alerts.is_empty());

    let rows = compute_checklist(&graph, &snapshot, None);
    assert!(row(&rows, "/flow/family/a").mef_alerts.is_empty());
}
