use crate::infra::{load_graph, load_snapshot_inputs, parse_batch_state, parse_date, print_json};
use chrono::{Local, NaiveDate};
use clap::Args;
use interview_flow::config::AppConfig;
use interview_flow::error::AppError;
use interview_flow::flow::batches::{screen_is_in_state, screen_status, BatchState, ScreenStatus};
use interview_flow::flow::{
    compute_checklist, next_screen, next_screen_from_route, subcategory_progress, Destination,
    FlowGraph, NavigationError, NavigationOptions, ResumePoint, RouteOptions, ScreenId, Snapshot,
};
use interview_flow::snapshot::load_submission;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Default)]
pub(crate) struct ValidateArgs {
    /// Flow definition JSON. Defaults to the bundled sample flow.
    #[arg(long)]
    pub(crate) flow: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SnapshotArgs {
    /// Flow definition JSON. Defaults to the bundled sample flow.
    #[arg(long)]
    pub(crate) flow: Option<PathBuf>,
    /// Fact snapshot as CSV (path,kind,value,complete) or JSON.
    #[arg(long)]
    pub(crate) facts: Option<PathBuf>,
    /// Data-import profile JSON. Imports are treated as not loaded when omitted.
    #[arg(long)]
    pub(crate) imports: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct NextArgs {
    #[command(flatten)]
    pub(crate) snapshot: SnapshotArgs,
    /// Full route of the current screen, e.g. /flow/income/jobs/jobs-intro
    #[arg(long)]
    pub(crate) screen: String,
    /// Collection item the current screen is shown for.
    #[arg(long)]
    pub(crate) item: Option<String>,
    /// Navigate as if reviewing a completed section.
    #[arg(long)]
    pub(crate) review: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ChecklistArgs {
    #[command(flatten)]
    pub(crate) snapshot: SnapshotArgs,
    /// Submission status JSON carrying MeF rejection codes.
    #[arg(long)]
    pub(crate) submission: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ProgressArgs {
    #[command(flatten)]
    pub(crate) snapshot: SnapshotArgs,
}

#[derive(Args, Debug)]
pub(crate) struct WalkArgs {
    #[command(flatten)]
    pub(crate) snapshot: SnapshotArgs,
    /// Route to start from. Defaults to the first screen of the flow.
    #[arg(long)]
    pub(crate) start: Option<String>,
    /// Collection item for the starting screen.
    #[arg(long)]
    pub(crate) item: Option<String>,
    /// Upper bound on routing steps.
    #[arg(long, default_value_t = 200)]
    pub(crate) max_steps: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BatchesArgs {
    /// Flow definition JSON. Defaults to the bundled sample flow.
    #[arg(long)]
    pub(crate) flow: Option<PathBuf>,
    /// Only list screens in this state: locked, unlocked, publishable, unpublishable.
    #[arg(long, value_parser = parse_batch_state)]
    pub(crate) status: Option<BatchState>,
    /// Reference date for days-in-status (defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Serialize)]
struct LoopSummary<'a> {
    name: &'a str,
    knockout_route: Option<&'a str>,
}

#[derive(Serialize)]
struct SubcategorySummary<'a> {
    route: &'a str,
    screens: usize,
    loops: Vec<LoopSummary<'a>>,
    has_data_view: bool,
    is_sign_and_submit: bool,
    assertions: usize,
}

fn flow_summary(graph: &FlowGraph) -> serde_json::Value {
    let categories: Vec<_> = graph
        .categories()
        .iter()
        .map(|category| {
            let subcategories: Vec<_> = category
                .subcategories
                .iter()
                .map(|id| {
                    let subcategory = graph.subcategory(*id);
                    SubcategorySummary {
                        route: &subcategory.route,
                        screens: subcategory.screens.len(),
                        loops: subcategory
                            .loops
                            .iter()
                            .map(|loop_id| {
                                let collection_loop = graph.collection_loop(*loop_id);
                                LoopSummary {
                                    name: &collection_loop.loop_name,
                                    knockout_route: collection_loop.knockout_route.as_deref(),
                                }
                            })
                            .collect(),
                        has_data_view: subcategory.has_data_view,
                        is_sign_and_submit: subcategory.is_sign_and_submit,
                        assertions: subcategory.assertions.len(),
                    }
                })
                .collect();
            json!({ "route": category.route, "subcategories": subcategories })
        })
        .collect();

    json!({
        "valid": true,
        "screens": graph.screens().len(),
        "loops": graph.collection_loops().len(),
        "categories": categories,
    })
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let graph = load_graph(args.flow)?;
    print_json(&flow_summary(&graph))
}

pub(crate) fn run_next(config: &AppConfig, args: NextArgs) -> Result<(), AppError> {
    let graph = load_graph(args.snapshot.flow)?;
    let (facts, imports) = load_snapshot_inputs(args.snapshot.facts, args.snapshot.imports)?;
    let settings = config.engine_settings();
    let snapshot = Snapshot::new(&facts, &imports, &settings);
    let options = if args.review {
        NavigationOptions::REVIEW
    } else {
        NavigationOptions::default()
    };

    let result = next_screen_from_route(
        &graph,
        &args.screen,
        &snapshot,
        args.item.as_deref(),
        options,
    )?;
    let route = result.full_route(&graph);
    info!(from = %args.screen, to = %route, "resolved next screen");
    print_json(&json!({
        "destination": result.destination,
        "item_id": result.item_id,
        "route": route,
    }))
}

pub(crate) fn run_checklist(config: &AppConfig, args: ChecklistArgs) -> Result<(), AppError> {
    let graph = load_graph(args.snapshot.flow)?;
    let (facts, imports) = load_snapshot_inputs(args.snapshot.facts, args.snapshot.imports)?;
    let submission = args.submission.map(load_submission).transpose()?;
    let settings = config.engine_settings();
    let snapshot = Snapshot::new(&facts, &imports, &settings);

    let checklist = compute_checklist(&graph, &snapshot, submission.as_ref());
    print_json(&checklist)
}

pub(crate) fn run_progress(config: &AppConfig, args: ProgressArgs) -> Result<(), AppError> {
    let graph = load_graph(args.snapshot.flow)?;
    let (facts, imports) = load_snapshot_inputs(args.snapshot.facts, args.snapshot.imports)?;
    let settings = config.engine_settings();
    let snapshot = Snapshot::new(&facts, &imports, &settings);

    let resume_route = |point: &ResumePoint| {
        graph
            .screen(point.screen)
            .full_route(point.item_id.as_deref(), RouteOptions::default())
    };
    let rows: Vec<_> = graph
        .subcategories()
        .iter()
        .map(|subcategory| {
            let progress = subcategory_progress(&graph, subcategory, &snapshot);
            let loops: Vec<_> = progress
                .loops
                .iter()
                .map(|summary| {
                    json!({
                        "loop_name": summary.loop_name,
                        "progress": summary.progress,
                        "resume_route": summary.resume_at.as_ref().map(&resume_route),
                    })
                })
                .collect();
            json!({
                "subcategory_route": progress.subcategory_route,
                "item_id": progress.item_id,
                "started": progress.started,
                "resume_route": progress.resume_at.as_ref().map(&resume_route),
                "loops": loops,
                "active_assertions": progress.active_assertions,
            })
        })
        .collect();

    info!(subcategories = rows.len(), "progress report");
    print_json(&rows)
}

#[derive(Serialize)]
struct WalkStep {
    route: String,
    item_id: Option<String>,
}

pub(crate) fn run_walk(config: &AppConfig, args: WalkArgs) -> Result<(), AppError> {
    let graph = load_graph(args.snapshot.flow)?;
    let (facts, imports) = load_snapshot_inputs(args.snapshot.facts, args.snapshot.imports)?;
    let settings = config.engine_settings();
    let snapshot = Snapshot::new(&facts, &imports, &settings);

    let mut current = match args.start.as_deref() {
        Some(route) => graph
            .screen_by_route(route)
            .ok_or_else(|| NavigationError::ScreenNotInFlow {
                screen: route.to_string(),
            })?,
        None => first_screen(&graph)?,
    };
    let mut item = args.item.or_else(|| screen_context(&graph, current, &snapshot));
    let mut steps = vec![step(&graph, current, item.as_deref())];
    let mut outcome = "max_steps";

    for _ in 0..args.max_steps {
        if graph.screen(current).is_knockout {
            outcome = "knockout";
            break;
        }
        let navigation = next_screen(
            &graph,
            current,
            &snapshot,
            item.as_deref(),
            NavigationOptions::default(),
        );
        let result = match navigation {
            Ok(result) => result,
            Err(NavigationError::NoAvailableNextScreen { .. }) => {
                outcome = "end_of_flow";
                break;
            }
            Err(err) => return Err(err.into()),
        };
        match result.destination {
            Destination::Screen { screen } => {
                current = screen;
                item = result.item_id;
                steps.push(step(&graph, current, item.as_deref()));
            }
            _ => {
                steps.push(WalkStep {
                    route: result.full_route(&graph),
                    item_id: result.item_id,
                });
                outcome = "left_subcategory";
                break;
            }
        }
    }
    if outcome == "max_steps" {
        warn!(max_steps = args.max_steps, "walk stopped at the step limit");
    }

    print_json(&json!({ "outcome": outcome, "steps": steps }))
}

fn first_screen(graph: &FlowGraph) -> Result<ScreenId, AppError> {
    graph.screen_ids().next().ok_or_else(|| {
        NavigationError::ScreenNotInFlow {
            screen: "<first>".to_string(),
        }
        .into()
    })
}

/// Item a screen is shown for when entered directly: the referenced filer for
/// item-reference contexts, otherwise the first member of the collection.
fn screen_context(graph: &FlowGraph, id: ScreenId, snapshot: &Snapshot<'_>) -> Option<String> {
    let collection = graph.screen(id).collection_context.as_deref()?;
    snapshot
        .referenced_item(collection)
        .or_else(|| snapshot.collection_items(collection).into_iter().next())
}

fn step(graph: &FlowGraph, id: ScreenId, item: Option<&str>) -> WalkStep {
    WalkStep {
        route: graph.screen(id).full_route(item, RouteOptions::default()),
        item_id: item.map(str::to_string),
    }
}

#[derive(Serialize)]
struct ScreenBatches<'a> {
    route: &'a str,
    batches: Vec<BatchAge<'a>>,
    status: ScreenStatus,
}

#[derive(Serialize)]
struct BatchAge<'a> {
    name: &'a str,
    status: &'static str,
    days_in_status: Option<i64>,
}

pub(crate) fn run_batches(args: BatchesArgs) -> Result<(), AppError> {
    let graph = load_graph(args.flow)?;
    let registry = graph.content_batches();
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let screens: Vec<_> = graph
        .screens()
        .iter()
        .filter(|screen| !screen.batches.is_empty())
        .filter(|screen| {
            args.status
                .map_or(true, |state| screen_is_in_state(state, &screen.batches, registry))
        })
        .map(|screen| ScreenBatches {
            route: &screen.screen_route,
            batches: screen
                .batches
                .iter()
                .filter_map(|name| registry.get_key_value(name))
                .map(|(name, details)| BatchAge {
                    name,
                    status: details.status.label(),
                    days_in_status: details.days_in_status(today),
                })
                .collect(),
            status: screen_status(&screen.batches, registry),
        })
        .collect();

    info!(screens = screens.len(), "batch report");
    print_json(&json!({ "today": today, "screens": screens }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn subcategory<'a>(summary: &'a Value, route: &str) -> &'a Value {
        summary["categories"]
            .as_array()
            .into_iter()
            .flatten()
            .flat_map(|category| category["subcategories"].as_array().into_iter().flatten())
            .find(|subcategory| subcategory["route"] == route)
            .unwrap_or_else(|| panic!("missing subcategory {route}"))
    }

    #[test]
    fn summary_reports_sign_and_submit_and_knockout_routes() {
        let graph = load_graph(None).expect("sample flow builds");
        let summary = flow_summary(&graph);

        let sign = subcategory(&summary, "/flow/complete/sign-and-submit");
        assert_eq!(sign["is_sign_and_submit"], true);
        let about_you = subcategory(&summary, "/flow/you-and-your-family/about-you");
        assert_eq!(about_you["is_sign_and_submit"], false);

        let jobs = subcategory(&summary, "/flow/income/jobs");
        assert_eq!(
            jobs["loops"],
            json!([{
                "name": "w2s",
                "knockout_route": "/flow/you-and-your-family/about-you/nonresident-knockout",
            }])
        );
        let dependents = subcategory(&summary, "/flow/you-and-your-family/dependents");
        assert_eq!(dependents["loops"][0]["knockout_route"], Value::Null);
    }
}
