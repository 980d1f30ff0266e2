use crate::commands::{
    run_batches, run_checklist, run_next, run_progress, run_validate, run_walk, BatchesArgs,
    ChecklistArgs, NextArgs, ProgressArgs, ValidateArgs, WalkArgs,
};
use clap::{Parser, Subcommand};
use interview_flow::config::AppConfig;
use interview_flow::error::AppError;
use interview_flow::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "interview-flow",
    about = "Validate interview flows, route between screens and compute checklists",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a flow definition and print its structure
    Validate(ValidateArgs),
    /// Resolve the screen that follows a given screen
    Next(NextArgs),
    /// Compute checklist state for a fact snapshot (default command)
    Checklist(ChecklistArgs),
    /// Show where the filer stands inside each subcategory
    Progress(ProgressArgs),
    /// Route from a starting screen until a synthetic destination, a knockout, the flow end
    /// or the step limit
    Walk(WalkArgs),
    /// Report content batch status per screen
    Batches(BatchesArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Checklist(ChecklistArgs::default()));

    match command {
        Command::Validate(args) => run_validate(args),
        Command::Next(args) => run_next(&config, args),
        Command::Checklist(args) => run_checklist(&config, args),
        Command::Progress(args) => run_progress(&config, args),
        Command::Walk(args) => run_walk(&config, args),
        Command::Batches(args) => run_batches(args),
    }
}
