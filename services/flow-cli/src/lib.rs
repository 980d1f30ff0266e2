mod cli;
mod commands;
mod infra;

use interview_flow::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
