mod check;
mod cli;
mod infra;
mod records;
mod reports;
mod submit;
mod watch;

use screening_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
