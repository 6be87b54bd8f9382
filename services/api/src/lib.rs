mod cli;
mod infra;
mod routes;
mod screen;
mod server;

use warrant_sop::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
