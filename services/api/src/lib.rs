mod cli;
mod infra;
mod ingest;
mod report;
mod routes;
mod server;

use neighbourhood_map::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
