mod cli;
mod forms;
mod infra;
mod routes;
mod server;

use stem_club::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
