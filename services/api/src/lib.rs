mod cli;
mod evaluate;
mod infra;
mod routes;
mod server;

use rcd_feedback::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
