mod auth;
mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use propease::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
