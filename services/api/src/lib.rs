mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use bloodlink::error::ApiError;

pub async fn run() -> Result<(), ApiError> {
    cli::run().await
}
