use std::env;

use anyhow::Result;
use beacon_api::{build_app, ApiConfig};
use beacon_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("beacon_api");

    let config = ApiConfig::from_env();
    let bind = env::var("BEACON_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "beacon triage api started");

    axum::serve(listener, app).await?;
    Ok(())
}
