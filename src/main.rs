use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aqs::api::{create_api_router, AppState};
use aqs::config::Config;
use aqs::druid::HttpDruidClient;
use aqs::history::MetricsQueryBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    match config.druid.request_uri() {
        Ok(uri) => info!("📊 Druid queries go to {}", uri),
        Err(_) => info!("📊 Druid is not configured"),
    }

    let state = Arc::new(AppState {
        backend: Arc::new(HttpDruidClient::new()?),
        builder: MetricsQueryBuilder::new(config.druid.clone()),
    });
    let router = create_api_router(state);

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 API server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
