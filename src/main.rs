//! Similar products service entry point.

use anyhow::Context;
use similar_products::api::rest::{AppState, create_router};
use similar_products::application::use_cases::GetSimilarProductsUseCase;
use similar_products::config::AppConfig;
use similar_products::infrastructure::upstream::{HttpProductUpstream, ResilientProductClient};
use similar_products::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.logging).context("failed to install log subscriber")?;

    let http = HttpProductUpstream::new(
        &config.upstream.base_url,
        config.upstream.connect_timeout_ms,
        config.upstream.read_timeout_ms,
    )
    .context("failed to create upstream client")?;

    let upstream = ResilientProductClient::from_config(
        Arc::new(http),
        &config.resilience,
        config.upstream.attempt_timeout(),
    );
    let use_case =
        GetSimilarProductsUseCase::from_upstream(Arc::new(upstream), config.aggregation.clone());
    let router = create_router(AppState::new(use_case));

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;

    tracing::info!(
        address = %config.server.bind_address,
        upstream = %config.upstream.base_url,
        max_concurrency = config.aggregation.max_concurrency,
        "similar products service listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("similar products service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
