use std::sync::Arc;

use anyhow::Context;

use stockpile_infra::bootstrap;
use stockpile_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();
    stockpile_observability::init();
    if let Err(err) = dotenv {
        if !err.not_found() {
            tracing::warn!(error = %err, "failed to load .env");
        }
    }

    let config = AppConfig::from_env().context("invalid configuration")?;
    let facade = Arc::new(bootstrap::build_facade(&config).await);

    let backends: Vec<&str> = facade
        .available_backends()
        .iter()
        .map(|b| b.as_str())
        .collect();
    if backends.is_empty() {
        tracing::warn!("no backend is available; every inventory request will fail");
    }

    let app = stockpile_api::app::build_app(facade, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    tracing::info!(
        address = %listener.local_addr()?,
        backends = ?backends,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
