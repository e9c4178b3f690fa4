use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nuveq_portal_api::config::AppConfig;
use nuveq_portal_api::create_app;
use nuveq_portal_api::handlers::AppStateInner;
use nuveq_portal_api::services::{BrowserlessClient, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.require_vendor() {
        tracing::warn!("{}; vendor routes will answer 500 until it is fixed", e);
    }

    let provider = Arc::new(BrowserlessClient::new(
        config.browserless_url.clone(),
        config.browserless_token.clone().unwrap_or_default(),
        config.session_ttl,
        config.timeouts.provider_request(),
    )?);
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppStateInner::new(config, provider, Arc::new(SystemClock)));

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("could not bind {}", bind_addr))?;
    tracing::info!("Server running on http://{}", bind_addr);
    tracing::info!("Swagger UI at http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
