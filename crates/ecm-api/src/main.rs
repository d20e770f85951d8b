//! # ecm-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the ECM Stack engine API.
//! Binds to a configurable port (default 8080).

use anyhow::Context;

use ecm_api::state::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config = AppConfig { port };

    // Load the rule-set manifest (ECM_CONFIG) and assemble state.
    let state = ecm_api::bootstrap::bootstrap(config).context("bootstrap failed")?;

    let app = ecm_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("ECM API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
