//! # ecm-api — Axum API Service for the ECM Stack
//!
//! Exposes the readiness & classification engine's operations over HTTP.
//! Handlers carry no business logic — they translate DTOs, fetch the
//! tenant's rule configuration, and delegate to the domain crates.
//!
//! ## API Surface
//!
//! | Route                               | Module                      |
//! |-------------------------------------|-----------------------------|
//! | `POST /v1/readiness/evaluate`       | [`routes::readiness`]       |
//! | `POST /v1/packs`                    | [`routes::packs`]           |
//! | `GET /v1/packs`                     | [`routes::packs`]           |
//! | `GET /v1/packs/:id`                 | [`routes::packs`]           |
//! | `POST /v1/packs/:id/render-complete`| [`routes::packs`]           |
//! | `GET /v1/classification/dashboard`  | [`routes::classification`]  |
//! | `GET /openapi.json`                 | [`openapi`]                 |
//! | `GET /health/*`                     | unauthenticated probes      |
//!
//! ## Middleware Stack
//!
//! TraceLayer → MetricsMiddleware → Handler

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

use crate::middleware::ApiMetrics;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes are mounted outside the metrics middleware so probe
/// traffic does not skew request counters.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::readiness::router())
        .merge(routes::packs::router())
        .merge(routes::classification::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
