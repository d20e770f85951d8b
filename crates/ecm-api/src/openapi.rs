//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the engine's API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ECM Stack — Readiness & Classification Engine API",
        version = "0.3.2",
        description = "Readiness evaluation, regulatory pack lifecycle, and compliance classification dashboard.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::readiness::evaluate_readiness,
        crate::routes::packs::create_pack,
        crate::routes::packs::get_pack,
        crate::routes::packs::list_packs,
        crate::routes::packs::render_complete,
        crate::routes::classification::dashboard,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::readiness::GenerationRequestBody,
        crate::routes::readiness::ReadinessResponse,
        crate::routes::packs::CreatePackResponse,
        crate::routes::packs::PackSnapshotResponse,
        crate::routes::packs::RenderCallbackBody,
        crate::routes::classification::DashboardResponse,
    )),
    tags(
        (name = "readiness", description = "Dry-run readiness evaluation"),
        (name = "packs", description = "Regulatory pack lifecycle"),
        (name = "classification", description = "Compliance classification dashboard"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
