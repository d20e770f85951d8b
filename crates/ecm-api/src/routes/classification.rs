//! # Classification Dashboard
//!
//! `GET /v1/classification/dashboard` — the read-model behind the
//! compliance dashboard: current band/score, trend, category breakdown,
//! and remediation counts for a selected set of sites.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ecm_classification::{build_dashboard, ClassificationDashboard, DashboardInputs};
use ecm_core::{ComplianceYear, SiteId};

use crate::error::AppError;
use crate::state::AppState;

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Company the dashboard is for.
    pub company_id: Uuid,
    /// Comma-separated site UUIDs.
    pub site_ids: String,
    /// Compliance year to report on.
    pub compliance_year: i32,
}

/// Dashboard response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub company_id: Uuid,
    pub compliance_year: i32,
    pub site_count: usize,
    /// The aggregated dashboard read-model.
    #[schema(value_type = Object)]
    pub dashboard: ClassificationDashboard,
}

/// Build the classification router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/classification/dashboard", get(dashboard))
}

/// GET /v1/classification/dashboard — Aggregate the dashboard.
#[utoipa::path(
    get,
    path = "/v1/classification/dashboard",
    params(
        ("company_id" = Uuid, Query, description = "Company the dashboard is for"),
        ("site_ids" = String, Query, description = "Comma-separated site UUIDs"),
        ("compliance_year" = i32, Query, description = "Compliance year to report on"),
    ),
    responses(
        (status = 200, description = "Dashboard read-model", body = DashboardResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "classification"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let year = ComplianceYear::new(query.compliance_year)?;
    let site_ids = parse_site_ids(&query.site_ids)?;
    let now = Utc::now();

    let current = state.data.assessments_for(&site_ids, year);
    let prior = match year.prior() {
        Some(prior_year) => state.data.assessments_for(&site_ids, prior_year),
        None => Vec::new(),
    };
    let records = state.data.non_compliances_for(&site_ids, year);
    let (open_remediations, overdue_remediations) = state.data.remediation_counts(&site_ids, now);

    let dashboard = build_dashboard(DashboardInputs {
        current,
        prior,
        records,
        open_remediations,
        overdue_remediations,
    });

    Ok(Json(DashboardResponse {
        company_id: query.company_id,
        compliance_year: query.compliance_year,
        site_count: site_ids.len(),
        dashboard,
    }))
}

fn parse_site_ids(raw: &str) -> Result<Vec<SiteId>, AppError> {
    let mut site_ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let uuid = Uuid::parse_str(part)
            .map_err(|_| AppError::Validation(format!("invalid site id '{part}'")))?;
        site_ids.push(SiteId::from(uuid));
    }
    if site_ids.is_empty() {
        return Err(AppError::Validation(
            "site_ids must contain at least one site".to_string(),
        ));
    }
    Ok(site_ids)
}
