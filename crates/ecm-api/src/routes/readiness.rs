//! # Readiness Evaluation — Dry Run
//!
//! `POST /v1/readiness/evaluate` runs the same rule evaluation that
//! gates pack creation, with no side effects, so callers can surface
//! blocking issues before committing to generation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ecm_core::{CompanyId, ComplianceYear, DocumentId, SiteId};
use ecm_readiness::{GenerationRequest, PackConfiguration, PackType, RuleEvaluation};
use ecm_safeguards::PackDetailLevel;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// A pack generation request body, shared by the dry-run evaluation and
/// pack creation endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerationRequestBody {
    /// Requesting company.
    pub company_id: Uuid,
    /// Pack type to generate.
    #[schema(value_type = String, example = "regulator_pack")]
    pub pack_type: PackType,
    /// Sites the pack covers.
    pub site_ids: Vec<Uuid>,
    /// Documents referenced by the pack, if any.
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
    /// Compliance year the pack reports on.
    pub compliance_year: i32,
    /// Requested board-pack detail level.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub detail_level: Option<PackDetailLevel>,
    /// Whether to include incident statistics (tender packs).
    #[serde(default)]
    pub include_incident_statistics: bool,
}

impl Validate for GenerationRequestBody {
    fn validate(&self) -> Result<(), String> {
        if self.site_ids.is_empty() {
            return Err("site_ids must not be empty".to_string());
        }
        Ok(())
    }
}

impl GenerationRequestBody {
    /// Convert into the engine's request type.
    pub fn into_request(self) -> Result<GenerationRequest, AppError> {
        let compliance_year = ComplianceYear::new(self.compliance_year)?;
        Ok(GenerationRequest {
            company_id: CompanyId::from(self.company_id),
            pack_type: self.pack_type,
            site_ids: self.site_ids.into_iter().map(SiteId::from).collect(),
            document_ids: self.document_ids.into_iter().map(DocumentId::from).collect(),
            configuration: PackConfiguration {
                compliance_year,
                detail_level: self.detail_level,
                include_incident_statistics: self.include_incident_statistics,
            },
        })
    }
}

/// The complete evaluation result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    /// Derived: true iff `blocking_failures` is empty.
    pub can_generate: bool,
    /// Failed blocking rules.
    #[schema(value_type = Vec<Object>)]
    pub blocking_failures: Vec<RuleEvaluation>,
    /// Failed advisory rules.
    #[schema(value_type = Vec<Object>)]
    pub warnings: Vec<RuleEvaluation>,
    /// Passed and informational rules.
    #[schema(value_type = Vec<Object>)]
    pub passed_rules: Vec<RuleEvaluation>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the readiness router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/readiness/evaluate", post(evaluate_readiness))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/readiness/evaluate — Dry-run readiness evaluation.
#[utoipa::path(
    post,
    path = "/v1/readiness/evaluate",
    request_body = GenerationRequestBody,
    responses(
        (status = 200, description = "Complete evaluation result", body = ReadinessResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "readiness"
)]
pub async fn evaluate_readiness(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequestBody>, JsonRejection>,
) -> Result<Json<ReadinessResponse>, AppError> {
    let request = extract_validated_json(body)?.into_request()?;

    let adoption = state.data.adoption_for(request.company_id);
    let overrides = state.data.relaxations_for(request.company_id);
    let report = state.lifecycle.engine().evaluate(
        &request,
        &state.rules,
        adoption.as_ref(),
        &overrides,
        state.data.as_ref(),
        Utc::now(),
    )?;

    Ok(Json(ReadinessResponse {
        can_generate: report.can_generate(),
        blocking_failures: report.blocking_failures,
        warnings: report.warnings,
        passed_rules: report.passed_rules,
    }))
}
