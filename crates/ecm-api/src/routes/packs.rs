//! # Pack Operations
//!
//! - `POST /v1/packs` — create a pack. Returns `202 Accepted`: the
//!   readiness gate runs synchronously, the render happens out of band.
//!   A blocked request still creates a (FAILED) record so the attempt
//!   and its blocking reasons are auditable.
//! - `GET /v1/packs/:id` — pack snapshot; lazy expiry applies on read.
//! - `GET /v1/packs?company_id=` — active packs (expired excluded).
//! - `POST /v1/packs/:id/render-complete` — callback by which the
//!   external render job reports its outcome, driving finalization.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ecm_core::{ArtifactDigest, CompanyId, PackId};
use ecm_pack::{
    MetadataInputs, PackArtifact, PackMetadata, PackStatus, RegulatoryPack, RenderOutcome,
    RuleContext,
};
use ecm_readiness::{PackType, ReadinessReport};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::readiness::GenerationRequestBody;
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Accepted-response for pack creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePackResponse {
    /// The new pack record's id.
    pub pack_id: Uuid,
    /// The state the pack landed in (`GENERATING`, or `FAILED` when
    /// blocked at creation).
    #[schema(value_type = String)]
    pub status: PackStatus,
}

/// Full pack snapshot returned to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct PackSnapshotResponse {
    pub pack_id: Uuid,
    pub company_id: Uuid,
    #[schema(value_type = String)]
    pub pack_type: PackType,
    #[schema(value_type = String)]
    pub status: PackStatus,
    pub site_ids: Vec<Uuid>,
    /// Readiness snapshot captured at request time.
    #[schema(value_type = Object)]
    pub requested_report: ReadinessReport,
    /// Readiness snapshot captured at finalization, if the render
    /// completed.
    #[schema(value_type = Option<Object>)]
    pub finalization_report: Option<ReadinessReport>,
    /// Governance metadata, present once READY.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<PackMetadata>,
    /// Rendered artifact reference, present once READY.
    #[schema(value_type = Option<Object>)]
    pub artifact: Option<PackArtifact>,
    pub failure_reason: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegulatoryPack> for PackSnapshotResponse {
    fn from(pack: RegulatoryPack) -> Self {
        Self {
            pack_id: *pack.id.as_uuid(),
            company_id: *pack.company_id.as_uuid(),
            pack_type: pack.pack_type,
            status: pack.status,
            site_ids: pack.site_ids.iter().map(|site| *site.as_uuid()).collect(),
            requested_report: pack.requested_report,
            finalization_report: pack.finalization_report,
            metadata: pack.metadata,
            artifact: pack.artifact,
            failure_reason: pack.failure_reason,
            expiry_date: pack.expiry_date,
            created_at: pack.created_at,
            updated_at: pack.updated_at,
        }
    }
}

/// Listing query.
#[derive(Debug, Deserialize)]
pub struct ListPacksQuery {
    /// Company whose active packs to list.
    pub company_id: Uuid,
}

/// Render outcome reported by the external job runner.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenderCallbackBody {
    /// `"succeeded"` or `"failed"`.
    pub outcome: String,
    /// Storage reference of the rendered file (success only).
    #[serde(default)]
    pub file_reference: Option<String>,
    /// Hex SHA-256 digest of the rendered file (success only).
    #[serde(default)]
    pub digest: Option<String>,
    /// Failure reason (failure only).
    #[serde(default)]
    pub reason: Option<String>,
}

impl Validate for RenderCallbackBody {
    fn validate(&self) -> Result<(), String> {
        match self.outcome.as_str() {
            "succeeded" => {
                if self.file_reference.as_deref().unwrap_or("").is_empty() {
                    return Err("succeeded outcome requires file_reference".to_string());
                }
                if self.digest.as_deref().unwrap_or("").is_empty() {
                    return Err("succeeded outcome requires digest".to_string());
                }
                Ok(())
            }
            "failed" => {
                if self.reason.as_deref().unwrap_or("").is_empty() {
                    return Err("failed outcome requires reason".to_string());
                }
                Ok(())
            }
            other => Err(format!("outcome must be 'succeeded' or 'failed', got '{other}'")),
        }
    }
}

impl RenderCallbackBody {
    fn into_outcome(self) -> Result<RenderOutcome, AppError> {
        match self.outcome.as_str() {
            "succeeded" => {
                let digest_hex = self.digest.unwrap_or_default();
                let digest = ArtifactDigest::from_hex(&digest_hex)
                    .map_err(|err| AppError::Validation(err.to_string()))?;
                Ok(RenderOutcome::Succeeded {
                    file_reference: self.file_reference.unwrap_or_default(),
                    digest,
                })
            }
            _ => Ok(RenderOutcome::Failed {
                reason: self.reason.unwrap_or_default(),
            }),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the packs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/packs", post(create_pack).get(list_packs))
        .route("/v1/packs/:id", get(get_pack))
        .route("/v1/packs/:id/render-complete", post(render_complete))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/packs — Create a pack; render happens out of band.
#[utoipa::path(
    post,
    path = "/v1/packs",
    request_body = GenerationRequestBody,
    responses(
        (status = 202, description = "Pack record created", body = CreatePackResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "packs"
)]
pub async fn create_pack(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePackResponse>), AppError> {
    let request = extract_validated_json(body)?.into_request()?;

    let adoption = state.data.adoption_for(request.company_id);
    let overrides = state.data.relaxations_for(request.company_id);
    let rule_ctx = RuleContext {
        rules: &state.rules,
        adoption: adoption.as_ref(),
        overrides: &overrides,
    };

    let outcome = state
        .lifecycle
        .create(&request, rule_ctx, state.data.as_ref(), Utc::now())?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreatePackResponse {
            pack_id: *outcome.pack_id.as_uuid(),
            status: outcome.status,
        }),
    ))
}

/// GET /v1/packs/:id — Pack snapshot with lazy expiry applied.
#[utoipa::path(
    get,
    path = "/v1/packs/{id}",
    params(("id" = Uuid, Path, description = "Pack ID")),
    responses(
        (status = 200, description = "Pack snapshot", body = PackSnapshotResponse),
        (status = 404, description = "Pack not found", body = crate::error::ErrorBody),
    ),
    tag = "packs"
)]
pub async fn get_pack(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PackSnapshotResponse>, AppError> {
    let pack_id = PackId::from(id);
    state
        .lifecycle
        .get(pack_id, Utc::now())?
        .map(|pack| Json(PackSnapshotResponse::from(pack)))
        .ok_or_else(|| AppError::NotFound(format!("pack {pack_id} not found")))
}

/// GET /v1/packs — Active packs for a company.
#[utoipa::path(
    get,
    path = "/v1/packs",
    params(("company_id" = Uuid, Query, description = "Company whose active packs to list")),
    responses(
        (status = 200, description = "Active packs, oldest first", body = Vec<PackSnapshotResponse>),
    ),
    tag = "packs"
)]
pub async fn list_packs(
    State(state): State<AppState>,
    Query(query): Query<ListPacksQuery>,
) -> Result<Json<Vec<PackSnapshotResponse>>, AppError> {
    let packs = state
        .lifecycle
        .list_active(CompanyId::from(query.company_id), Utc::now())?;
    Ok(Json(packs.into_iter().map(PackSnapshotResponse::from).collect()))
}

/// POST /v1/packs/:id/render-complete — Render job callback.
#[utoipa::path(
    post,
    path = "/v1/packs/{id}/render-complete",
    params(("id" = Uuid, Path, description = "Pack ID")),
    request_body = RenderCallbackBody,
    responses(
        (status = 200, description = "Pack finalized", body = PackSnapshotResponse),
        (status = 404, description = "Pack not found", body = crate::error::ErrorBody),
        (status = 409, description = "Pack is not GENERATING", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "packs"
)]
pub async fn render_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<RenderCallbackBody>, JsonRejection>,
) -> Result<Json<PackSnapshotResponse>, AppError> {
    let callback = extract_validated_json(body)?;
    let outcome = callback.into_outcome()?;
    let pack_id = PackId::from(id);
    let now = Utc::now();

    let pack = state
        .lifecycle
        .get(pack_id, now)?
        .ok_or_else(|| AppError::NotFound(format!("pack {pack_id} not found")))?;
    if pack.status != PackStatus::Generating {
        return Err(AppError::Conflict(format!(
            "pack {pack_id} is {}, not GENERATING",
            pack.status
        )));
    }

    let metadata_inputs = MetadataInputs {
        assessments: state
            .data
            .assessments_for(&pack.site_ids, pack.configuration.compliance_year),
        board_approval: state.data.board_approval_for(pack.company_id),
        incident_statistics: Some(state.data.incident_statistics()),
        incident_opt_in: state.data.incident_opt_in_for(pack.company_id),
    };

    let adoption = state.data.adoption_for(pack.company_id);
    let overrides = state.data.relaxations_for(pack.company_id);
    let rule_ctx = RuleContext {
        rules: &state.rules,
        adoption: adoption.as_ref(),
        overrides: &overrides,
    };

    let finalized = state.lifecycle.finalize(
        pack_id,
        outcome,
        rule_ctx,
        state.data.as_ref(),
        &metadata_inputs,
        now,
    )?;
    Ok(Json(PackSnapshotResponse::from(finalized)))
}
