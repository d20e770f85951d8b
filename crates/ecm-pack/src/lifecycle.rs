//! # Pack Lifecycle Manager
//!
//! Orchestrates pack creation and finalization around the readiness
//! engine, the render dispatcher, and the audit sink.
//!
//! ## Create
//!
//! A creation request is always recorded — even when blocked. A blocked
//! request produces a pack that lands in `FAILED` immediately, carrying
//! the readiness snapshot that explains why, and no render job is
//! dispatched. The attempt is auditable, not hidden as an error.
//!
//! ## Finalize
//!
//! Data may change while a render job runs, so readiness is re-evaluated
//! at finalization. A pack only reaches `READY` when the render succeeded
//! AND the re-check is clear; the re-check snapshot is persisted either
//! way so callers can distinguish "blocked at request time" from "failed
//! during render".

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecm_core::{
    ArtifactDigest, AuditEvent, AuditSink, CompanyId, ComplianceYear, PackId, SiteId, StateError,
    ValidationError,
};
use ecm_readiness::{
    GenerationRequest, PackType, ReadinessData, ReadinessEngine, ReadinessRule,
};
use ecm_safeguards::{CompanyAdoptionConfig, RelaxedRule};

use crate::metadata::{build_metadata, MetadataInputs};
use crate::pack::{PackArtifact, RegulatoryPack};
use crate::status::PackStatus;

/// How long a completed pack stays valid.
fn validity(pack_type: PackType) -> Duration {
    match pack_type {
        PackType::RegulatorPack | PackType::TenderPack => Duration::days(90),
        PackType::BoardPack => Duration::days(180),
    }
}

// ─── Collaborator traits ─────────────────────────────────────────────

/// Persistence error from the pack store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("pack store error: {0}")]
pub struct StoreError(pub String);

/// Persistence seam for pack records. `insert` and `replace` write the
/// whole record — state and evaluation snapshots land together in one
/// atomic write, never half-applied.
pub trait PackStore: Send + Sync {
    /// Persist a new pack record.
    fn insert(&self, pack: &RegulatoryPack) -> Result<(), StoreError>;

    /// Fetch a pack by id.
    fn get(&self, id: PackId) -> Result<Option<RegulatoryPack>, StoreError>;

    /// Replace an existing pack record.
    fn replace(&self, pack: &RegulatoryPack) -> Result<(), StoreError>;

    /// All pack records.
    fn list(&self) -> Result<Vec<RegulatoryPack>, StoreError>;
}

/// The render job could not be enqueued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("render dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Handle to an enqueued render job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Job identifier assigned by the runner.
    pub id: String,
}

/// What the external renderer needs to produce the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInputs {
    /// The pack being rendered.
    pub pack_id: PackId,
    /// Pack type.
    pub pack_type: PackType,
    /// Sites covered.
    pub site_ids: Vec<SiteId>,
    /// Compliance year reported on.
    pub compliance_year: ComplianceYear,
}

/// Dispatch seam to the external job runner. Queueing and retry are the
/// runner's concern; the engine only reacts to the reported outcome.
pub trait RenderDispatcher: Send + Sync {
    /// Enqueue a render job.
    fn enqueue_render(&self, inputs: RenderInputs) -> Result<JobHandle, DispatchError>;
}

/// Outcome the render job reports back through the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// The artifact was rendered and stored.
    Succeeded {
        /// Storage reference of the rendered file.
        file_reference: String,
        /// SHA-256 digest of the rendered file.
        digest: ArtifactDigest,
    },
    /// Rendering failed.
    Failed {
        /// Why.
        reason: String,
    },
}

// ─── Errors and outcomes ─────────────────────────────────────────────

/// Errors from lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The request was malformed; nothing was evaluated or created.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An illegal state transition was attempted.
    #[error(transparent)]
    State(#[from] StateError),

    /// The pack store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No pack with the given id exists.
    #[error("pack {0} not found")]
    NotFound(PackId),
}

/// Result of a creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOutcome {
    /// The new pack's id — a fresh record for every attempt.
    pub pack_id: PackId,
    /// The state the pack landed in (`GENERATING`, or `FAILED` when
    /// blocked).
    pub status: PackStatus,
}

/// The tenant's current rule configuration, fetched by the caller for
/// one operation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Active readiness rules.
    pub rules: &'a [ReadinessRule],
    /// The company's adoption configuration, if any.
    pub adoption: Option<&'a CompanyAdoptionConfig>,
    /// First-year relaxation overrides.
    pub overrides: &'a [RelaxedRule],
}

// ─── The manager ─────────────────────────────────────────────────────

/// Owns pack state transitions. Stateless between calls apart from its
/// collaborators; concurrent operations on different packs need no
/// coordination.
pub struct PackLifecycleManager {
    engine: ReadinessEngine,
    store: Arc<dyn PackStore>,
    dispatcher: Arc<dyn RenderDispatcher>,
    audit: Arc<dyn AuditSink>,
}

impl PackLifecycleManager {
    /// Assemble a manager from its collaborators.
    pub fn new(
        engine: ReadinessEngine,
        store: Arc<dyn PackStore>,
        dispatcher: Arc<dyn RenderDispatcher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine,
            store,
            dispatcher,
            audit,
        }
    }

    /// The readiness engine, for dry-run evaluation through the same
    /// logic that gates creation.
    pub fn engine(&self) -> &ReadinessEngine {
        &self.engine
    }

    /// Create a pack from a generation request.
    ///
    /// Always creates a new record (regeneration never mutates an
    /// existing pack). Blocked requests land in `FAILED` with their
    /// snapshot; clear requests land in `GENERATING` with a render job
    /// dispatched.
    pub fn create(
        &self,
        request: &GenerationRequest,
        rule_ctx: RuleContext<'_>,
        data: &dyn ReadinessData,
        as_of: DateTime<Utc>,
    ) -> Result<CreateOutcome, LifecycleError> {
        let report = self.engine.evaluate(
            request,
            rule_ctx.rules,
            rule_ctx.adoption,
            rule_ctx.overrides,
            data,
            as_of,
        )?;

        let mut pack = RegulatoryPack::new(request, report, as_of);
        let pack_id = pack.id;

        if !pack.requested_report.can_generate() {
            let failing: Vec<&str> = pack
                .requested_report
                .blocking_failures
                .iter()
                .map(|e| e.rule_key.as_str())
                .collect();
            pack.fail(
                format!("blocked at creation by readiness rules: {}", failing.join(", ")),
                as_of,
            )?;
            self.store.insert(&pack)?;
            self.audit_transition(&pack, "creation blocked by readiness failures");
            return Ok(CreateOutcome {
                pack_id,
                status: pack.status,
            });
        }

        pack.begin_generation(as_of)?;
        self.store.insert(&pack)?;
        self.audit_transition(&pack, "readiness gate passed");

        let inputs = RenderInputs {
            pack_id,
            pack_type: pack.pack_type,
            site_ids: pack.site_ids.clone(),
            compliance_year: pack.configuration.compliance_year,
        };
        match self.dispatcher.enqueue_render(inputs) {
            Ok(job) => {
                tracing::info!(pack = %pack_id, job = %job.id, "render job dispatched");
            }
            Err(err) => {
                // Fail closed: a pack whose render can never start must
                // not sit in GENERATING forever.
                pack.fail(format!("render dispatch failed: {err}"), as_of)?;
                self.store.replace(&pack)?;
                self.audit_transition(&pack, "render dispatch failed");
            }
        }

        Ok(CreateOutcome {
            pack_id,
            status: pack.status,
        })
    }

    /// Finalize a `GENERATING` pack from the render job's reported
    /// outcome. Re-evaluates readiness before completing: a blocking
    /// condition that appeared mid-render fails the pack.
    pub fn finalize(
        &self,
        pack_id: PackId,
        outcome: RenderOutcome,
        rule_ctx: RuleContext<'_>,
        data: &dyn ReadinessData,
        metadata_inputs: &MetadataInputs,
        as_of: DateTime<Utc>,
    ) -> Result<RegulatoryPack, LifecycleError> {
        let mut pack = self
            .store
            .get(pack_id)?
            .ok_or(LifecycleError::NotFound(pack_id))?;

        if pack.status != PackStatus::Generating {
            return Err(StateError::InvalidTransition {
                from: pack.status.to_string(),
                to: "READY/FAILED".to_string(),
            }
            .into());
        }

        let (file_reference, digest) = match outcome {
            RenderOutcome::Failed { reason } => {
                pack.fail(format!("render failed: {reason}"), as_of)?;
                self.store.replace(&pack)?;
                self.audit_transition(&pack, "render failed");
                return Ok(pack);
            }
            RenderOutcome::Succeeded {
                file_reference,
                digest,
            } => (file_reference, digest),
        };

        let recheck = self.engine.evaluate(
            &pack.to_request(),
            rule_ctx.rules,
            rule_ctx.adoption,
            rule_ctx.overrides,
            data,
            as_of,
        )?;
        let recheck_clear = recheck.can_generate();
        let failing: Vec<String> = recheck
            .blocking_failures
            .iter()
            .map(|e| e.rule_key.clone())
            .collect();
        pack.finalization_report = Some(recheck);

        if !recheck_clear {
            pack.fail(
                format!(
                    "readiness re-check failed after render: {}",
                    failing.join(", ")
                ),
                as_of,
            )?;
            self.store.replace(&pack)?;
            self.audit_transition(&pack, "finalization re-check failed");
            return Ok(pack);
        }

        let (metadata, safeguard_notes) = build_metadata(
            pack.pack_type,
            &pack.configuration,
            metadata_inputs,
            as_of,
        );
        for note in &safeguard_notes {
            self.audit.record(
                AuditEvent::now("system", "safeguard.decision", pack.id.to_string())
                    .with_note(note.clone()),
            );
        }

        let artifact = PackArtifact {
            file_reference,
            digest,
        };
        let expiry = as_of + validity(pack.pack_type);
        pack.complete(metadata, artifact, expiry, as_of)?;
        self.store.replace(&pack)?;
        self.audit_transition(&pack, "render complete, re-check clear");

        Ok(pack)
    }

    /// Fetch a pack with lazy expiry applied to the returned view. The
    /// stored record is not mutated; the sweep does that.
    pub fn get(
        &self,
        pack_id: PackId,
        as_of: DateTime<Utc>,
    ) -> Result<Option<RegulatoryPack>, LifecycleError> {
        let Some(mut pack) = self.store.get(pack_id)? else {
            return Ok(None);
        };
        if pack.status == PackStatus::Ready && pack.is_expired_at(as_of) {
            pack.expire(as_of)?;
            self.store.replace(&pack)?;
            self.audit_transition(&pack, "expired on read");
        }
        Ok(Some(pack))
    }

    /// Active packs for a company, oldest first. Expired packs are
    /// excluded by effective status, so a pack past its expiry drops out
    /// of the listing even before the sweep marks it.
    pub fn list_active(
        &self,
        company_id: CompanyId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<RegulatoryPack>, LifecycleError> {
        let mut active: Vec<RegulatoryPack> = self
            .store
            .list()?
            .into_iter()
            .filter(|pack| {
                pack.company_id == company_id && pack.effective_status(as_of).is_active()
            })
            .collect();
        active.sort_by_key(|pack| pack.created_at);
        Ok(active)
    }

    /// Periodic sweep: mark every `READY` pack past its expiry as
    /// `EXPIRED`. Returns how many packs were expired. Never deletes.
    pub fn sweep_expired(&self, as_of: DateTime<Utc>) -> Result<u32, LifecycleError> {
        let mut expired = 0u32;
        for mut pack in self.store.list()? {
            if pack.status == PackStatus::Ready && pack.is_expired_at(as_of) {
                pack.expire(as_of)?;
                self.store.replace(&pack)?;
                self.audit_transition(&pack, "expired by sweep");
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::info!(count = expired, "expired packs swept");
        }
        Ok(expired)
    }

    fn audit_transition(&self, pack: &RegulatoryPack, note: &str) {
        let (before, after) = match pack.transitions.last() {
            Some(transition) => (
                transition.from_status.to_string(),
                transition.to_status.to_string(),
            ),
            None => ("-".to_string(), pack.status.to_string()),
        };
        self.audit.record(
            AuditEvent::now("system", "pack.transition", pack.id.to_string())
                .with_before(before)
                .with_after(after)
                .with_note(note),
        );
    }
}
