//! # The Regulatory Pack Record
//!
//! A pack carries two immutable readiness snapshots: the report captured
//! at request time (why generation was or wasn't allowed to start) and
//! the report captured at finalization (why it ultimately succeeded or
//! failed). Neither is ever recomputed retroactively — rule definitions
//! drift, pack history must not.
//!
//! Transitions go through the state-checked methods below; setting
//! `status` directly is not part of the public surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{ArtifactDigest, CompanyId, DocumentId, PackId, SiteId, StateError};
use ecm_readiness::{GenerationRequest, PackConfiguration, PackType, ReadinessReport};

use crate::metadata::PackMetadata;
use crate::status::{PackStatus, PackTransitionRecord};

/// Reference to the rendered artifact, as reported by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackArtifact {
    /// Storage reference of the rendered file.
    pub file_reference: String,
    /// SHA-256 digest of the rendered file.
    pub digest: ArtifactDigest,
}

/// A regulator/board/tender-facing evidence bundle with its own
/// lifecycle and governance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryPack {
    /// Pack identifier.
    pub id: PackId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Pack type.
    pub pack_type: PackType,
    /// Sites the pack covers.
    pub site_ids: Vec<SiteId>,
    /// Documents referenced by the original request.
    pub document_ids: Vec<DocumentId>,
    /// Current lifecycle state.
    pub status: PackStatus,
    /// Safeguard parameters from the request.
    pub configuration: PackConfiguration,
    /// Readiness snapshot captured at request time.
    pub requested_report: ReadinessReport,
    /// Readiness snapshot captured at finalization, once the render
    /// completed.
    pub finalization_report: Option<ReadinessReport>,
    /// Assembled metadata, present once `READY`.
    pub metadata: Option<PackMetadata>,
    /// Rendered artifact reference, present once `READY`.
    pub artifact: Option<PackArtifact>,
    /// Why the pack failed, when it did.
    pub failure_reason: Option<String>,
    /// When a `READY` pack stops being valid.
    pub expiry_date: Option<DateTime<Utc>>,
    /// When the pack record was created.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
    /// Ordered log of all state transitions.
    pub transitions: Vec<PackTransitionRecord>,
}

impl RegulatoryPack {
    /// Create a new pack in `DRAFT` carrying the request-time readiness
    /// snapshot. Every generation attempt gets its own record — packs
    /// are never reused.
    pub fn new(
        request: &GenerationRequest,
        requested_report: ReadinessReport,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PackId::new(),
            company_id: request.company_id,
            pack_type: request.pack_type,
            site_ids: request.site_ids.clone(),
            document_ids: request.document_ids.clone(),
            status: PackStatus::Draft,
            configuration: request.configuration.clone(),
            requested_report,
            finalization_report: None,
            metadata: None,
            artifact: None,
            failure_reason: None,
            expiry_date: None,
            created_at: at,
            updated_at: at,
            transitions: Vec::new(),
        }
    }

    /// Reconstruct the generation request this pack was created from,
    /// for the finalization re-check.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            company_id: self.company_id,
            pack_type: self.pack_type,
            site_ids: self.site_ids.clone(),
            document_ids: self.document_ids.clone(),
            configuration: self.configuration.clone(),
        }
    }

    /// Start the render phase (DRAFT → GENERATING).
    pub fn begin_generation(&mut self, at: DateTime<Utc>) -> Result<(), StateError> {
        self.require_status(PackStatus::Draft, PackStatus::Generating)?;
        self.do_transition(PackStatus::Generating, "readiness gate passed", at);
        Ok(())
    }

    /// Fail the pack (DRAFT → FAILED at creation, GENERATING → FAILED
    /// on render error or re-check failure).
    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(StateError::TerminalState {
                state: self.status.to_string(),
            });
        }
        if !matches!(self.status, PackStatus::Draft | PackStatus::Generating) {
            return Err(StateError::InvalidTransition {
                from: self.status.to_string(),
                to: PackStatus::Failed.to_string(),
            });
        }
        let reason = reason.into();
        self.failure_reason = Some(reason.clone());
        self.do_transition(PackStatus::Failed, &reason, at);
        Ok(())
    }

    /// Complete the pack (GENERATING → READY) with its assembled
    /// metadata, the rendered artifact, and an expiry date.
    pub fn complete(
        &mut self,
        metadata: PackMetadata,
        artifact: PackArtifact,
        expiry_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        self.require_status(PackStatus::Generating, PackStatus::Ready)?;
        self.metadata = Some(metadata);
        self.artifact = Some(artifact);
        self.expiry_date = Some(expiry_date);
        self.do_transition(PackStatus::Ready, "render complete, re-check clear", at);
        Ok(())
    }

    /// Soft-expire the pack (READY → EXPIRED). Never deletes anything.
    pub fn expire(&mut self, at: DateTime<Utc>) -> Result<(), StateError> {
        self.require_status(PackStatus::Ready, PackStatus::Expired)?;
        self.do_transition(PackStatus::Expired, "validity window elapsed", at);
        Ok(())
    }

    /// The status a reader should see at `as_of`: a `READY` pack past
    /// its expiry date reads as `EXPIRED` even before the sweep has
    /// marked it.
    pub fn effective_status(&self, as_of: DateTime<Utc>) -> PackStatus {
        if self.status == PackStatus::Ready {
            if let Some(expiry) = self.expiry_date {
                if as_of >= expiry {
                    return PackStatus::Expired;
                }
            }
        }
        self.status
    }

    /// Whether the pack is past its expiry date at `as_of`.
    pub fn is_expired_at(&self, as_of: DateTime<Utc>) -> bool {
        self.effective_status(as_of) == PackStatus::Expired
    }

    fn require_status(&self, expected: PackStatus, target: PackStatus) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(StateError::TerminalState {
                state: self.status.to_string(),
            });
        }
        if self.status != expected {
            return Err(StateError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: PackStatus, reason: &str, at: DateTime<Utc>) {
        self.transitions.push(PackTransitionRecord {
            from_status: self.status,
            to_status: to,
            occurred_at: at,
            reason: reason.to_string(),
        });
        self.status = to;
        self.updated_at = at;
    }
}
