//! # Readiness Data Access
//!
//! The collaborator-implemented interface the rule checks read through.
//! The engine never touches storage directly; it sees status summaries
//! with the timestamps the checks compare against their lookback windows.
//!
//! A [`DataError`] from any method means a dependency the check needs is
//! unavailable. The engine converts that into a synthetic blocking
//! failure naming the dependency — an engine that cannot prove readiness
//! must not report readiness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecm_classification::BandCode;
use ecm_core::{DocumentId, ObligationId, RemediationId, SiteId};

/// A data dependency could not be reached or returned an invalid result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency '{dependency}' unavailable: {message}")]
pub struct DataError {
    /// The dependency that failed (e.g. `obligation-register`).
    pub dependency: String,
    /// What went wrong.
    pub message: String,
}

impl DataError {
    /// Build an error naming the failing dependency.
    pub fn unavailable(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
            message: message.into(),
        }
    }
}

/// An active permit obligation and when evidence was last linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationStatus {
    /// Obligation identifier.
    pub id: ObligationId,
    /// Site the obligation belongs to.
    pub site_id: SiteId,
    /// Permit condition the obligation derives from.
    pub condition_reference: String,
    /// Most recent linked evidence item, if any.
    pub last_evidence_at: Option<DateTime<Utc>>,
}

/// An open corrective action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationStatus {
    /// Remediation identifier.
    pub id: RemediationId,
    /// Site the corrective action belongs to.
    pub site_id: SiteId,
    /// When the corrective action was opened.
    pub opened_at: DateTime<Utc>,
    /// Due date, if one was set.
    pub due_at: Option<DateTime<Utc>>,
}

/// The most recent classification assessment for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentStatus {
    /// Site the assessment belongs to.
    pub site_id: SiteId,
    /// When the scoring run happened.
    pub assessed_at: DateTime<Utc>,
    /// The band the run produced, if the table placed the score.
    pub band: Option<BandCode>,
}

/// Extraction state of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatus {
    /// Document identifier.
    pub id: DocumentId,
    /// Whether obligation extraction has completed for the document.
    pub extraction_complete: bool,
}

/// Permit state of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitStatus {
    /// The permitted site.
    pub site_id: SiteId,
    /// Permit reference.
    pub reference: String,
    /// Whether the permit is currently active.
    pub active: bool,
}

/// Read-only snapshot access for the rule checks. Implemented by the
/// platform's data layer; the in-memory implementation in the API crate
/// is the reference.
pub trait ReadinessData: Send + Sync {
    /// Active obligations across the given sites.
    fn active_obligations(&self, sites: &[SiteId]) -> Result<Vec<ObligationStatus>, DataError>;

    /// Corrective actions still open across the given sites.
    fn open_remediations(&self, sites: &[SiteId]) -> Result<Vec<RemediationStatus>, DataError>;

    /// The most recent classification assessment for a site, if any.
    fn latest_assessment(&self, site: SiteId) -> Result<Option<AssessmentStatus>, DataError>;

    /// Extraction state for the given documents.
    fn document_statuses(&self, documents: &[DocumentId]) -> Result<Vec<DocumentStatus>, DataError>;

    /// Permit state for the given sites.
    fn site_permits(&self, sites: &[SiteId]) -> Result<Vec<PermitStatus>, DataError>;
}
