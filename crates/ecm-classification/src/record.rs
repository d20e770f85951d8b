//! # Non-Compliance Records
//!
//! One record per breach of a permit condition. Records are part of the
//! compliance audit trail: immutable once attached to a finalized
//! assessment, and never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{ComplianceYear, EvidenceId, SiteId};
use uuid::Uuid;

use crate::category::RiskCategory;

/// A recorded breach of a specific permit condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonComplianceRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Site the breach was recorded against.
    pub site_id: SiteId,
    /// Compliance year the breach counts toward.
    pub compliance_year: ComplianceYear,
    /// Severity category (1 = most severe).
    pub risk_category: RiskCategory,
    /// The permit condition breached (e.g. `"4.2.1"`).
    pub condition_reference: String,
    /// Whether the breach had amenity impact (odour, noise, dust).
    pub is_amenity_breach: bool,
    /// How long the breach persisted.
    pub breach_duration_days: u32,
    /// Supporting evidence items.
    pub evidence_ids: Vec<EvidenceId>,
    /// When the breach was recorded by an assessor or automated check.
    pub recorded_at: DateTime<Utc>,
}

impl NonComplianceRecord {
    /// Convenience constructor for a breach recorded now.
    pub fn new(
        site_id: SiteId,
        compliance_year: ComplianceYear,
        risk_category: RiskCategory,
        condition_reference: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            compliance_year,
            risk_category,
            condition_reference: condition_reference.into(),
            is_amenity_breach: false,
            breach_duration_days: 0,
            evidence_ids: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Mark the breach as having amenity impact.
    pub fn with_amenity_impact(mut self) -> Self {
        self.is_amenity_breach = true;
        self
    }
}
