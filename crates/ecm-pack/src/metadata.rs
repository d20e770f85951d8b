//! # Pack Metadata Assembly
//!
//! Builds the metadata embedded in a finalized pack: per-site
//! classification summaries, the effective board detail level, and the
//! incident disclosure the tender opt-in permits. Safeguard policies are
//! applied here — each independently, with its decision folded into the
//! metadata and surfaced as a note for the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_classification::{BandCode, ClassificationAssessment};
use ecm_core::{ComplianceYear, SiteId};
use ecm_readiness::{PackConfiguration, PackType};
use ecm_safeguards::{
    disclose_incidents, resolve_detail_level, BoardPackDetailRequest, IncidentDisclosure,
    IncidentStatistics, PackDetailLevel, TenderPackIncidentOptIn,
};

/// Per-site classification figures embedded in a pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    /// The site summarized.
    pub site_id: SiteId,
    /// Compliance year of the assessment.
    pub compliance_year: ComplianceYear,
    /// Total weighted score.
    pub total_score: u32,
    /// Letter band, if the table placed the score.
    pub band: Option<BandCode>,
    /// Band-derived subsistence multiplier.
    pub subsistence_multiplier: Option<f64>,
}

impl From<&ClassificationAssessment> for ClassificationSummary {
    fn from(assessment: &ClassificationAssessment) -> Self {
        Self {
            site_id: assessment.site_id,
            compliance_year: assessment.compliance_year,
            total_score: assessment.total_score,
            band: assessment.band,
            subsistence_multiplier: assessment.subsistence_multiplier,
        }
    }
}

/// Everything metadata assembly needs, fetched by the caller.
#[derive(Debug, Clone, Default)]
pub struct MetadataInputs {
    /// Current assessments for the pack's sites.
    pub assessments: Vec<ClassificationAssessment>,
    /// Standing board detail approval, if any.
    pub board_approval: Option<BoardPackDetailRequest>,
    /// Incident statistics for the pack's sites, if fetched.
    pub incident_statistics: Option<IncidentStatistics>,
    /// Standing tender incident opt-in, if any.
    pub incident_opt_in: Option<TenderPackIncidentOptIn>,
}

/// The governance metadata snapshot carried by a finalized pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Effective detail level (board packs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_level: Option<PackDetailLevel>,
    /// Whether the requested detail level was downgraded.
    pub detail_downgraded: bool,
    /// Per-site classification summaries.
    pub classification: Vec<ClassificationSummary>,
    /// Incident fields the tender opt-in permits; absent entirely
    /// without an opt-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_disclosure: Option<IncidentDisclosure>,
    /// When the metadata was assembled.
    pub generated_at: DateTime<Utc>,
}

/// Assemble pack metadata, applying the safeguard policies.
///
/// Returns the metadata plus the safeguard notes to be written to the
/// audit trail. Safeguard outcomes never fail assembly — they narrow
/// what the metadata carries.
pub fn build_metadata(
    pack_type: PackType,
    configuration: &PackConfiguration,
    inputs: &MetadataInputs,
    as_of: DateTime<Utc>,
) -> (PackMetadata, Vec<String>) {
    let mut notes = Vec::new();

    let (detail_level, detail_downgraded) = match pack_type {
        PackType::BoardPack => {
            let requested = configuration
                .detail_level
                .unwrap_or(PackDetailLevel::Summary);
            let decision = resolve_detail_level(requested, inputs.board_approval.as_ref());
            if let Some(note) = &decision.note {
                notes.push(note.clone());
            }
            (Some(decision.effective), decision.downgraded)
        }
        PackType::RegulatorPack | PackType::TenderPack => (None, false),
    };

    let incident_disclosure = if pack_type == PackType::TenderPack
        && configuration.include_incident_statistics
    {
        let empty = IncidentStatistics::from_incidents(vec![]);
        let statistics = inputs.incident_statistics.as_ref().unwrap_or(&empty);
        let disclosure = disclose_incidents(statistics, inputs.incident_opt_in.as_ref());
        if disclosure.is_none() {
            notes.push(
                "incident statistics omitted: no disclosure opt-in on file".to_string(),
            );
        }
        disclosure
    } else {
        None
    };

    let metadata = PackMetadata {
        detail_level,
        detail_downgraded,
        classification: inputs.assessments.iter().map(Into::into).collect(),
        incident_disclosure,
        generated_at: as_of,
    };
    (metadata, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ecm_classification::{score, AssessedBy, BandTable, CategoryTable};
    use ecm_core::CompanyId;
    use ecm_safeguards::{IncidentDisclosureLevel, IncidentSeverity, IncidentSummary};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn config(
        detail_level: Option<PackDetailLevel>,
        include_incident_statistics: bool,
    ) -> PackConfiguration {
        PackConfiguration {
            compliance_year: ComplianceYear::new(2025).unwrap(),
            detail_level,
            include_incident_statistics,
        }
    }

    fn assessment() -> ClassificationAssessment {
        score(
            SiteId::new(),
            ComplianceYear::new(2025).unwrap(),
            &[],
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        )
        .unwrap()
    }

    fn statistics() -> IncidentStatistics {
        IncidentStatistics::from_incidents(vec![
            IncidentSummary {
                id: ecm_core::IncidentId::new(),
                severity: IncidentSeverity::High,
                occurred_at: at(2026, 2, 1),
                description: "effluent discharge exceedance".to_string(),
            },
            IncidentSummary {
                id: ecm_core::IncidentId::new(),
                severity: IncidentSeverity::Low,
                occurred_at: at(2026, 3, 1),
                description: "late monitoring return".to_string(),
            },
        ])
    }

    fn opt_in(level: IncidentDisclosureLevel) -> TenderPackIncidentOptIn {
        TenderPackIncidentOptIn {
            company_id: CompanyId::new(),
            disclosure_level: level,
            justification: "tender disclosure schedule".to_string(),
            recorded_by: "compliance.lead".to_string(),
            recorded_at: at(2026, 5, 1),
        }
    }

    // ── Board detail safeguard ───────────────────────────────────────

    #[test]
    fn detailed_board_pack_without_approval_downgrades_to_summary() {
        let inputs = MetadataInputs {
            assessments: vec![assessment()],
            ..Default::default()
        };
        let (metadata, notes) = build_metadata(
            PackType::BoardPack,
            &config(Some(PackDetailLevel::Detailed), false),
            &inputs,
            at(2026, 6, 1),
        );
        assert_eq!(metadata.detail_level, Some(PackDetailLevel::Summary));
        assert!(metadata.detail_downgraded);
        assert_eq!(notes.len(), 1);
        // Generation still succeeded — we produced metadata.
        assert_eq!(metadata.classification.len(), 1);
    }

    #[test]
    fn detailed_board_pack_with_approval_keeps_level() {
        let inputs = MetadataInputs {
            board_approval: Some(BoardPackDetailRequest {
                company_id: CompanyId::new(),
                requested_by: "ops".to_string(),
                approved_by: "secretary".to_string(),
                approved_level: PackDetailLevel::Detailed,
                justification: "quarterly deep-dive".to_string(),
                approved_at: at(2026, 5, 1),
            }),
            ..Default::default()
        };
        let (metadata, notes) = build_metadata(
            PackType::BoardPack,
            &config(Some(PackDetailLevel::Detailed), false),
            &inputs,
            at(2026, 6, 1),
        );
        assert_eq!(metadata.detail_level, Some(PackDetailLevel::Detailed));
        assert!(!metadata.detail_downgraded);
        assert!(notes.is_empty());
    }

    #[test]
    fn regulator_pack_carries_no_detail_level() {
        let (metadata, _) = build_metadata(
            PackType::RegulatorPack,
            &config(Some(PackDetailLevel::Detailed), false),
            &MetadataInputs::default(),
            at(2026, 6, 1),
        );
        assert_eq!(metadata.detail_level, None);
    }

    // ── Tender incident safeguard ────────────────────────────────────

    #[test]
    fn tender_pack_without_opt_in_omits_incident_fields() {
        let inputs = MetadataInputs {
            incident_statistics: Some(statistics()),
            ..Default::default()
        };
        let (metadata, notes) = build_metadata(
            PackType::TenderPack,
            &config(None, true),
            &inputs,
            at(2026, 6, 1),
        );
        assert!(metadata.incident_disclosure.is_none());
        assert!(notes.iter().any(|n| n.contains("no disclosure opt-in")));
        // Absent entirely from the serialized snapshot, not redacted.
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("incident_disclosure").is_none());
    }

    #[test]
    fn tender_pack_with_severity_breakdown_excludes_raw_incidents() {
        let inputs = MetadataInputs {
            incident_statistics: Some(statistics()),
            incident_opt_in: Some(opt_in(IncidentDisclosureLevel::SeverityBreakdown)),
            ..Default::default()
        };
        let (metadata, _) = build_metadata(
            PackType::TenderPack,
            &config(None, true),
            &inputs,
            at(2026, 6, 1),
        );
        let disclosure = metadata.incident_disclosure.unwrap();
        assert_eq!(disclosure.total_incidents, 2);
        assert!(disclosure.by_severity.is_some());
        assert!(disclosure.incidents.is_none());
    }

    #[test]
    fn tender_pack_not_requesting_incidents_skips_the_policy() {
        let inputs = MetadataInputs {
            incident_statistics: Some(statistics()),
            incident_opt_in: Some(opt_in(IncidentDisclosureLevel::FullDetail)),
            ..Default::default()
        };
        let (metadata, notes) = build_metadata(
            PackType::TenderPack,
            &config(None, false),
            &inputs,
            at(2026, 6, 1),
        );
        assert!(metadata.incident_disclosure.is_none());
        assert!(notes.is_empty());
    }

    // ── Classification embedding ─────────────────────────────────────

    #[test]
    fn classification_summaries_come_from_assessments() {
        let a = assessment();
        let inputs = MetadataInputs {
            assessments: vec![a.clone()],
            ..Default::default()
        };
        let (metadata, _) = build_metadata(
            PackType::RegulatorPack,
            &config(None, false),
            &inputs,
            at(2026, 6, 1),
        );
        assert_eq!(metadata.classification.len(), 1);
        assert_eq!(metadata.classification[0].site_id, a.site_id);
        assert_eq!(metadata.classification[0].band, a.band);
    }
}
