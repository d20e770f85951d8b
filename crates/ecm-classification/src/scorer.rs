//! # Classification Scorer
//!
//! Converts the full set of a site's non-compliance records for one
//! compliance year into a [`ClassificationAssessment`]: the weighted
//! total score, the letter band it falls in, and that band's subsistence
//! multiplier.
//!
//! An assessment is only ever produced by a scoring run — it is never
//! partially patched. Re-running the scorer for the same site/year yields
//! a replacement assessment; historical assessments are retained for
//! trend comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{ComplianceYear, SiteId, ValidationError};

use crate::band::{BandCode, BandTable};
use crate::category::CategoryTable;
use crate::record::NonComplianceRecord;

/// Who performed the scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessedBy {
    /// A regulator's compliance officer.
    RegulatorOfficer,
    /// The operator's own self-assessment.
    SelfAssessment,
    /// An accredited third-party auditor.
    ThirdPartyAuditor,
}

impl std::fmt::Display for AssessedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RegulatorOfficer => "regulator_officer",
            Self::SelfAssessment => "self_assessment",
            Self::ThirdPartyAuditor => "third_party_auditor",
        };
        f.write_str(s)
    }
}

/// One scoring run for a site and compliance year.
///
/// `band` and `subsistence_multiplier` are always derived from
/// `total_score` via the band table — never set independently. A `None`
/// band means the configured table could not place the score; packs that
/// require a band treat that as blocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationAssessment {
    /// Site the assessment belongs to.
    pub site_id: SiteId,
    /// Compliance year scored.
    pub compliance_year: ComplianceYear,
    /// Sum of weighted non-compliance points.
    pub total_score: u32,
    /// Derived letter band, if the table places the score.
    pub band: Option<BandCode>,
    /// Multiplier copied from the matched band.
    pub subsistence_multiplier: Option<f64>,
    /// Who performed the run.
    pub assessed_by: AssessedBy,
    /// Reference to an external regulator case, if any.
    pub external_reference: Option<String>,
    /// Deadline for appealing the assessment, if one applies.
    pub appeal_deadline: Option<DateTime<Utc>>,
    /// When the scoring run happened.
    pub assessed_at: DateTime<Utc>,
    /// Number of records the run scored.
    pub record_count: usize,
}

/// Score a site's non-compliance records for one compliance year.
///
/// Every record must belong to the requested site and year; a stray
/// record means the caller fetched the wrong set, and the run is rejected
/// rather than silently filtered.
///
/// A site with zero records scores 0 and receives the band containing 0.
pub fn score(
    site_id: SiteId,
    compliance_year: ComplianceYear,
    records: &[NonComplianceRecord],
    categories: &CategoryTable,
    bands: &BandTable,
    assessed_by: AssessedBy,
) -> Result<ClassificationAssessment, ValidationError> {
    for record in records {
        if record.site_id != site_id {
            return Err(ValidationError(format!(
                "record {} belongs to {}, not {site_id}",
                record.id, record.site_id
            )));
        }
        if record.compliance_year != compliance_year {
            return Err(ValidationError(format!(
                "record {} is for compliance year {}, not {compliance_year}",
                record.id, record.compliance_year
            )));
        }
    }

    let total_score = records.iter().fold(0u32, |sum, record| {
        let mut points = categories.points(record.risk_category);
        if record.is_amenity_breach {
            points = points.saturating_add(categories.amenity_surcharge);
        }
        sum.saturating_add(points)
    });

    let matched = bands.match_score(total_score);
    if matched.is_none() {
        tracing::warn!(
            site = %site_id,
            year = %compliance_year,
            score = total_score,
            table_version = bands.version(),
            "score not covered by band table; assessment left band-less"
        );
    }

    Ok(ClassificationAssessment {
        site_id,
        compliance_year,
        total_score,
        band: matched.map(|row| row.band),
        subsistence_multiplier: matched.map(|row| row.subsistence_multiplier),
        assessed_by,
        external_reference: None,
        appeal_deadline: None,
        assessed_at: Utc::now(),
        record_count: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::RiskCategory;

    fn site() -> SiteId {
        SiteId::new()
    }

    fn year() -> ComplianceYear {
        ComplianceYear::new(2025).unwrap()
    }

    fn breach(site_id: SiteId, category: RiskCategory) -> NonComplianceRecord {
        NonComplianceRecord::new(site_id, year(), category, "4.2.1")
    }

    // ── Core arithmetic ──────────────────────────────────────────────

    #[test]
    fn zero_records_scores_zero_and_best_band() {
        let assessment = score(
            site(),
            year(),
            &[],
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        )
        .unwrap();
        assert_eq!(assessment.total_score, 0);
        assert_eq!(assessment.band, Some(BandCode::A));
        assert_eq!(assessment.subsistence_multiplier, Some(0.95));
        assert_eq!(assessment.record_count, 0);
    }

    #[test]
    fn category_points_sum() {
        // One category-1 (40) plus one category-3 (10) across band table
        // A:[0,9] B:[10,29] C:[30,59] places the site at 50 in band C.
        let site_id = site();
        let records = vec![
            breach(site_id, RiskCategory::Category1),
            breach(site_id, RiskCategory::Category3),
        ];
        let assessment = score(
            site_id,
            year(),
            &records,
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        )
        .unwrap();
        assert_eq!(assessment.total_score, 50);
        assert_eq!(assessment.band, Some(BandCode::C));
    }

    #[test]
    fn amenity_breach_adds_surcharge() {
        let site_id = site();
        let records = vec![breach(site_id, RiskCategory::Category3).with_amenity_impact()];
        let assessment = score(
            site_id,
            year(),
            &records,
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::SelfAssessment,
        )
        .unwrap();
        // 10 category points + 5 amenity surcharge.
        assert_eq!(assessment.total_score, 15);
        assert_eq!(assessment.band, Some(BandCode::B));
    }

    // ── Input validation ─────────────────────────────────────────────

    #[test]
    fn record_for_other_site_rejected() {
        let records = vec![breach(site(), RiskCategory::Category2)];
        let result = score(
            site(),
            year(),
            &records,
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        );
        assert!(result.is_err());
    }

    #[test]
    fn record_for_other_year_rejected() {
        let site_id = site();
        let mut record = breach(site_id, RiskCategory::Category2);
        record.compliance_year = ComplianceYear::new(2024).unwrap();
        let result = score(
            site_id,
            year(),
            &[record],
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        );
        assert!(result.is_err());
    }

    // ── Fail-closed band lookup ──────────────────────────────────────

    #[test]
    fn band_derived_from_score_never_independent() {
        let site_id = site();
        let records = vec![
            breach(site_id, RiskCategory::Category1).with_amenity_impact(),
            breach(site_id, RiskCategory::Category1),
            breach(site_id, RiskCategory::Category1),
        ];
        let assessment = score(
            site_id,
            year(),
            &records,
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::ThirdPartyAuditor,
        )
        .unwrap();
        // 40 + 5 + 40 + 40 = 125 -> band E.
        assert_eq!(assessment.total_score, 125);
        assert_eq!(assessment.band, Some(BandCode::E));
        assert_eq!(assessment.subsistence_multiplier, Some(1.5));
    }
}
