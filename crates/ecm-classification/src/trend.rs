//! # Year-over-Year Trend
//!
//! Pure comparison of a site's current assessment against the prior
//! year's. Exposed for dashboard consumption; never used in gating.

use serde::{Deserialize, Serialize};

use crate::scorer::ClassificationAssessment;

/// Direction of a site's compliance trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTrend {
    /// No prior-year assessment to compare against.
    New,
    /// Score decreased (fewer/less severe breaches).
    Improving,
    /// Score unchanged.
    Stable,
    /// Score increased.
    Declining,
}

impl ComplianceTrend {
    /// Classify the trajectory from current and prior assessments.
    pub fn classify(
        current: &ClassificationAssessment,
        prior: Option<&ClassificationAssessment>,
    ) -> Self {
        match prior {
            None => Self::New,
            Some(prior) => match current.total_score.cmp(&prior.total_score) {
                std::cmp::Ordering::Less => Self::Improving,
                std::cmp::Ordering::Equal => Self::Stable,
                std::cmp::Ordering::Greater => Self::Declining,
            },
        }
    }
}

impl std::fmt::Display for ComplianceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandTable;
    use crate::category::CategoryTable;
    use crate::scorer::{score, AssessedBy};
    use ecm_core::{ComplianceYear, SiteId};

    fn assessment_with_score(site_id: SiteId, year: i32, target: u32) -> ClassificationAssessment {
        let mut assessment = score(
            site_id,
            ComplianceYear::new(year).unwrap(),
            &[],
            &CategoryTable::standard(),
            &BandTable::standard(),
            AssessedBy::RegulatorOfficer,
        )
        .unwrap();
        assessment.total_score = target;
        assessment
    }

    #[test]
    fn no_prior_is_new() {
        let site = SiteId::new();
        let current = assessment_with_score(site, 2025, 10);
        assert_eq!(ComplianceTrend::classify(&current, None), ComplianceTrend::New);
    }

    #[test]
    fn decrease_is_improving() {
        let site = SiteId::new();
        let current = assessment_with_score(site, 2025, 10);
        let prior = assessment_with_score(site, 2024, 30);
        assert_eq!(
            ComplianceTrend::classify(&current, Some(&prior)),
            ComplianceTrend::Improving
        );
    }

    #[test]
    fn equal_is_stable() {
        let site = SiteId::new();
        let current = assessment_with_score(site, 2025, 30);
        let prior = assessment_with_score(site, 2024, 30);
        assert_eq!(
            ComplianceTrend::classify(&current, Some(&prior)),
            ComplianceTrend::Stable
        );
    }

    #[test]
    fn increase_is_declining() {
        let site = SiteId::new();
        let current = assessment_with_score(site, 2025, 45);
        let prior = assessment_with_score(site, 2024, 30);
        assert_eq!(
            ComplianceTrend::classify(&current, Some(&prior)),
            ComplianceTrend::Declining
        );
    }
}
