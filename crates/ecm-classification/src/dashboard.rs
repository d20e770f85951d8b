//! # Classification Dashboard Aggregation
//!
//! Builds the read-model behind the classification dashboard operation:
//! current band/score, trend, breakdown of non-compliances by category,
//! and remediation counts, over a caller-selected set of sites.
//!
//! Aggregation policy: the headline score/band/multiplier come from the
//! worst-scoring selected site (conservative for downstream fee and risk
//! consumers); the category breakdown and remediation counts aggregate
//! across every selected site; the trend compares the worst site's score
//! to its own prior-year assessment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::band::BandCode;
use crate::category::RiskCategory;
use crate::record::NonComplianceRecord;
use crate::scorer::ClassificationAssessment;
use crate::trend::ComplianceTrend;

/// Everything the dashboard needs, already fetched for the selected
/// sites. The builder itself is a pure function.
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    /// Current-year assessments, one per selected site that has one.
    pub current: Vec<ClassificationAssessment>,
    /// Prior-year assessments for the same sites.
    pub prior: Vec<ClassificationAssessment>,
    /// Current-year non-compliance records across the selected sites.
    pub records: Vec<NonComplianceRecord>,
    /// Corrective actions still open across the selected sites.
    pub open_remediations: u32,
    /// Of the open corrective actions, those past their due date.
    pub overdue_remediations: u32,
}

/// The dashboard read-model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDashboard {
    /// Worst current band across the selected sites, if any site has a
    /// current assessment with a band.
    pub current_band: Option<BandCode>,
    /// The worst-scoring site's current score.
    pub current_score: u32,
    /// Multiplier of the worst-scoring site's band.
    pub subsistence_multiplier: Option<f64>,
    /// Year-over-year trajectory of the worst-scoring site.
    pub trend: ComplianceTrend,
    /// Breach counts per risk category across the selected sites.
    pub non_compliances_by_category: BTreeMap<RiskCategory, u32>,
    /// Open corrective actions across the selected sites.
    pub open_remediations: u32,
    /// Overdue corrective actions across the selected sites.
    pub overdue_remediations: u32,
}

/// Aggregate the dashboard from pre-fetched inputs.
pub fn build_dashboard(inputs: DashboardInputs) -> ClassificationDashboard {
    let worst = inputs
        .current
        .iter()
        .max_by_key(|assessment| assessment.total_score);

    let trend = match worst {
        Some(current) => {
            let prior = inputs
                .prior
                .iter()
                .find(|prior| prior.site_id == current.site_id);
            ComplianceTrend::classify(current, prior)
        }
        None => ComplianceTrend::New,
    };

    let mut by_category: BTreeMap<RiskCategory, u32> = BTreeMap::new();
    for record in &inputs.records {
        *by_category.entry(record.risk_category).or_insert(0) += 1;
    }

    ClassificationDashboard {
        current_band: worst.and_then(|assessment| assessment.band),
        current_score: worst.map(|assessment| assessment.total_score).unwrap_or(0),
        subsistence_multiplier: worst.and_then(|assessment| assessment.subsistence_multiplier),
        trend,
        non_compliances_by_category: by_category,
        open_remediations: inputs.open_remediations,
        overdue_remediations: inputs.overdue_remediations,
    }
}
