//! # Tender-Pack Incident Disclosure
//!
//! Including incident statistics in a tender pack requires an explicit,
//! justified opt-in recorded before generation. The opted-in level
//! determines exactly which fields may be copied into the pack's
//! metadata. No opt-in means incident data is omitted entirely — never
//! redacted in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{CompanyId, IncidentId};

/// Severity of a recorded incident.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One incident as held by the incident register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    /// Incident identifier.
    pub id: IncidentId,
    /// Assessed severity.
    pub severity: IncidentSeverity,
    /// When the incident occurred.
    pub occurred_at: DateTime<Utc>,
    /// Short description of what happened.
    pub description: String,
}

/// Incident statistics for a company's selected sites, as fetched from
/// the incident register before disclosure filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentStatistics {
    /// Total incident count.
    pub total_incidents: u32,
    /// Counts per severity.
    pub by_severity: BTreeMap<IncidentSeverity, u32>,
    /// The underlying incident records.
    pub incidents: Vec<IncidentSummary>,
}

impl IncidentStatistics {
    /// Build statistics from raw incident records.
    pub fn from_incidents(incidents: Vec<IncidentSummary>) -> Self {
        let mut by_severity: BTreeMap<IncidentSeverity, u32> = BTreeMap::new();
        for incident in &incidents {
            *by_severity.entry(incident.severity).or_insert(0) += 1;
        }
        Self {
            total_incidents: incidents.len() as u32,
            by_severity,
            incidents,
        }
    }
}

/// Granularity of incident disclosure the company has opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentDisclosureLevel {
    /// Aggregate counts only.
    AggregateCounts,
    /// Aggregate counts plus per-severity buckets.
    SeverityBreakdown,
    /// Full incident records.
    FullDetail,
}

impl std::fmt::Display for IncidentDisclosureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AggregateCounts => "AGGREGATE_COUNTS",
            Self::SeverityBreakdown => "SEVERITY_BREAKDOWN",
            Self::FullDetail => "FULL_DETAIL",
        };
        f.write_str(s)
    }
}

/// Append-only opt-in record authorizing incident disclosure in tender
/// packs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderPackIncidentOptIn {
    /// The company opting in.
    pub company_id: CompanyId,
    /// Granularity opted into.
    pub disclosure_level: IncidentDisclosureLevel,
    /// Why the disclosure is being made.
    pub justification: String,
    /// Who recorded the opt-in.
    pub recorded_by: String,
    /// When the opt-in was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// The incident fields a pack is permitted to carry, post-filtering.
///
/// Fields that the opted-in level does not cover are `None` — serialized
/// output omits them rather than carrying redacted placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDisclosure {
    /// The level the disclosure was made at.
    pub level: IncidentDisclosureLevel,
    /// Total incident count. Present at every level.
    pub total_incidents: u32,
    /// Per-severity buckets. Present from `SeverityBreakdown` up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_severity: Option<BTreeMap<IncidentSeverity, u32>>,
    /// Raw incident records. Present only at `FullDetail`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incidents: Option<Vec<IncidentSummary>>,
}

/// Filter incident statistics down to what the opt-in permits.
///
/// `None` opt-in yields `None` — the pack carries no incident fields at
/// all.
pub fn disclose_incidents(
    statistics: &IncidentStatistics,
    opt_in: Option<&TenderPackIncidentOptIn>,
) -> Option<IncidentDisclosure> {
    let opt_in = opt_in?;
    let disclosure = match opt_in.disclosure_level {
        IncidentDisclosureLevel::AggregateCounts => IncidentDisclosure {
            level: IncidentDisclosureLevel::AggregateCounts,
            total_incidents: statistics.total_incidents,
            by_severity: None,
            incidents: None,
        },
        IncidentDisclosureLevel::SeverityBreakdown => IncidentDisclosure {
            level: IncidentDisclosureLevel::SeverityBreakdown,
            total_incidents: statistics.total_incidents,
            by_severity: Some(statistics.by_severity.clone()),
            incidents: None,
        },
        IncidentDisclosureLevel::FullDetail => IncidentDisclosure {
            level: IncidentDisclosureLevel::FullDetail,
            total_incidents: statistics.total_incidents,
            by_severity: Some(statistics.by_severity.clone()),
            incidents: Some(statistics.incidents.clone()),
        },
    };
    tracing::info!(
        company = %opt_in.company_id,
        level = %opt_in.disclosure_level,
        total = statistics.total_incidents,
        "incident disclosure applied"
    );
    Some(disclosure)
}
