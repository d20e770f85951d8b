//! # Board-Pack Detail Level
//!
//! Board packs can carry three levels of detail. `DETAILED` content —
//! named sites, individual breaches — requires a standing approval
//! record. Absent approval the effective level silently downgrades; the
//! generation itself is never failed. Detail scope, not generation
//! eligibility, is what this policy gates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::CompanyId;

/// How much detail a board pack exposes. Ordered from least to most
/// disclosure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PackDetailLevel {
    /// Headline figures only.
    Summary,
    /// Aggregated statistics without site attribution.
    Aggregated,
    /// Full detail including per-site breach narratives.
    Detailed,
}

impl std::fmt::Display for PackDetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Summary => "SUMMARY",
            Self::Aggregated => "AGGREGATED",
            Self::Detailed => "DETAILED",
        };
        f.write_str(s)
    }
}

/// Append-only approval record authorizing a detail level for a
/// company's board packs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPackDetailRequest {
    /// The company the approval covers.
    pub company_id: CompanyId,
    /// Who asked for the elevated detail level.
    pub requested_by: String,
    /// Who approved it.
    pub approved_by: String,
    /// The highest level approved.
    pub approved_level: PackDetailLevel,
    /// Why the elevated detail is needed.
    pub justification: String,
    /// When the approval was granted.
    pub approved_at: DateTime<Utc>,
}

/// Outcome of resolving a requested detail level against the standing
/// approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailDecision {
    /// The level the pack will actually be generated at.
    pub effective: PackDetailLevel,
    /// Whether the requested level was downgraded.
    pub downgraded: bool,
    /// Informational note recorded when a downgrade happens.
    pub note: Option<String>,
}

/// Resolve the effective detail level for a board pack.
///
/// The effective level is capped at the approved level; with no approval
/// on file, anything above `Summary` downgrades to `Summary`. Downgrades
/// are informational — generation proceeds.
pub fn resolve_detail_level(
    requested: PackDetailLevel,
    approval: Option<&BoardPackDetailRequest>,
) -> DetailDecision {
    let ceiling = approval
        .map(|record| record.approved_level)
        .unwrap_or(PackDetailLevel::Summary);

    if requested <= ceiling {
        return DetailDecision {
            effective: requested,
            downgraded: false,
            note: None,
        };
    }

    let note = match approval {
        Some(record) => format!(
            "requested {requested} exceeds approved {}; downgraded",
            record.approved_level
        ),
        None => format!("requested {requested} without standing approval; downgraded to SUMMARY"),
    };
    tracing::info!(requested = %requested, effective = %ceiling, "board pack detail level downgraded");

    DetailDecision {
        effective: ceiling,
        downgraded: true,
        note: Some(note),
    }
}
