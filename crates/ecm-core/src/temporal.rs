//! # Temporal Types — Compliance Years and Lookback Windows
//!
//! The engine reasons about time in two units: whole compliance years
//! (classification is scored per site per year) and lookback windows
//! measured in calendar months (readiness rules inspect a trailing window
//! of obligations, evidence and assessments).
//!
//! ## Invariant
//!
//! All instants are `DateTime<Utc>`. Window arithmetic is calendar-month
//! based, not day-count based: a 12-month window anchored on 2026-03-31
//! starts on 2025-03-31, and month-end days clamp (2026-03-31 minus one
//! month is 2026-02-28).

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A compliance year — the scoring period for a site's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplianceYear(i32);

impl ComplianceYear {
    /// Earliest year the platform accepts. The scheme this classification
    /// standard derives from did not exist before 1990.
    pub const MIN: i32 = 1990;
    /// Latest accepted year — generous headroom, rejects obvious typos.
    pub const MAX: i32 = 2100;

    /// Construct a validated compliance year.
    pub fn new(year: i32) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&year) {
            return Err(ValidationError(format!(
                "compliance year {year} outside accepted range {}..={}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(year))
    }

    /// The inner year value.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// The compliance year immediately before this one.
    pub fn prior(&self) -> Option<Self> {
        Self::new(self.0 - 1).ok()
    }
}

impl std::fmt::Display for ComplianceYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trailing window measured in whole calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookbackWindow {
    months: u32,
}

impl LookbackWindow {
    /// Construct a window of the given number of months (must be non-zero).
    pub fn months(months: u32) -> Result<Self, ValidationError> {
        if months == 0 {
            return Err(ValidationError(
                "lookback window must cover at least one month".to_string(),
            ));
        }
        Ok(Self { months })
    }

    /// Number of months the window covers.
    pub fn month_count(&self) -> u32 {
        self.months
    }

    /// The instant the window starts, counting back from `as_of`.
    ///
    /// Month-end days clamp to the shorter month rather than overflowing.
    pub fn start_from(&self, as_of: DateTime<Utc>) -> DateTime<Utc> {
        as_of
            .checked_sub_months(Months::new(self.months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl std::fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}mo", self.months)
    }
}

/// Where a lookback window is anchored.
///
/// Standard rules anchor on the generation request date. First-year
/// adoption relaxations may instead anchor on the company's adoption
/// start, so a company is never asked for evidence predating its
/// onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    /// Count back from the generation request instant.
    RequestDate,
    /// The window begins no earlier than the company's adoption start.
    AdoptionStart,
}

impl WindowAnchor {
    /// Resolve the concrete window start for this anchor.
    ///
    /// `AdoptionStart` takes the later of the computed start and the
    /// adoption start, so the window never reaches back before onboarding.
    pub fn resolve(
        &self,
        window: LookbackWindow,
        as_of: DateTime<Utc>,
        adoption_start: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        let computed = window.start_from(as_of);
        match self {
            Self::RequestDate => computed,
            Self::AdoptionStart => match adoption_start {
                Some(start) => computed.max(start),
                None => computed,
            },
        }
    }
}
