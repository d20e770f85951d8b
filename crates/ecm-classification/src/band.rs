//! # Compliance Bands and the Band Lookup Table
//!
//! A site's total score maps to a letter band A–F through a versioned
//! range table. Each band carries the subsistence multiplier used
//! downstream for fee and risk calculations — this crate only looks the
//! multiplier up, it never interprets it.
//!
//! ## Invariant
//!
//! Band ranges must be contiguous, non-overlapping, start at zero, and
//! end in an unbounded range. That is a configuration-time invariant
//! enforced by [`BandTable::new`]; the runtime lookup fails closed — a
//! score no range contains produces no band rather than a guess.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compliance band letter. `A` is the best achievable band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BandCode {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl std::fmt::Display for BandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

/// One row of the band table: an inclusive score range, the band it maps
/// to, and that band's subsistence multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceBandDefinition {
    /// The band this range maps to.
    pub band: BandCode,
    /// Inclusive lower bound of the score range.
    pub points_min: u32,
    /// Inclusive upper bound; `None` means unbounded (the worst band
    /// matches any remaining score).
    pub points_max: Option<u32>,
    /// Band-derived factor for downstream fee calculations.
    pub subsistence_multiplier: f64,
}

/// Errors constructing a [`BandTable`]. These are configuration-time
/// failures — a running engine never sees a malformed table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// The table has no rows.
    #[error("band table must have at least one row")]
    Empty,

    /// The first row does not start at zero.
    #[error("band table must start at 0, first row starts at {0}")]
    FirstRowNotZero(u32),

    /// A bounded row is followed by a row that does not start immediately
    /// after it.
    #[error("band table gap or overlap: row for band {band} starts at {actual}, expected {expected}")]
    NotContiguous {
        /// Band of the offending row.
        band: BandCode,
        /// Where the row should have started.
        expected: u32,
        /// Where it actually starts.
        actual: u32,
    },

    /// A row other than the last is unbounded.
    #[error("only the final band may be unbounded, band {0} is not last")]
    UnboundedNotLast(BandCode),

    /// The final row has an upper bound.
    #[error("final band {0} must be unbounded")]
    LastRowBounded(BandCode),

    /// A row's bounds are inverted.
    #[error("band {band} has inverted range [{min}, {max}]")]
    InvertedRange {
        /// Band of the offending row.
        band: BandCode,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
}

/// Versioned, validated band lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    version: String,
    rows: Vec<ComplianceBandDefinition>,
}

impl BandTable {
    /// Construct a validated table.
    ///
    /// Rows must be ordered by ascending `points_min`, contiguous, and
    /// non-overlapping; the first row starts at 0 and only the final row
    /// is unbounded.
    pub fn new(
        version: impl Into<String>,
        rows: Vec<ComplianceBandDefinition>,
    ) -> Result<Self, TableError> {
        let Some(first) = rows.first() else {
            return Err(TableError::Empty);
        };
        if first.points_min != 0 {
            return Err(TableError::FirstRowNotZero(first.points_min));
        }

        let mut expected = 0u32;
        let last_index = rows.len() - 1;
        for (i, row) in rows.iter().enumerate() {
            if row.points_min != expected {
                return Err(TableError::NotContiguous {
                    band: row.band,
                    expected,
                    actual: row.points_min,
                });
            }
            match row.points_max {
                Some(max) => {
                    if max < row.points_min {
                        return Err(TableError::InvertedRange {
                            band: row.band,
                            min: row.points_min,
                            max,
                        });
                    }
                    if i == last_index {
                        return Err(TableError::LastRowBounded(row.band));
                    }
                    expected = match max.checked_add(1) {
                        Some(next) => next,
                        // points_max saturates u32; nothing can follow.
                        None => return Err(TableError::LastRowBounded(row.band)),
                    };
                }
                None => {
                    if i != last_index {
                        return Err(TableError::UnboundedNotLast(row.band));
                    }
                }
            }
        }

        Ok(Self {
            version: version.into(),
            rows,
        })
    }

    /// The standard published band table.
    pub fn standard() -> Self {
        Self::new(
            "2024.1",
            vec![
                ComplianceBandDefinition {
                    band: BandCode::A,
                    points_min: 0,
                    points_max: Some(9),
                    subsistence_multiplier: 0.95,
                },
                ComplianceBandDefinition {
                    band: BandCode::B,
                    points_min: 10,
                    points_max: Some(29),
                    subsistence_multiplier: 1.0,
                },
                ComplianceBandDefinition {
                    band: BandCode::C,
                    points_min: 30,
                    points_max: Some(59),
                    subsistence_multiplier: 1.1,
                },
                ComplianceBandDefinition {
                    band: BandCode::D,
                    points_min: 60,
                    points_max: Some(119),
                    subsistence_multiplier: 1.25,
                },
                ComplianceBandDefinition {
                    band: BandCode::E,
                    points_min: 120,
                    points_max: Some(249),
                    subsistence_multiplier: 1.5,
                },
                ComplianceBandDefinition {
                    band: BandCode::F,
                    points_min: 250,
                    points_max: None,
                    subsistence_multiplier: 3.0,
                },
            ],
        )
        .expect("standard band table is valid")
    }

    /// Table version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The table rows, ascending.
    pub fn rows(&self) -> &[ComplianceBandDefinition] {
        &self.rows
    }

    /// Look up the band containing `score`.
    ///
    /// Fails closed: a score outside every range yields `None`, which
    /// blocks any pack requiring a band.
    pub fn match_score(&self, score: u32) -> Option<&ComplianceBandDefinition> {
        self.rows.iter().find(|row| {
            score >= row.points_min && row.points_max.map_or(true, |max| score <= max)
        })
    }
}
