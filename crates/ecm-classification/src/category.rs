//! # Risk Categories and the Category Points Table
//!
//! Every non-compliance is assigned a risk category from 1 (most severe)
//! to 4 (least severe). The category table maps each category to the
//! points it contributes to a site's annual score, plus a fixed surcharge
//! applied to breaches with amenity impact (odour, noise, dust).

use serde::{Deserialize, Serialize};

use ecm_core::ValidationError;

/// Severity category of a non-compliance. Category 1 is the most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Major breach with actual or imminent environmental harm.
    Category1,
    /// Significant breach undermining a permit condition's purpose.
    Category2,
    /// Minor breach with limited environmental consequence.
    Category3,
    /// Administrative or record-keeping breach.
    Category4,
}

impl RiskCategory {
    /// All categories, most severe first.
    pub fn all() -> [RiskCategory; 4] {
        [
            Self::Category1,
            Self::Category2,
            Self::Category3,
            Self::Category4,
        ]
    }

    /// Numeric severity level, 1 = most severe.
    pub fn level(&self) -> u8 {
        match self {
            Self::Category1 => 1,
            Self::Category2 => 2,
            Self::Category3 => 3,
            Self::Category4 => 4,
        }
    }

    /// Parse a numeric severity level.
    pub fn from_level(level: u8) -> Result<Self, ValidationError> {
        match level {
            1 => Ok(Self::Category1),
            2 => Ok(Self::Category2),
            3 => Ok(Self::Category3),
            4 => Ok(Self::Category4),
            other => Err(ValidationError(format!(
                "risk category level must be 1-4, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "category {}", self.level())
    }
}

/// Versioned points table: category → score contribution, plus the
/// amenity surcharge. Read-only at runtime; changed only by
/// administrative configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    /// Table version, carried into assessments for audit.
    pub version: String,
    /// Points for a category 1 breach.
    pub category1_points: u32,
    /// Points for a category 2 breach.
    pub category2_points: u32,
    /// Points for a category 3 breach.
    pub category3_points: u32,
    /// Points for a category 4 breach.
    pub category4_points: u32,
    /// Additional points when a breach has amenity impact.
    pub amenity_surcharge: u32,
}

impl CategoryTable {
    /// The standard published points table.
    pub fn standard() -> Self {
        Self {
            version: "2024.1".to_string(),
            category1_points: 40,
            category2_points: 20,
            category3_points: 10,
            category4_points: 2,
            amenity_surcharge: 5,
        }
    }

    /// Points contributed by one breach of the given category.
    pub fn points(&self, category: RiskCategory) -> u32 {
        match category {
            RiskCategory::Category1 => self.category1_points,
            RiskCategory::Category2 => self.category2_points,
            RiskCategory::Category3 => self.category3_points,
            RiskCategory::Category4 => self.category4_points,
        }
    }
}
