//! # ecm-classification — Compliance Classification Scorer
//!
//! Converts a site's historical non-compliance records into a standardized
//! classification: a numeric score, a letter band, and the band's
//! subsistence multiplier used downstream for fee calculations.
//!
//! ## Components
//!
//! - [`CategoryTable`] / [`BandTable`] — static, versioned lookup tables.
//!   Changed only by administrative configuration, read-only at runtime.
//! - [`score`] — the scoring run producing a [`ClassificationAssessment`].
//! - [`ComplianceTrend`] — pure year-over-year comparison for dashboards.
//! - [`build_dashboard`] — aggregation behind the classification dashboard
//!   operation.
//!
//! ## Fail-Closed Posture
//!
//! Band ranges are validated to be contiguous and non-overlapping when the
//! table is constructed. At runtime the scorer does not re-validate: a
//! score the table cannot place yields **no band**, which blocks any pack
//! requiring one — the engine never guesses a band.

pub mod band;
pub mod category;
pub mod dashboard;
pub mod record;
pub mod scorer;
pub mod trend;

pub use band::{BandCode, BandTable, ComplianceBandDefinition, TableError};
pub use category::{CategoryTable, RiskCategory};
pub use dashboard::{build_dashboard, ClassificationDashboard, DashboardInputs};
pub use record::NonComplianceRecord;
pub use scorer::{score, AssessedBy, ClassificationAssessment};
pub use trend::ComplianceTrend;
