//! # Readiness Rules and Materialized Evaluations
//!
//! A rule is a named, versioned row of configuration: which pack types it
//! applies to, whether failing it blocks generation, its standard
//! lookback window, and the key of the check procedure that evaluates it.
//!
//! A [`RuleEvaluation`] is the fully-materialized result of running one
//! rule against one generation request. It copies everything it needs
//! from the rule — including the `blocking` flag — so pack history stays
//! stable even when the rule table is later edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{LookbackWindow, RuleId};

/// The pack types the platform can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackType {
    /// Regulator-facing evidence bundle.
    RegulatorPack,
    /// Board-facing governance bundle.
    BoardPack,
    /// Tender/procurement-facing bundle.
    TenderPack,
}

impl PackType {
    /// All pack types.
    pub fn all() -> [PackType; 3] {
        [Self::RegulatorPack, Self::BoardPack, Self::TenderPack]
    }
}

impl std::fmt::Display for PackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RegulatorPack => "REGULATOR_PACK",
            Self::BoardPack => "BOARD_PACK",
            Self::TenderPack => "TENDER_PACK",
        };
        f.write_str(s)
    }
}

/// A named, versioned readiness rule. Rules are data: new rules are added
/// to the table, not to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Stable machine-readable key (e.g. `assessment_recency`).
    pub key: String,
    /// Human-readable rule name.
    pub name: String,
    /// Rule definition version.
    pub version: String,
    /// Pack types this rule applies to.
    pub pack_types: Vec<PackType>,
    /// Whether failing this rule blocks generation (advisory otherwise).
    pub blocking: bool,
    /// Standard lookback window, before any first-year relaxation.
    pub lookback: LookbackWindow,
    /// Key of the check procedure in the registry.
    pub check: String,
    /// Check-specific parameters (thresholds etc.).
    #[serde(default)]
    pub params: serde_json::Value,
    /// Whether the rule is currently in force.
    pub active: bool,
}

impl ReadinessRule {
    /// Whether the rule applies to the given pack type.
    pub fn applies_to(&self, pack_type: PackType) -> bool {
        self.active && self.pack_types.contains(&pack_type)
    }
}

/// Outcome category of a single rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleResult {
    Pass,
    Fail,
    Warning,
    Info,
}

impl std::fmt::Display for RuleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// The materialized result of running one rule against one generation
/// request. Self-contained by design: later edits to the rule table never
/// change what a stored evaluation says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    /// The rule that was evaluated.
    pub rule_id: RuleId,
    /// Rule key at evaluation time.
    pub rule_key: String,
    /// Rule name at evaluation time.
    pub rule_name: String,
    /// Rule version at evaluation time.
    pub rule_version: String,
    /// Outcome category.
    pub result: RuleResult,
    /// Blocking flag copied from the rule at evaluation time.
    pub blocking: bool,
    /// What was found. Never blank for non-PASS results.
    pub details: String,
    /// What remediation would resolve a non-PASS result.
    pub recommendation: Option<String>,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
}

impl RuleEvaluation {
    /// Whether this evaluation blocks generation.
    pub fn is_blocking_failure(&self) -> bool {
        self.result == RuleResult::Fail && self.blocking
    }
}
