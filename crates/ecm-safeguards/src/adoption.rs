//! # First-Year Adoption Mode
//!
//! Lowers friction for newly-onboarded companies by relaxing specific
//! readiness rules' lookback windows. Adoption mode is bounded by a hard
//! expiry: an expired or absent expiry means "not in adoption mode",
//! never "permanently relaxed".
//!
//! Relaxation changes a rule's effective lookback window only — never its
//! blocking flag, never whether the rule applies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{CompanyId, LookbackWindow, RuleId, WindowAnchor};

/// Whether a company is operating under first-year adoption relief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionMode {
    /// Normal operation; standard lookback windows apply.
    Standard,
    /// First-year adoption relief; relaxed windows may apply until expiry.
    FirstYear,
}

/// Per-company adoption configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAdoptionConfig {
    /// The company this configuration belongs to.
    pub company_id: CompanyId,
    /// Current adoption mode.
    pub adoption_mode: AdoptionMode,
    /// When the company onboarded onto the platform.
    pub adoption_start: DateTime<Utc>,
    /// Hard expiry of first-year relief. Mandatory for relief to apply.
    pub adoption_mode_expiry: Option<DateTime<Utc>>,
}

impl CompanyAdoptionConfig {
    /// Whether first-year relief is active at `as_of`.
    ///
    /// Requires mode `FirstYear` AND a present, future expiry.
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        self.adoption_mode == AdoptionMode::FirstYear
            && self
                .adoption_mode_expiry
                .map(|expiry| as_of < expiry)
                .unwrap_or(false)
    }
}

/// A per-company, per-rule lookback override, effective only while the
/// company's adoption mode is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedRule {
    /// The company the override belongs to.
    pub company_id: CompanyId,
    /// The rule being relaxed.
    pub rule_id: RuleId,
    /// The relaxed (shorter or re-anchored) window.
    pub relaxed_window: LookbackWindow,
    /// Where the relaxed window is anchored.
    pub anchor: WindowAnchor,
    /// Administrative kill-switch for the override.
    pub active: bool,
}

/// The lookback window actually applied to one rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveLookback {
    /// The window in months.
    pub window: LookbackWindow,
    /// Concrete start instant of the window.
    pub window_start: DateTime<Utc>,
    /// Whether a first-year relaxation was applied.
    pub relaxed: bool,
}

/// Resolve the lookback window for one rule.
///
/// The relaxed window applies only when the company is in active adoption
/// mode AND an active override row exists for this rule; in every other
/// case the rule's standard window anchored on the request date applies.
pub fn effective_lookback(
    rule_id: RuleId,
    standard: LookbackWindow,
    config: Option<&CompanyAdoptionConfig>,
    overrides: &[RelaxedRule],
    as_of: DateTime<Utc>,
) -> EffectiveLookback {
    if let Some(config) = config {
        if config.is_active(as_of) {
            let relaxation = overrides
                .iter()
                .find(|row| row.rule_id == rule_id && row.active && row.company_id == config.company_id);
            if let Some(row) = relaxation {
                let window_start =
                    row.anchor
                        .resolve(row.relaxed_window, as_of, Some(config.adoption_start));
                tracing::debug!(
                    rule = %rule_id,
                    company = %config.company_id,
                    window = %row.relaxed_window,
                    "first-year relaxation applied"
                );
                return EffectiveLookback {
                    window: row.relaxed_window,
                    window_start,
                    relaxed: true,
                };
            }
        }
    }

    EffectiveLookback {
        window: standard,
        window_start: WindowAnchor::RequestDate.resolve(standard, as_of, None),
        relaxed: false,
    }
}
