//! # Check Registry — Named Evaluation Procedures
//!
//! Rules reference check procedures by key; the registry maps keys to
//! implementations of [`RuleCheck`]. New rules reuse existing checks with
//! different parameters, windows, or blocking flags — the engine's
//! control flow never grows a new conditional for a new rule.
//!
//! Every check returns a [`CheckFinding`] with human-readable `details`
//! and, for failures, a concrete `recommendation` — both are required
//! for the UI and for audit defensibility.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use ecm_core::{CompanyId, DocumentId, SiteId};
use ecm_safeguards::EffectiveLookback;

use crate::data::ReadinessData;
use crate::rule::PackType;
use thiserror::Error;

/// A check could not execute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The check's data dependency was unavailable.
    #[error("{0}")]
    Data(#[from] crate::data::DataError),

    /// The rule's `params` value is malformed for this check.
    #[error("invalid rule params: {0}")]
    BadParams(String),
}

/// Everything a check may inspect for one rule evaluation.
pub struct CheckContext<'a> {
    /// Company the generation request belongs to.
    pub company_id: CompanyId,
    /// Requested pack type.
    pub pack_type: PackType,
    /// Sites selected for the pack.
    pub site_ids: &'a [SiteId],
    /// Documents referenced by the request, if any.
    pub document_ids: &'a [DocumentId],
    /// The resolved (possibly relaxed) lookback window.
    pub lookback: EffectiveLookback,
    /// Rule-specific parameters.
    pub params: &'a serde_json::Value,
    /// Evaluation instant.
    pub as_of: DateTime<Utc>,
    /// Snapshot data access.
    pub data: &'a dyn ReadinessData,
}

/// What a check found.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFinding {
    /// Whether the check passed.
    pub passed: bool,
    /// What was found, with supporting counts.
    pub details: String,
    /// Remediation that would resolve a failure.
    pub recommendation: Option<String>,
    /// Purely informational finding: reported as INFO, never blocks or
    /// warns.
    pub informational: bool,
}

impl CheckFinding {
    /// A passing finding.
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            passed: true,
            details: details.into(),
            recommendation: None,
            informational: false,
        }
    }

    /// A failing finding with its remediation.
    pub fn fail(details: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            passed: false,
            details: details.into(),
            recommendation: Some(recommendation.into()),
            informational: false,
        }
    }

    /// An informational finding that short-circuits to INFO.
    pub fn info(details: impl Into<String>) -> Self {
        Self {
            passed: true,
            details: details.into(),
            recommendation: None,
            informational: true,
        }
    }
}

/// A named check procedure. Implementations are stateless; everything
/// they inspect comes through the [`CheckContext`].
pub trait RuleCheck: Send + Sync + fmt::Debug {
    /// Stable registry key rules reference this check by.
    fn key(&self) -> &'static str;

    /// Run the check against the context.
    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError>;
}

/// Registry mapping check keys to procedures.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: HashMap<&'static str, Box<dyn RuleCheck>>,
}

impl CheckRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in check registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(EvidenceCoverageCheck));
        registry.register(Box::new(RemediationAgeCheck));
        registry.register(Box::new(AssessmentRecencyCheck));
        registry.register(Box::new(DocumentExtractionCheck));
        registry.register(Box::new(PermitActiveCheck));
        registry
    }

    /// Register a check under its key, replacing any previous entry.
    pub fn register(&mut self, check: Box<dyn RuleCheck>) {
        self.checks.insert(check.key(), check);
    }

    /// Look up a check by key.
    pub fn get(&self, key: &str) -> Option<&dyn RuleCheck> {
        self.checks.get(key).map(|boxed| boxed.as_ref())
    }

    /// Registered keys, for diagnostics.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.checks.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

// ─── Built-in checks ─────────────────────────────────────────────────

/// Every active obligation for the selected sites has at least one
/// linked evidence item within the lookback window.
#[derive(Debug)]
pub struct EvidenceCoverageCheck;

impl RuleCheck for EvidenceCoverageCheck {
    fn key(&self) -> &'static str {
        "evidence_coverage"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError> {
        let obligations = ctx.data.active_obligations(ctx.site_ids)?;
        let window_start = ctx.lookback.window_start;
        let uncovered: Vec<_> = obligations
            .iter()
            .filter(|o| o.last_evidence_at.map_or(true, |at| at < window_start))
            .collect();

        if uncovered.is_empty() {
            return Ok(CheckFinding::pass(format!(
                "all {} active obligations have evidence within the {} window",
                obligations.len(),
                ctx.lookback.window
            )));
        }
        Ok(CheckFinding::fail(
            format!(
                "{} of {} active obligations lack evidence within the {} window",
                uncovered.len(),
                obligations.len(),
                ctx.lookback.window
            ),
            format!(
                "attach at least one evidence item dated after {} to each uncovered obligation",
                window_start.format("%Y-%m-%d")
            ),
        ))
    }
}

/// No open corrective action is older than the configured age limit
/// (`params.max_open_days`, default 90).
#[derive(Debug)]
pub struct RemediationAgeCheck;

impl RemediationAgeCheck {
    const DEFAULT_MAX_OPEN_DAYS: i64 = 90;

    fn max_open_days(params: &serde_json::Value) -> Result<i64, CheckError> {
        match params.get("max_open_days") {
            None => Ok(Self::DEFAULT_MAX_OPEN_DAYS),
            Some(value) => value
                .as_i64()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    CheckError::BadParams(format!(
                        "max_open_days must be a positive integer, got {value}"
                    ))
                }),
        }
    }
}

impl RuleCheck for RemediationAgeCheck {
    fn key(&self) -> &'static str {
        "remediation_age"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError> {
        let max_open_days = Self::max_open_days(ctx.params)?;
        let cutoff = ctx.as_of - Duration::days(max_open_days);
        let remediations = ctx.data.open_remediations(ctx.site_ids)?;
        let stale: Vec<_> = remediations
            .iter()
            .filter(|r| r.opened_at < cutoff)
            .collect();

        if stale.is_empty() {
            return Ok(CheckFinding::pass(format!(
                "{} open corrective actions, none older than {max_open_days} days",
                remediations.len()
            )));
        }
        Ok(CheckFinding::fail(
            format!(
                "{} of {} open corrective actions are older than {max_open_days} days",
                stale.len(),
                remediations.len()
            ),
            format!(
                "close or formally extend the corrective actions opened before {}",
                cutoff.format("%Y-%m-%d")
            ),
        ))
    }
}

/// Each selected site's most recent classification assessment falls
/// inside the lookback window and carries a band. A missing assessment
/// or a band-less one fails — the engine never vouches for an unscored
/// site.
#[derive(Debug)]
pub struct AssessmentRecencyCheck;

impl RuleCheck for AssessmentRecencyCheck {
    fn key(&self) -> &'static str {
        "assessment_recency"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError> {
        let window_start = ctx.lookback.window_start;
        let mut missing = 0u32;
        let mut stale = 0u32;
        let mut bandless = 0u32;

        for &site in ctx.site_ids {
            match ctx.data.latest_assessment(site)? {
                None => missing += 1,
                Some(assessment) => {
                    if assessment.assessed_at < window_start {
                        stale += 1;
                    } else if assessment.band.is_none() {
                        bandless += 1;
                    }
                }
            }
        }

        let failing = missing + stale + bandless;
        if failing == 0 {
            return Ok(CheckFinding::pass(format!(
                "all {} sites have a banded assessment within the {} window",
                ctx.site_ids.len(),
                ctx.lookback.window
            )));
        }
        Ok(CheckFinding::fail(
            format!(
                "{failing} of {} sites lack a current banded assessment \
                 ({missing} unassessed, {stale} stale, {bandless} without a band)",
                ctx.site_ids.len()
            ),
            "run a classification assessment for each failing site before generating the pack"
                .to_string(),
        ))
    }
}

/// Every document referenced by the request has completed obligation
/// extraction. Informational when the request names no documents.
#[derive(Debug)]
pub struct DocumentExtractionCheck;

impl RuleCheck for DocumentExtractionCheck {
    fn key(&self) -> &'static str {
        "document_extraction"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError> {
        if ctx.document_ids.is_empty() {
            return Ok(CheckFinding::info(
                "no documents referenced by this request",
            ));
        }
        let statuses = ctx.data.document_statuses(ctx.document_ids)?;
        let incomplete = statuses.iter().filter(|d| !d.extraction_complete).count();
        // Documents the register does not know about count as incomplete.
        let unknown = ctx.document_ids.len().saturating_sub(statuses.len());
        let failing = incomplete + unknown;

        if failing == 0 {
            return Ok(CheckFinding::pass(format!(
                "all {} referenced documents have completed extraction",
                ctx.document_ids.len()
            )));
        }
        Ok(CheckFinding::fail(
            format!(
                "{failing} of {} referenced documents have not completed extraction",
                ctx.document_ids.len()
            ),
            "wait for obligation extraction to finish, or drop the unextracted documents from the request"
                .to_string(),
        ))
    }
}

/// Every selected site holds an active permit. A site the permit
/// register does not know about fails.
#[derive(Debug)]
pub struct PermitActiveCheck;

impl RuleCheck for PermitActiveCheck {
    fn key(&self) -> &'static str {
        "permit_active"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckFinding, CheckError> {
        let permits = ctx.data.site_permits(ctx.site_ids)?;
        let inactive = ctx
            .site_ids
            .iter()
            .filter(|site| {
                !permits
                    .iter()
                    .any(|permit| permit.site_id == **site && permit.active)
            })
            .count();

        if inactive == 0 {
            return Ok(CheckFinding::pass(format!(
                "all {} selected sites hold an active permit",
                ctx.site_ids.len()
            )));
        }
        Ok(CheckFinding::fail(
            format!(
                "{inactive} of {} selected sites have no active permit",
                ctx.site_ids.len()
            ),
            "remove unpermitted sites from the selection or resolve their permit status".to_string(),
        ))
    }
}
