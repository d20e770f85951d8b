//! # Readiness Evaluation Engine
//!
//! The generic evaluator over the rule table and the check registry.
//! One entry point, [`ReadinessEngine::evaluate`], backs both the
//! dry-run operation and the pre-generation gate inside the pack
//! lifecycle — identical logic, no side effects.
//!
//! ## Failure Isolation
//!
//! A single rule's fault (unknown check key, bad params, unreachable
//! dependency) is converted into a synthetic **blocking** FAIL for that
//! rule and evaluation continues. Anything that would prevent a complete
//! evaluation — every applicable rule attempted — is a validation error
//! raised before any rule runs. Callers always receive either a complete
//! report or a validation error, never a partial rule list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecm_core::{CompanyId, ComplianceYear, DocumentId, SiteId, ValidationError};
use ecm_safeguards::{effective_lookback, CompanyAdoptionConfig, PackDetailLevel, RelaxedRule};

use crate::checks::{CheckContext, CheckRegistry};
use crate::data::ReadinessData;
use crate::rule::{PackType, ReadinessRule, RuleEvaluation, RuleResult};

/// Safeguard parameters carried on a generation request and persisted
/// onto the pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackConfiguration {
    /// Compliance year the pack reports on.
    pub compliance_year: ComplianceYear,
    /// Requested board-pack detail level, where applicable.
    pub detail_level: Option<PackDetailLevel>,
    /// Whether the request asks for incident statistics (tender packs).
    pub include_incident_statistics: bool,
}

/// A request to generate a pack (or to dry-run its readiness).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The requesting company.
    pub company_id: CompanyId,
    /// The pack type requested.
    pub pack_type: PackType,
    /// Sites the pack covers.
    pub site_ids: Vec<SiteId>,
    /// Source documents referenced by the pack, if any.
    #[serde(default)]
    pub document_ids: Vec<DocumentId>,
    /// Safeguard parameters.
    pub configuration: PackConfiguration,
}

impl GenerationRequest {
    /// Validate request shape. Runs before any rule evaluation; a
    /// failure here means no evaluation happened and no record exists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.site_ids.is_empty() {
            return Err(ValidationError(
                "site_ids must contain at least one site".to_string(),
            ));
        }
        let mut deduped = self.site_ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        if deduped.len() != self.site_ids.len() {
            return Err(ValidationError(
                "site_ids must not contain duplicates".to_string(),
            ));
        }
        Ok(())
    }
}

/// The complete result of one readiness evaluation.
///
/// Evaluations land in exactly one list: blocking FAILs in
/// `blocking_failures`, advisory failures in `warnings`, and PASS/INFO
/// results in `passed_rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Failed blocking rules — any entry here blocks generation.
    pub blocking_failures: Vec<RuleEvaluation>,
    /// Failed advisory rules.
    pub warnings: Vec<RuleEvaluation>,
    /// Passed and informational rules.
    pub passed_rules: Vec<RuleEvaluation>,
}

impl ReadinessReport {
    /// Partition raw evaluations into the report lists.
    pub fn from_evaluations(evaluations: Vec<RuleEvaluation>) -> Self {
        let mut report = Self {
            blocking_failures: Vec::new(),
            warnings: Vec::new(),
            passed_rules: Vec::new(),
        };
        for evaluation in evaluations {
            match evaluation.result {
                RuleResult::Fail => report.blocking_failures.push(evaluation),
                RuleResult::Warning => report.warnings.push(evaluation),
                RuleResult::Pass | RuleResult::Info => report.passed_rules.push(evaluation),
            }
        }
        report
    }

    /// Whether generation may proceed. Derived, never stored separately.
    pub fn can_generate(&self) -> bool {
        self.blocking_failures.is_empty()
    }

    /// Total number of rules evaluated.
    pub fn rule_count(&self) -> usize {
        self.blocking_failures.len() + self.warnings.len() + self.passed_rules.len()
    }
}

/// The readiness rule engine. Stateless apart from the check registry;
/// every evaluation is a pure function of its inputs.
#[derive(Debug)]
pub struct ReadinessEngine {
    registry: CheckRegistry,
}

impl ReadinessEngine {
    /// Engine with the built-in check registry.
    pub fn new() -> Self {
        Self {
            registry: CheckRegistry::builtin(),
        }
    }

    /// Engine with a custom registry.
    pub fn with_registry(registry: CheckRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate every applicable rule against the current data snapshot.
    ///
    /// Read-only and idempotent — callable any number of times with no
    /// side effects.
    pub fn evaluate(
        &self,
        request: &GenerationRequest,
        rules: &[ReadinessRule],
        adoption: Option<&CompanyAdoptionConfig>,
        overrides: &[RelaxedRule],
        data: &dyn ReadinessData,
        as_of: DateTime<Utc>,
    ) -> Result<ReadinessReport, ValidationError> {
        request.validate()?;

        let applicable: Vec<&ReadinessRule> = rules
            .iter()
            .filter(|rule| rule.applies_to(request.pack_type))
            .collect();

        let mut evaluations = Vec::with_capacity(applicable.len());
        for rule in applicable {
            evaluations.push(self.evaluate_rule(rule, request, adoption, overrides, data, as_of));
        }

        let report = ReadinessReport::from_evaluations(evaluations);
        tracing::info!(
            company = %request.company_id,
            pack_type = %request.pack_type,
            rules = report.rule_count(),
            blocking = report.blocking_failures.len(),
            warnings = report.warnings.len(),
            can_generate = report.can_generate(),
            "readiness evaluated"
        );
        Ok(report)
    }

    fn evaluate_rule(
        &self,
        rule: &ReadinessRule,
        request: &GenerationRequest,
        adoption: Option<&CompanyAdoptionConfig>,
        overrides: &[RelaxedRule],
        data: &dyn ReadinessData,
        as_of: DateTime<Utc>,
    ) -> RuleEvaluation {
        // First-year relaxation changes the window only; blocking flag
        // and applicability come straight off the rule row.
        let lookback = effective_lookback(rule.id, rule.lookback, adoption, overrides, as_of);

        let Some(check) = self.registry.get(&rule.check) else {
            tracing::error!(rule = %rule.key, check = %rule.check, "unknown check procedure");
            return synthetic_failure(
                rule,
                format!("check procedure '{}' is not registered", rule.check),
                as_of,
            );
        };

        let ctx = CheckContext {
            company_id: request.company_id,
            pack_type: request.pack_type,
            site_ids: &request.site_ids,
            document_ids: &request.document_ids,
            lookback,
            params: &rule.params,
            as_of,
            data,
        };

        match check.run(&ctx) {
            Ok(finding) => {
                let result = if finding.informational {
                    RuleResult::Info
                } else if finding.passed {
                    RuleResult::Pass
                } else if rule.blocking {
                    RuleResult::Fail
                } else {
                    RuleResult::Warning
                };
                let recommendation = if finding.passed {
                    finding.recommendation
                } else {
                    // Non-PASS results always carry a remediation hint.
                    finding.recommendation.or_else(|| {
                        Some(format!("review the data behind rule '{}'", rule.name))
                    })
                };
                RuleEvaluation {
                    rule_id: rule.id,
                    rule_key: rule.key.clone(),
                    rule_name: rule.name.clone(),
                    rule_version: rule.version.clone(),
                    result,
                    blocking: rule.blocking,
                    details: finding.details,
                    recommendation,
                    evaluated_at: as_of,
                }
            }
            Err(err) => {
                tracing::error!(rule = %rule.key, error = %err, "rule check failed to execute");
                synthetic_failure(rule, err.to_string(), as_of)
            }
        }
    }
}

impl Default for ReadinessEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A rule whose check could not run is recorded as a blocking FAIL —
/// regardless of the rule's own advisory flag — naming the fault. The
/// engine must not report readiness it cannot prove.
fn synthetic_failure(rule: &ReadinessRule, fault: String, as_of: DateTime<Utc>) -> RuleEvaluation {
    RuleEvaluation {
        rule_id: rule.id,
        rule_key: rule.key.clone(),
        rule_name: rule.name.clone(),
        rule_version: rule.version.clone(),
        result: RuleResult::Fail,
        blocking: true,
        details: format!("rule could not be evaluated: {fault}"),
        recommendation: Some(
            "restore the named dependency and re-run the readiness evaluation".to_string(),
        ),
        evaluated_at: as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        AssessmentStatus, DataError, DocumentStatus, ObligationStatus, PermitStatus,
        RemediationStatus,
    };
    use chrono::TimeZone;
    use ecm_classification::BandCode;
    use ecm_core::{LookbackWindow, ObligationId, RuleId, WindowAnchor};
    use ecm_safeguards::AdoptionMode;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct StubData {
        obligations: Vec<ObligationStatus>,
        assessments: Vec<AssessmentStatus>,
        fail_obligations: bool,
    }

    impl ReadinessData for StubData {
        fn active_obligations(
            &self,
            _sites: &[SiteId],
        ) -> Result<Vec<ObligationStatus>, DataError> {
            if self.fail_obligations {
                return Err(DataError::unavailable(
                    "obligation-register",
                    "timeout after 30s",
                ));
            }
            Ok(self.obligations.clone())
        }

        fn open_remediations(
            &self,
            _sites: &[SiteId],
        ) -> Result<Vec<RemediationStatus>, DataError> {
            Ok(vec![])
        }

        fn latest_assessment(&self, site: SiteId) -> Result<Option<AssessmentStatus>, DataError> {
            Ok(self
                .assessments
                .iter()
                .find(|a| a.site_id == site)
                .cloned())
        }

        fn document_statuses(
            &self,
            _documents: &[DocumentId],
        ) -> Result<Vec<DocumentStatus>, DataError> {
            Ok(vec![])
        }

        fn site_permits(&self, sites: &[SiteId]) -> Result<Vec<PermitStatus>, DataError> {
            Ok(sites
                .iter()
                .map(|&site_id| PermitStatus {
                    site_id,
                    reference: "EPR/XY9876".to_string(),
                    active: true,
                })
                .collect())
        }
    }

    fn rule(key: &str, check: &str, blocking: bool, months: u32) -> ReadinessRule {
        ReadinessRule {
            id: RuleId::new(),
            key: key.to_string(),
            name: format!("rule {key}"),
            version: "1".to_string(),
            pack_types: PackType::all().to_vec(),
            blocking,
            lookback: LookbackWindow::months(months).unwrap(),
            check: check.to_string(),
            params: serde_json::Value::Null,
            active: true,
        }
    }

    fn request(site_ids: Vec<SiteId>) -> GenerationRequest {
        GenerationRequest {
            company_id: CompanyId::new(),
            pack_type: PackType::RegulatorPack,
            site_ids,
            document_ids: vec![],
            configuration: PackConfiguration {
                compliance_year: ComplianceYear::new(2025).unwrap(),
                detail_level: None,
                include_incident_statistics: false,
            },
        }
    }

    // ── Validation before evaluation ─────────────────────────────────

    #[test]
    fn empty_site_list_rejected_before_evaluation() {
        let engine = ReadinessEngine::new();
        let result = engine.evaluate(
            &request(vec![]),
            &[rule("r", "permit_active", true, 12)],
            None,
            &[],
            &StubData::default(),
            at(2026, 6, 1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_sites_rejected() {
        let site = SiteId::new();
        let engine = ReadinessEngine::new();
        let result = engine.evaluate(
            &request(vec![site, site]),
            &[],
            None,
            &[],
            &StubData::default(),
            at(2026, 6, 1),
        );
        assert!(result.is_err());
    }

    // ── Result partitioning ──────────────────────────────────────────

    #[test]
    fn blocking_and_advisory_failures_partition() {
        // One blocking rule fails (no assessment on file) and one
        // advisory rule fails (obligation without evidence).
        let site = SiteId::new();
        let data = StubData {
            obligations: vec![ObligationStatus {
                id: ObligationId::new(),
                site_id: site,
                condition_reference: "2.4".to_string(),
                last_evidence_at: None,
            }],
            ..Default::default()
        };
        let rules = vec![
            rule("assessment_recency", "assessment_recency", true, 12),
            rule("evidence_coverage", "evidence_coverage", false, 6),
        ];
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(&request(vec![site]), &rules, None, &[], &data, at(2026, 6, 1))
            .unwrap();

        assert_eq!(report.blocking_failures.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.can_generate());
        assert_eq!(report.blocking_failures[0].rule_key, "assessment_recency");
        assert_eq!(report.warnings[0].rule_key, "evidence_coverage");
    }

    #[test]
    fn can_generate_iff_no_blocking_failures() {
        let site = SiteId::new();
        let data = StubData {
            assessments: vec![AssessmentStatus {
                site_id: site,
                assessed_at: at(2026, 3, 1),
                band: Some(BandCode::B),
            }],
            ..Default::default()
        };
        let rules = vec![rule("assessment_recency", "assessment_recency", true, 12)];
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(&request(vec![site]), &rules, None, &[], &data, at(2026, 6, 1))
            .unwrap();
        assert!(report.can_generate());
        assert_eq!(report.can_generate(), report.blocking_failures.is_empty());
        assert_eq!(report.passed_rules.len(), 1);
    }

    // ── Fail-closed semantics ────────────────────────────────────────

    #[test]
    fn data_error_becomes_blocking_fail_naming_dependency() {
        let site = SiteId::new();
        let data = StubData {
            fail_obligations: true,
            ..Default::default()
        };
        // The failing rule is advisory, but an execution error is
        // blocking regardless.
        let rules = vec![rule("evidence_coverage", "evidence_coverage", false, 6)];
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(&request(vec![site]), &rules, None, &[], &data, at(2026, 6, 1))
            .unwrap();

        assert_eq!(report.blocking_failures.len(), 1);
        assert!(report.blocking_failures[0]
            .details
            .contains("obligation-register"));
        assert!(!report.can_generate());
    }

    #[test]
    fn unknown_check_key_becomes_blocking_fail() {
        let site = SiteId::new();
        let rules = vec![rule("mystery", "not_a_check", false, 6)];
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(
                &request(vec![site]),
                &rules,
                None,
                &[],
                &StubData::default(),
                at(2026, 6, 1),
            )
            .unwrap();
        assert_eq!(report.blocking_failures.len(), 1);
        assert!(report.blocking_failures[0].details.contains("not_a_check"));
    }

    #[test]
    fn one_rules_fault_does_not_abort_the_rest() {
        let site = SiteId::new();
        let data = StubData {
            fail_obligations: true,
            ..Default::default()
        };
        let rules = vec![
            rule("evidence_coverage", "evidence_coverage", true, 6),
            rule("permit_active", "permit_active", true, 12),
        ];
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(&request(vec![site]), &rules, None, &[], &data, at(2026, 6, 1))
            .unwrap();
        // The permit rule still evaluated and passed.
        assert_eq!(report.rule_count(), 2);
        assert_eq!(report.passed_rules.len(), 1);
        assert_eq!(report.passed_rules[0].rule_key, "permit_active");
    }

    // ── Rule filtering ───────────────────────────────────────────────

    #[test]
    fn inactive_and_inapplicable_rules_are_skipped() {
        let site = SiteId::new();
        let mut inactive = rule("a", "permit_active", true, 12);
        inactive.active = false;
        let mut board_only = rule("b", "permit_active", true, 12);
        board_only.pack_types = vec![PackType::BoardPack];

        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(
                &request(vec![site]),
                &[inactive, board_only],
                None,
                &[],
                &StubData::default(),
                at(2026, 6, 1),
            )
            .unwrap();
        assert_eq!(report.rule_count(), 0);
        assert!(report.can_generate());
    }

    // ── First-year relaxation ────────────────────────────────────────

    #[test]
    fn relaxation_changes_window_but_not_blocking_or_applicability() {
        let site = SiteId::new();
        let company = CompanyId::new();
        // Evidence dated 4 months ago: stale for a 3-month window even
        // after relaxation, so the rule still fails — and it must fail
        // with its own blocking flag intact.
        let data = StubData {
            obligations: vec![ObligationStatus {
                id: ObligationId::new(),
                site_id: site,
                condition_reference: "1.1".to_string(),
                last_evidence_at: Some(at(2026, 2, 1)),
            }],
            ..Default::default()
        };
        let evidence_rule = rule("evidence_coverage", "evidence_coverage", true, 12);
        let adoption = CompanyAdoptionConfig {
            company_id: company,
            adoption_mode: AdoptionMode::FirstYear,
            adoption_start: at(2026, 1, 1),
            adoption_mode_expiry: Some(at(2027, 1, 1)),
        };
        let overrides = vec![RelaxedRule {
            company_id: company,
            rule_id: evidence_rule.id,
            relaxed_window: LookbackWindow::months(3).unwrap(),
            anchor: WindowAnchor::RequestDate,
            active: true,
        }];

        let mut req = request(vec![site]);
        req.company_id = company;

        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(
                &req,
                &[evidence_rule.clone()],
                Some(&adoption),
                &overrides,
                &data,
                at(2026, 6, 15),
            )
            .unwrap();

        // Rule still applies and still carries blocking=true.
        assert_eq!(report.blocking_failures.len(), 1);
        assert!(report.blocking_failures[0].blocking);
        // The relaxed 3-month window is what the details describe.
        assert!(report.blocking_failures[0].details.contains("3mo"));

        // Evidence inside the relaxed window passes.
        let fresh_data = StubData {
            obligations: vec![ObligationStatus {
                id: ObligationId::new(),
                site_id: site,
                condition_reference: "1.1".to_string(),
                last_evidence_at: Some(at(2026, 5, 1)),
            }],
            ..Default::default()
        };
        let report = engine
            .evaluate(
                &req,
                &[evidence_rule],
                Some(&adoption),
                &overrides,
                &fresh_data,
                at(2026, 6, 15),
            )
            .unwrap();
        assert!(report.can_generate());
    }

    // ── Snapshot materialization ─────────────────────────────────────

    #[test]
    fn evaluation_copies_rule_fields_at_evaluation_time() {
        let site = SiteId::new();
        let r = rule("permit_active", "permit_active", true, 12);
        let engine = ReadinessEngine::new();
        let report = engine
            .evaluate(
                &request(vec![site]),
                std::slice::from_ref(&r),
                None,
                &[],
                &StubData::default(),
                at(2026, 6, 1),
            )
            .unwrap();
        let evaluation = &report.passed_rules[0];
        assert_eq!(evaluation.rule_id, r.id);
        assert_eq!(evaluation.rule_version, r.version);
        assert_eq!(evaluation.blocking, r.blocking);
    }
}
