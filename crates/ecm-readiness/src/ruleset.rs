//! # Rule-Set Manifest
//!
//! The versioned configuration file carrying the readiness rule table,
//! the risk-category points, and the compliance band table. Loaded at
//! service bootstrap; an invalid manifest is a fatal startup error,
//! never a silently-empty rule table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ecm_classification::{BandTable, CategoryTable, ComplianceBandDefinition, TableError};
use ecm_core::{LookbackWindow, RuleId, ValidationError};

use crate::rule::{PackType, ReadinessRule};

/// Errors loading or validating a rule-set manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("manifest not readable: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid YAML for the expected shape.
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The band table rows are malformed.
    #[error("band table invalid: {0}")]
    Table(#[from] TableError),

    /// A rule row is malformed.
    #[error("rule '{key}' invalid: {source}")]
    Rule {
        /// Key of the offending rule.
        key: String,
        /// What is wrong with it.
        source: ValidationError,
    },
}

fn default_rule_version() -> String {
    "1".to_string()
}

fn default_active() -> bool {
    true
}

/// One rule row as written in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Explicit rule id; generated when omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Stable machine-readable key.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Rule definition version.
    #[serde(default = "default_rule_version")]
    pub version: String,
    /// Pack types the rule applies to.
    pub pack_types: Vec<PackType>,
    /// Whether failing the rule blocks generation.
    pub blocking: bool,
    /// Standard lookback window in months.
    pub lookback_months: u32,
    /// Check procedure key.
    pub check: String,
    /// Check-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Whether the rule is in force.
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Risk-category points as written in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPointsSpec {
    pub category1_points: u32,
    pub category2_points: u32,
    pub category3_points: u32,
    pub category4_points: u32,
    pub amenity_surcharge: u32,
}

/// The full rule-set manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetManifest {
    /// Manifest version, carried into the lookup tables.
    pub version: String,
    /// Risk-category points table.
    pub risk_categories: CategoryPointsSpec,
    /// Band table rows, ascending.
    pub bands: Vec<ComplianceBandDefinition>,
    /// Readiness rule rows.
    pub rules: Vec<RuleSpec>,
}

impl RuleSetManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a manifest from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// The compiled-in standard manifest, used when no `ECM_CONFIG`
    /// file is provided.
    pub fn default_manifest() -> Self {
        let all = PackType::all().to_vec();
        Self {
            version: "2024.1".to_string(),
            risk_categories: CategoryPointsSpec {
                category1_points: 40,
                category2_points: 20,
                category3_points: 10,
                category4_points: 2,
                amenity_surcharge: 5,
            },
            bands: BandTable::standard().rows().to_vec(),
            rules: vec![
                RuleSpec {
                    id: None,
                    key: "assessment_recency".to_string(),
                    name: "Classification assessment within lookback".to_string(),
                    version: "1".to_string(),
                    pack_types: all.clone(),
                    blocking: true,
                    lookback_months: 12,
                    check: "assessment_recency".to_string(),
                    params: serde_json::Value::Null,
                    active: true,
                },
                RuleSpec {
                    id: None,
                    key: "evidence_coverage".to_string(),
                    name: "Obligation evidence freshness".to_string(),
                    version: "1".to_string(),
                    pack_types: all.clone(),
                    blocking: false,
                    lookback_months: 6,
                    check: "evidence_coverage".to_string(),
                    params: serde_json::Value::Null,
                    active: true,
                },
                RuleSpec {
                    id: None,
                    key: "remediation_age".to_string(),
                    name: "Corrective actions within age limit".to_string(),
                    version: "1".to_string(),
                    pack_types: vec![PackType::RegulatorPack, PackType::TenderPack],
                    blocking: true,
                    lookback_months: 12,
                    check: "remediation_age".to_string(),
                    params: serde_json::json!({ "max_open_days": 90 }),
                    active: true,
                },
                RuleSpec {
                    id: None,
                    key: "permit_active".to_string(),
                    name: "Active permits for selected sites".to_string(),
                    version: "1".to_string(),
                    pack_types: vec![PackType::RegulatorPack, PackType::TenderPack],
                    blocking: true,
                    lookback_months: 12,
                    check: "permit_active".to_string(),
                    params: serde_json::Value::Null,
                    active: true,
                },
                RuleSpec {
                    id: None,
                    key: "document_extraction".to_string(),
                    name: "Referenced documents extracted".to_string(),
                    version: "1".to_string(),
                    pack_types: all,
                    blocking: false,
                    lookback_months: 6,
                    check: "document_extraction".to_string(),
                    params: serde_json::Value::Null,
                    active: true,
                },
            ],
        }
    }

    /// Convert the manifest into the typed tables the engine consumes.
    pub fn into_parts(self) -> Result<(Vec<ReadinessRule>, CategoryTable, BandTable), ManifestError> {
        let categories = CategoryTable {
            version: self.version.clone(),
            category1_points: self.risk_categories.category1_points,
            category2_points: self.risk_categories.category2_points,
            category3_points: self.risk_categories.category3_points,
            category4_points: self.risk_categories.category4_points,
            amenity_surcharge: self.risk_categories.amenity_surcharge,
        };
        let bands = BandTable::new(self.version.clone(), self.bands)?;

        let mut rules = Vec::with_capacity(self.rules.len());
        for spec in self.rules {
            let lookback =
                LookbackWindow::months(spec.lookback_months).map_err(|source| {
                    ManifestError::Rule {
                        key: spec.key.clone(),
                        source,
                    }
                })?;
            if spec.pack_types.is_empty() {
                return Err(ManifestError::Rule {
                    key: spec.key.clone(),
                    source: ValidationError("pack_types must not be empty".to_string()),
                });
            }
            rules.push(ReadinessRule {
                id: spec.id.map(RuleId::from).unwrap_or_default(),
                key: spec.key,
                name: spec.name,
                version: spec.version,
                pack_types: spec.pack_types,
                blocking: spec.blocking,
                lookback,
                check: spec.check,
                params: spec.params,
                active: spec.active,
            });
        }

        Ok((rules, categories, bands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST_YAML: &str = r#"
version: "2025.2"
risk_categories:
  category1_points: 60
  category2_points: 30
  category3_points: 10
  category4_points: 1
  amenity_surcharge: 8
bands:
  - band: A
    points_min: 0
    points_max: 19
    subsistence_multiplier: 1.0
  - band: B
    points_min: 20
    points_max: null
    subsistence_multiplier: 1.4
rules:
  - key: assessment_recency
    name: Classification assessment current
    pack_types: [regulator_pack]
    blocking: true
    lookback_months: 12
    check: assessment_recency
  - key: remediation_age
    name: Corrective actions within age limit
    pack_types: [regulator_pack, tender_pack]
    blocking: true
    lookback_months: 12
    check: remediation_age
    params:
      max_open_days: 45
"#;

    #[test]
    fn parses_yaml_manifest() {
        let manifest = RuleSetManifest::from_yaml_str(MANIFEST_YAML).unwrap();
        assert_eq!(manifest.version, "2025.2");
        assert_eq!(manifest.rules.len(), 2);
        // Omitted fields take their defaults.
        assert!(manifest.rules[0].active);
        assert_eq!(manifest.rules[0].version, "1");
    }

    #[test]
    fn into_parts_builds_typed_tables() {
        let manifest = RuleSetManifest::from_yaml_str(MANIFEST_YAML).unwrap();
        let (rules, categories, bands) = manifest.into_parts().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(categories.category1_points, 60);
        assert_eq!(bands.version(), "2025.2");
        assert_eq!(
            rules[1].params.get("max_open_days").and_then(|v| v.as_i64()),
            Some(45)
        );
    }

    #[test]
    fn malformed_band_table_is_fatal() {
        let yaml = MANIFEST_YAML.replace("points_min: 20", "points_min: 25");
        let manifest = RuleSetManifest::from_yaml_str(&yaml).unwrap();
        assert!(matches!(
            manifest.into_parts(),
            Err(ManifestError::Table(_))
        ));
    }

    #[test]
    fn zero_month_lookback_is_fatal() {
        let yaml = MANIFEST_YAML.replace("lookback_months: 12", "lookback_months: 0");
        let manifest = RuleSetManifest::from_yaml_str(&yaml).unwrap();
        assert!(matches!(manifest.into_parts(), Err(ManifestError::Rule { .. })));
    }

    #[test]
    fn default_manifest_is_valid() {
        let (rules, categories, bands) = RuleSetManifest::default_manifest()
            .into_parts()
            .unwrap();
        assert_eq!(rules.len(), 5);
        assert_eq!(categories.amenity_surcharge, 5);
        assert!(bands.match_score(0).is_some());
        // Every rule's check key resolves in the built-in registry.
        let registry = crate::checks::CheckRegistry::builtin();
        for rule in &rules {
            assert!(
                registry.get(&rule.check).is_some(),
                "unresolved check {}",
                rule.check
            );
        }
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST_YAML.as_bytes()).unwrap();
        let manifest = RuleSetManifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.version, "2025.2");
    }
}
