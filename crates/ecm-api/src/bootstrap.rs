//! # Service Bootstrap
//!
//! Loads the rule-set manifest at startup and assembles the application
//! state.
//!
//! ## Bootstrap Sequence
//!
//! 1. Resolve the manifest: the file named by `ECM_CONFIG`, or the
//!    compiled-in standard rule set when unset.
//! 2. Validate it into typed tables (rules, category points, bands).
//! 3. Assemble `AppState` with the in-memory reference stores.
//!
//! An invalid manifest is a fatal startup error — the service never
//! comes up with a silently-empty or half-parsed rule table.

use thiserror::Error;

use ecm_readiness::{ManifestError, RuleSetManifest};

use crate::state::{AppConfig, AppState};

/// Errors during service bootstrap.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The rule-set manifest could not be loaded or validated.
    #[error("rule-set manifest invalid: {0}")]
    Manifest(#[from] ManifestError),
}

/// Assemble application state from the environment.
///
/// Reads `ECM_CONFIG` for the manifest path; absent, the compiled-in
/// standard rule set applies.
pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let manifest_path = std::env::var("ECM_CONFIG").ok();
    bootstrap_with(config, manifest_path.as_deref())
}

/// Assemble application state from an explicit manifest path.
pub fn bootstrap_with(
    config: AppConfig,
    manifest_path: Option<&str>,
) -> Result<AppState, BootstrapError> {
    let manifest = match manifest_path {
        Some(path) => {
            tracing::info!(path, "loading rule-set manifest");
            RuleSetManifest::from_path(path)?
        }
        None => {
            tracing::info!("ECM_CONFIG not set; using compiled-in standard rule set");
            RuleSetManifest::default_manifest()
        }
    };
    tracing::info!(
        version = %manifest.version,
        rules = manifest.rules.len(),
        "rule-set manifest loaded"
    );
    Ok(AppState::from_manifest(config, manifest)?)
}
