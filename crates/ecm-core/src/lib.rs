//! # ecm-core — Foundational Types for the ECM Stack
//!
//! This crate is the bedrock of the ECM Stack. It defines the type-system
//! primitives shared by every other crate in the workspace; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `CompanyId`, `SiteId`,
//!    `PackId`, `RuleId` and friends are all UUID newtypes — you cannot pass
//!    a site identifier where a pack identifier is expected.
//!
//! 2. **Temporal types carry their own arithmetic.** Lookback windows are
//!    resolved through [`LookbackWindow`] and [`WindowAnchor`] so standard
//!    and relaxed windows share one calendar-month code path.
//!
//! 3. **Artifact digests are validated at construction.** [`ArtifactDigest`]
//!    only ever holds 64 lowercase hex characters of SHA-256 output.
//!
//! 4. **Audit is an abstraction, not a log line.** Every state transition
//!    and safeguard decision flows through [`AuditSink`], which downstream
//!    deployments point at an append-only trail.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ecm-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a persistence seam.

pub mod audit;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use digest::ArtifactDigest;
pub use error::{StateError, ValidationError};
pub use identity::{
    CompanyId, DocumentId, EvidenceId, IncidentId, ObligationId, PackId, RemediationId, RuleId,
    SiteId,
};
pub use temporal::{ComplianceYear, LookbackWindow, WindowAnchor};
