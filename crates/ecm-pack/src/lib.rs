//! # ecm-pack — Regulatory Pack Lifecycle
//!
//! Owns the pack state machine and orchestrates the classification
//! scorer, the readiness rule engine, and the safeguard policies to
//! decide legal state transitions.
//!
//! ## Lifecycle
//!
//! ```text
//! DRAFT ──▶ GENERATING ──▶ READY ──▶ EXPIRED
//!   │            │
//!   │            └──▶ FAILED (render error or re-check failure)
//!   └──▶ FAILED (blocked at creation; auditable record, no job dispatched)
//! ```
//!
//! ## Invariants
//!
//! - A pack never reaches `READY` while any blocking failure exists in
//!   its finalization re-check. Readiness is re-evaluated when the render
//!   completes, not just at enqueue time.
//! - Evaluation snapshots on a pack are immutable. Regenerating creates
//!   a new pack record; the original's snapshots are a permanent audit
//!   artifact.
//! - Invalid transitions are errors, never no-ops. Per-pack transitions
//!   are strictly ordered; there is no cross-pack ordering or global
//!   lock.

pub mod lifecycle;
pub mod metadata;
pub mod pack;
pub mod status;

pub use lifecycle::{
    CreateOutcome, DispatchError, JobHandle, LifecycleError, PackLifecycleManager, PackStore,
    RenderDispatcher, RenderInputs, RenderOutcome, RuleContext, StoreError,
};
pub use metadata::{build_metadata, ClassificationSummary, MetadataInputs, PackMetadata};
pub use pack::{PackArtifact, RegulatoryPack};
pub use status::{PackStatus, PackTransitionRecord};
