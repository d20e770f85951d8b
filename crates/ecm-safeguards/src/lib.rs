//! # ecm-safeguards — Governance Safeguard Policies
//!
//! Three independent, composable overlays that narrow what a pack may
//! disclose or relax how readiness is measured — they never gate whether
//! a pack may be generated at all:
//!
//! - [`adoption`] — first-year adoption mode: relaxed lookback windows
//!   behind a hard expiry.
//! - [`board`] — board-pack detail level: `DETAILED` content requires a
//!   standing approval; absent approval the level silently downgrades.
//! - [`tender`] — tender-pack incident disclosure: incident statistics
//!   appear only behind an explicit, justified opt-in, at exactly the
//!   opted-in granularity.
//!
//! Each policy is a pure function over its own inputs. Policies never
//! communicate with each other, and a missing approval in one never
//! blocks the others.

pub mod adoption;
pub mod board;
pub mod tender;

pub use adoption::{
    effective_lookback, AdoptionMode, CompanyAdoptionConfig, EffectiveLookback, RelaxedRule,
};
pub use board::{resolve_detail_level, BoardPackDetailRequest, DetailDecision, PackDetailLevel};
pub use tender::{
    disclose_incidents, IncidentDisclosure, IncidentDisclosureLevel, IncidentSeverity,
    IncidentStatistics, IncidentSummary, TenderPackIncidentOptIn,
};
