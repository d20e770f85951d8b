//! # API Route Modules
//!
//! Route modules for the ECM Stack engine surface:
//!
//! - `readiness` — dry-run readiness evaluation (read-only; identical
//!   logic to the generation gate).
//! - `packs` — pack creation (202, render out of band), pack snapshots
//!   with lazy expiry, active listings, and the render-completion
//!   callback driving finalization.
//! - `classification` — the classification dashboard read-model.
//!
//! Handlers contain no business logic — they translate DTOs, fetch the
//! tenant's rule configuration, and delegate to the domain crates.

pub mod classification;
pub mod packs;
pub mod readiness;
