//! # Pack Status
//!
//! The lifecycle states of a regulatory pack and the per-transition
//! audit record kept on the pack itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a regulatory pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackStatus {
    /// Created but not yet gated; most requests pass straight through.
    Draft,
    /// Readiness gate passed; the render job is in flight.
    Generating,
    /// Rendered and re-checked; available to download until expiry.
    Ready,
    /// Blocked at creation, render error, or re-check failure (terminal).
    Failed,
    /// Soft-expired after its validity window (terminal).
    Expired,
}

impl PackStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Expired)
    }

    /// Whether the pack should appear in "active" listings.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Draft | Self::Generating | Self::Ready)
    }
}

impl std::fmt::Display for PackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Generating => "GENERATING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Record of a single pack state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackTransitionRecord {
    /// State before the transition.
    pub from_status: PackStatus,
    /// State after the transition.
    pub to_status: PackStatus,
    /// When the transition occurred.
    pub occurred_at: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(PackStatus::Failed.is_terminal());
        assert!(PackStatus::Expired.is_terminal());
        assert!(!PackStatus::Draft.is_terminal());
        assert!(!PackStatus::Generating.is_terminal());
        assert!(!PackStatus::Ready.is_terminal());
    }

    #[test]
    fn expired_and_failed_are_not_active() {
        assert!(!PackStatus::Expired.is_active());
        assert!(!PackStatus::Failed.is_active());
        assert!(PackStatus::Ready.is_active());
    }

    #[test]
    fn display_is_screaming_snake() {
        assert_eq!(PackStatus::Generating.to_string(), "GENERATING");
        assert_eq!(PackStatus::Ready.to_string(), "READY");
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&PackStatus::Generating).unwrap();
        assert_eq!(json, "\"GENERATING\"");
    }
}
