//! # Error Types — Structured Error Hierarchy
//!
//! Core error types shared across the ECM Stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - State machine errors include the current state and the attempted
//!   transition; an invalid transition is an error, never a silent no-op.
//! - Validation errors are raised before any rule evaluation runs and
//!   never leave a partially-created record behind.

use thiserror::Error;

/// Errors raised by lifecycle state machines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid pack transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state name.
        from: String,
        /// Attempted target state name.
        to: String,
    },

    /// The record is in a terminal state and accepts no transitions.
    #[error("pack is in terminal state {state}")]
    TerminalState {
        /// The terminal state name.
        state: String,
    },
}

/// A malformed request or configuration value, rejected before any
/// evaluation or persistence takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation error: {0}")]
pub struct ValidationError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_display_names_both_states() {
        let err = StateError::InvalidTransition {
            from: "READY".to_string(),
            to: "GENERATING".to_string(),
        };
        assert_eq!(err.to_string(), "invalid pack transition: READY -> GENERATING");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError("site_ids must not be empty".to_string());
        assert_eq!(err.to_string(), "validation error: site_ids must not be empty");
    }
}
