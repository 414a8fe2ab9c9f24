//! Outcome of the verification gate.

use serde::{Deserialize, Serialize};

/// What the signed-in state of the user allows them to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// No session
    Unauthenticated,
    /// Session present, record missing or not verified
    NeedsVerification { email: String },
    /// Session present and record verified (or store unavailable under fail-open)
    Verified,
}

impl GateDecision {
    pub fn is_verified(&self) -> bool {
        matches!(self, GateDecision::Verified)
    }
}
