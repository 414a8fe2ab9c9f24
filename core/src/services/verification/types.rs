//! Types for the verification state machine

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    AwaitingCode,
    Verifying,
    Verified,
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerificationState::AwaitingCode => "awaiting_code",
            VerificationState::Verifying => "verifying",
            VerificationState::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Answer to a back-navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Leaving abandons verification; ask the user first
    ConfirmationRequired,
    Allowed,
}
