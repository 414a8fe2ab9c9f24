//! Email verification configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// What the gate does when the verification store cannot be reached
/// or its table does not exist yet.
///
/// `FailOpen` lets the user through. It keeps first deployments usable
/// before the schema exists, and is a security gap if left on afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureFailurePolicy {
    /// Treat the user as verified
    #[default]
    FailOpen,
    /// Treat the user as unverified
    FailClosed,
}

impl std::str::FromStr for InfrastructureFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            _ => Err(format!("Invalid failure policy: {}", s)),
        }
    }
}

/// Verification code configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Number of digits in a verification code (4 or 6)
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Lifetime advertised in the email, in minutes
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,

    /// Reject codes older than `code_ttl_minutes`
    #[serde(default = "default_enforce_expiry")]
    pub enforce_code_expiry: bool,

    /// Gate behaviour when the verification store is unavailable
    #[serde(default)]
    pub store_failure_policy: InfrastructureFailurePolicy,

    /// Minimum password length accepted by sign-in, sign-up and reset
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            code_ttl_minutes: default_code_ttl_minutes(),
            enforce_code_expiry: default_enforce_expiry(),
            store_failure_policy: InfrastructureFailurePolicy::default(),
            min_password_length: default_min_password_length(),
        }
    }
}

impl VerificationConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            code_length: env_parse("VERIFICATION_CODE_LENGTH").unwrap_or(defaults.code_length),
            code_ttl_minutes: env_parse("VERIFICATION_CODE_TTL_MINUTES")
                .unwrap_or(defaults.code_ttl_minutes),
            enforce_code_expiry: env_parse("VERIFICATION_ENFORCE_EXPIRY")
                .unwrap_or(defaults.enforce_code_expiry),
            store_failure_policy: env_parse("VERIFICATION_STORE_FAILURE_POLICY")
                .unwrap_or(defaults.store_failure_policy),
            min_password_length: env_parse("MIN_PASSWORD_LENGTH")
                .unwrap_or(defaults.min_password_length),
        }
    }
}

fn default_code_length() -> usize {
    4
}

fn default_code_ttl_minutes() -> i64 {
    30
}

fn default_enforce_expiry() -> bool {
    true
}

fn default_min_password_length() -> usize {
    6
}
