//! Error types for authentication, verification, storage and input validation
//!
//! Messages are user-facing copy; the presentation layer may map the variants
//! to its own localised strings.

use aa_shared::validation::FieldError;
use thiserror::Error;

/// Authentication-related errors reported by the auth collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AccountExists,

    #[error("No active session")]
    SessionMissing,

    #[error("Session expired. Please sign in again")]
    SessionExpired,

    #[error("Reset code is invalid or has expired")]
    RecoveryCodeRejected,

    #[error("New password should be different from the old password")]
    SamePassword,

    #[error("Authentication provider error: {message}")]
    Provider { message: String },
}

/// Errors raised while issuing or checking a one-time code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Please enter the verification code")]
    EmptyCode,

    #[error("Invalid verification code")]
    CodeMismatch,

    #[error("Verification code expired. Please request a new code")]
    CodeExpired,

    #[error("No verification in progress")]
    NoActiveSession,

    #[error("A verification code is already being sent to this email")]
    DispatchInProgress,

    #[error("Too many attempts. Please try again in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Verification is not accepting codes in state {state}")]
    InvalidState { state: String },

    #[error("Could not confirm your verification. Please try again")]
    StatusUnconfirmed,

    #[error("Verify the reset code before choosing a new password")]
    ResetNotVerified,

    #[error("New password cannot be the same as your current password")]
    SamePassword,
}

impl VerificationError {
    /// Whole minutes until a rate-limited request may be retried, rounded up
    pub fn retry_after_minutes(&self) -> Option<u64> {
        match self {
            VerificationError::RateLimited { retry_after_secs } => {
                Some((retry_after_secs + 59) / 60)
            }
            _ => None,
        }
    }
}

/// Errors from the relational store and key-value persistence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store unreachable or schema missing
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Record already exists")]
    Duplicate,

    #[error("Stored value is malformed: {message}")]
    Corrupt { message: String },

    #[error("Store error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Whether the failure means the store itself cannot be used
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        match error.field.as_str() {
            "repeat_password" => ValidationError::PasswordMismatch,
            "email" if error.message.contains("required") => {
                ValidationError::RequiredField { field: error.field }
            }
            "email" => ValidationError::InvalidEmail,
            "password" if error.message.contains("required") => {
                ValidationError::RequiredField { field: error.field }
            }
            "password" => ValidationError::PasswordTooShort {
                min: first_number(&error.message).unwrap_or_default(),
            },
            _ => ValidationError::InvalidFormat { field: error.field },
        }
    }
}

fn first_number(message: &str) -> Option<usize> {
    message
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|part| part.parse().ok())
}
