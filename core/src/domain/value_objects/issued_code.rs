//! Result of issuing a one-time code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::verification_code::VerificationCode;

/// What a dispatch is for; separates in-flight guards and log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    EmailVerification,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::EmailVerification => "verification",
            CodePurpose::PasswordReset => "password_reset",
        }
    }
}

/// How the code reached the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeDelivery {
    /// Accepted by the email provider
    Emailed { message_id: String },
    /// Dispatch failed; the code must be shown on screen
    Fallback,
}

/// A code together with its lifetime and delivery channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: VerificationCode,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub delivery: CodeDelivery,
}

impl IssuedCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.delivery, CodeDelivery::Fallback)
    }

    /// The code to display when email delivery failed
    pub fn fallback_code(&self) -> Option<&str> {
        self.is_fallback().then(|| self.code.as_str())
    }
}
