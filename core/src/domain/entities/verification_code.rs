//! One-time numeric verification code entity for email-based verification.

use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lifetime of an issued code, as advertised in the email copy
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 30;

/// Width of the numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CodeFormat {
    /// 4 digits, generated in 1000..=9999
    #[default]
    FourDigit,
    /// 6 digits, generated in 0..=999999 and zero-padded
    SixDigit,
}

impl CodeFormat {
    /// Number of digits in the canonical form
    pub fn width(&self) -> usize {
        match self {
            CodeFormat::FourDigit => 4,
            CodeFormat::SixDigit => 6,
        }
    }

    /// Map a configured code length onto a format
    pub fn from_length(length: usize) -> Option<Self> {
        match length {
            4 => Some(CodeFormat::FourDigit),
            6 => Some(CodeFormat::SixDigit),
            _ => None,
        }
    }

    fn generation_range(&self) -> (u32, u32) {
        match self {
            CodeFormat::FourDigit => (1_000, 9_999),
            CodeFormat::SixDigit => (0, 999_999),
        }
    }
}

/// A one-time code held in canonical form
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    value: String,
    format: CodeFormat,
}

impl VerificationCode {
    /// Generates a fresh code from the operating system CSPRNG
    pub fn generate(format: CodeFormat) -> Self {
        let (low, high) = format.generation_range();
        let number = OsRng.gen_range(low..=high);
        Self {
            value: format!("{:0width$}", number, width = format.width()),
            format,
        }
    }

    /// Builds a code from a raw issued value such as `295` or `"0295"`
    pub fn from_issued(raw: &str, format: CodeFormat) -> Option<Self> {
        Self::canonicalize(raw, format).map(|value| Self { value, format })
    }

    /// Canonical form of a numeric code: trimmed, digits only, zero-padded to the format width.
    ///
    /// Returns `None` for empty input, non-digits or values wider than the format.
    pub fn canonicalize(raw: &str, format: CodeFormat) -> Option<String> {
        let digits = raw.trim();
        if digits.is_empty()
            || digits.len() > format.width()
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        let number: u32 = digits.parse().ok()?;
        Some(format!("{:0width$}", number, width = format.width()))
    }

    /// Compares a user-entered code against this one.
    ///
    /// The entry must be exactly as wide as the format, so a 4-digit entry never
    /// matches a 6-digit code and vice versa.
    pub fn matches(&self, entered: &str) -> bool {
        let entered = entered.trim();
        if entered.len() != self.format.width() {
            return false;
        }
        match Self::canonicalize(entered, self.format) {
            Some(candidate) => constant_time_eq(candidate.as_bytes(), self.value.as_bytes()),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn format(&self) -> CodeFormat {
        self.format
    }
}

// Codes never end up in debug logs by accident.
impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationCode")
            .field("value", &"****")
            .field("format", &self.format)
            .finish()
    }
}
