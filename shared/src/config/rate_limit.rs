//! Rate limiting configuration module
//!
//! Resend and password-reset limits share one policy shape. They are kept
//! as two instances because the product copy advertises different windows.

use serde::{Deserialize, Serialize};

use super::env_parse;

/// A rolling-window attempt limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitPolicy {
    /// Maximum attempts allowed inside one window
    pub max_attempts: u32,

    /// Window length in seconds, measured from the last attempt
    pub window_seconds: u64,
}

impl RateLimitPolicy {
    /// Create a new policy
    pub fn new(max_attempts: u32, window_seconds: u64) -> Self {
        Self {
            max_attempts,
            window_seconds,
        }
    }

    /// Window length in milliseconds
    pub fn window_ms(&self) -> i64 {
        (self.window_seconds as i64).saturating_mul(1000)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Verification code resend limit
    #[serde(default = "default_resend_policy")]
    pub resend: RateLimitPolicy,

    /// Password reset request limit
    #[serde(default = "default_password_reset_policy")]
    pub password_reset: RateLimitPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            resend: default_resend_policy(),
            password_reset: default_password_reset_policy(),
        }
    }
}

impl RateLimitConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_parse("RATE_LIMIT_ENABLED").unwrap_or(defaults.enabled),
            resend: RateLimitPolicy {
                max_attempts: env_parse("RESEND_MAX_ATTEMPTS")
                    .unwrap_or(defaults.resend.max_attempts),
                window_seconds: env_parse("RESEND_WINDOW_SECONDS")
                    .unwrap_or(defaults.resend.window_seconds),
            },
            password_reset: RateLimitPolicy {
                max_attempts: env_parse("PASSWORD_RESET_MAX_ATTEMPTS")
                    .unwrap_or(defaults.password_reset.max_attempts),
                window_seconds: env_parse("PASSWORD_RESET_WINDOW_SECONDS")
                    .unwrap_or(defaults.password_reset.window_seconds),
            },
        }
    }

    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            enabled: true,
            resend: RateLimitPolicy::new(20, 15 * 60),
            password_reset: RateLimitPolicy::new(10, 30 * 60),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_resend_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(5, 15 * 60) // 5 per 15 minutes
}

fn default_password_reset_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(3, 30 * 60) // 3 per 30 minutes
}
