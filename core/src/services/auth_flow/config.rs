//! Configuration for the auth flow

use aa_shared::{AppConfig, RateLimitConfig, VerificationConfig};

/// Key-value key holding the onboarding flag
pub const ONBOARDING_COMPLETED_KEY: &str = "onboardingCompleted";

/// Rate-limit key purpose for verification code resends
pub const RESEND_PURPOSE: &str = "resend";

/// Rate-limit key purpose for password-reset requests
pub const PASSWORD_RESET_PURPOSE: &str = "password_reset";

/// Settings the auth flow is built with
#[derive(Debug, Clone)]
pub struct AuthFlowConfig {
    /// Code format and lifetime, store failure policy, password rules
    pub verification: VerificationConfig,
    /// Resend and password-reset limits
    pub rate_limit: RateLimitConfig,
    /// Product name used in email copy
    pub app_name: String,
}

impl Default for AuthFlowConfig {
    fn default() -> Self {
        Self {
            verification: VerificationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            app_name: "AhliAnak".to_string(),
        }
    }
}

impl AuthFlowConfig {
    /// Pick the auth flow sections out of the loaded application config
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            verification: config.verification.clone(),
            rate_limit: config.rate_limit.clone(),
            app_name: config.email.app_name.clone(),
        }
    }
}
