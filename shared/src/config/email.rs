//! Transactional email configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Configuration for the transactional email sender
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// Email provider ("resend", "log")
    pub provider: String,

    /// Endpoint accepting `POST` with a JSON message
    pub api_url: String,

    /// Bearer token for the provider API
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Sender mailbox, e.g. `AhliAnak <verification@ahlianak.com>`
    pub from: String,

    /// Product name used in email copy
    pub app_name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: String::from("log"),
            api_url: String::from("https://api.resend.com/emails"),
            api_key: String::new(),
            from: String::from("AhliAnak <verification@ahlianak.com>"),
            app_name: String::from("AhliAnak"),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl EmailConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("EMAIL_PROVIDER").unwrap_or(defaults.provider),
            api_url: std::env::var("EMAIL_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            from: std::env::var("EMAIL_FROM").unwrap_or(defaults.from),
            app_name: std::env::var("APP_NAME").unwrap_or(defaults.app_name),
            request_timeout_secs: env_parse("EMAIL_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
