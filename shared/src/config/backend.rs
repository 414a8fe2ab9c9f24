//! Hosted backend (auth + REST store) configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Connection settings for the hosted backend-as-a-service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public anonymous API key sent as `apikey`
    #[serde(default, skip_serializing)]
    pub anon_key: String,

    /// Table holding verification records
    #[serde(default = "default_profile_table")]
    pub profile_table: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:54321"),
            anon_key: String::new(),
            profile_table: default_profile_table(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl BackendConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("SUPABASE_URL").unwrap_or(defaults.url),
            anon_key: std::env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            profile_table: std::env::var("PROFILE_TABLE").unwrap_or(defaults.profile_table),
            request_timeout_secs: env_parse("BACKEND_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Base URL of the auth API
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }

    /// Base URL of the REST API
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }
}

fn default_profile_table() -> String {
    String::from("user_profile")
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let config = BackendConfig {
            url: "https://demo.supabase.co/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.auth_url(), "https://demo.supabase.co/auth/v1");
        assert_eq!(config.rest_url(), "https://demo.supabase.co/rest/v1");
        assert_eq!(config.profile_table, "user_profile");
    }
}
