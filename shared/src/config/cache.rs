//! Redis settings for the shared counter store

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Redis configuration, used when rate-limit counters are shared across devices
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub url: String,

    /// Seconds allowed for the initial connect, retries included
    pub connection_timeout: u64,

    /// Seconds a counter survives without being touched
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,

    /// Namespace prepended as `prefix:key`
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            connection_timeout: 5,
            default_ttl: default_ttl(),
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    /// `REDIS_URL`, `REDIS_CONNECTION_TIMEOUT`, `REDIS_DEFAULT_TTL`, `REDIS_KEY_PREFIX`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connection_timeout: env_parse("REDIS_CONNECTION_TIMEOUT")
                .unwrap_or(defaults.connection_timeout),
            default_ttl: env_parse("REDIS_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            key_prefix: std::env::var("REDIS_KEY_PREFIX").ok(),
        }
    }

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn default_ttl() -> u64 {
    86_400 // 1 day
}
