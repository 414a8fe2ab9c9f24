//! Database configuration module

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Database configuration for the MySQL-backed verification store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Table holding verification records
    #[serde(default = "default_profile_table")]
    pub profile_table: String,

    /// Keep verification records in MySQL instead of the hosted REST store
    #[serde(default)]
    pub enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("mysql://localhost:3306/ahlianak"),
            max_connections: 5,
            connect_timeout: 30,
            profile_table: default_profile_table(),
            enabled: false,
        }
    }
}

impl DatabaseConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            connect_timeout: env_parse("DATABASE_CONNECT_TIMEOUT")
                .unwrap_or(defaults.connect_timeout),
            profile_table: std::env::var("PROFILE_TABLE").unwrap_or(defaults.profile_table),
            enabled: env_parse("DATABASE_ENABLED").unwrap_or(defaults.enabled),
        }
    }

    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

fn default_profile_table() -> String {
    String::from("user_profile")
}
