//! Application settings, loaded from `.env` files and the process environment
//!
//! - `backend` - Hosted auth and REST store endpoints
//! - `cache` - Redis configuration for shared counters
//! - `database` - MySQL connection for the verification store
//! - `email` - Transactional email provider
//! - `environment` - Environment detection and logging configuration
//! - `rate_limit` - Resend and password-reset limits
//! - `storage` - Device key-value persistence
//! - `verification` - Code format, expiry and gate failure policy

pub mod backend;
pub mod cache;
pub mod database;
pub mod email;
pub mod environment;
pub mod rate_limit;
pub mod storage;
pub mod verification;

use serde::{Deserialize, Serialize};

pub use backend::BackendConfig;
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::{RateLimitConfig, RateLimitPolicy};
pub use storage::{StorageBackend, StorageConfig};
pub use verification::{InfrastructureFailurePolicy, VerificationConfig};

/// Every setting the app reads at start-up
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Key-value storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            logging: LoggingConfig::for_environment(env),
            verification: VerificationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            email: EmailConfig::default(),
            backend: BackendConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// In-memory storage and relaxed resend limits
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            logging: LoggingConfig::for_environment(Environment::Development),
            rate_limit: RateLimitConfig::development(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load configuration from the environment, reading `.env` files first
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let env = Environment::from_env();
        dotenvy::from_filename(env.env_file()).ok();

        Self {
            environment: env,
            logging: LoggingConfig::from_env(env),
            verification: VerificationConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            email: EmailConfig::from_env(),
            backend: BackendConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// Parse an environment variable, `None` when unset or malformed
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert!(config.environment.is_development());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.rate_limit.resend.max_attempts, 20);
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: AppConfig =
            serde_json::from_str(r#"{"environment": "production"}"#).unwrap();
        assert!(config.environment.is_production());
        assert_eq!(config.verification.code_length, 4);
        assert_eq!(config.backend.profile_table, "user_profile");
    }
}
