//! Shared utilities and common types for the AhliAnak client services
//!
//! This crate provides common functionality used by the core and infra crates:
//! - Configuration types
//! - Logging initialisation
//! - Utility functions (email validation, log masking)

pub mod config;
pub mod logging;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, BackendConfig, CacheConfig, DatabaseConfig, EmailConfig, Environment,
    InfrastructureFailurePolicy, LoggingConfig, RateLimitConfig, RateLimitPolicy,
    StorageBackend, StorageConfig, VerificationConfig,
};
pub use logging::init_tracing;
pub use utils::{masking, validation};
