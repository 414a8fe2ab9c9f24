//! Key-value persistence configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which key-value backend holds device state (resend counters, onboarding flag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on the device; counters are per device
    #[default]
    File,
    /// Redis; counters are shared by every device of an account
    Redis,
    /// Process memory; lost on restart
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Key-value storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// File used by the file backend
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
        }
    }
}

impl StorageConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            backend: std::env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            path: std::env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_path()),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("data/device_storage.json")
}
