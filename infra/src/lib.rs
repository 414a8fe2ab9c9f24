//! # Infrastructure Layer
//!
//! Concrete adapters for the collaborator traits defined in `aa_core`:
//!
//! - **Backend**: hosted auth (GoTrue REST) and the PostgREST verification store
//! - **Database**: MySQL verification store using SQLx
//! - **Cache**: Redis client and a shared key-value store for rate-limit counters
//! - **Email**: transactional email over HTTP, plus a logging sender for development
//! - **Storage**: device-local key-value file
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis key-value support (default)

use std::sync::Arc;

use aa_core::errors::StoreError;
use aa_core::{
    Collaborators, InMemoryKeyValueStore, KeyValueStore, SystemClock,
    VerificationRecordRepository,
};
use aa_shared::{AppConfig, StorageBackend};

/// Hosted backend module - auth and REST store over HTTP
pub mod backend;

/// Cache module - Redis client and shared key-value store
#[cfg(feature = "redis-cache")]
pub mod cache;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Email module - transactional email senders
pub mod email;

/// Storage module - device-local persistence
pub mod storage;

pub use backend::{PostgrestVerificationRecordRepository, SupabaseAuthProvider};
pub use email::{create_email_sender, LoggingEmailSender, ResendEmailSender};
pub use storage::FileKeyValueStore;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file error
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email service error
    #[error("Email service error: {0}")]
    Email(String),
}

impl From<InfrastructureError> for StoreError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Http(e) if e.is_connect() || e.is_timeout() => {
                StoreError::Unavailable {
                    reason: e.to_string(),
                }
            }
            #[cfg(feature = "redis-cache")]
            InfrastructureError::Cache(e) if e.is_io_error() || e.is_connection_dropped() => {
                StoreError::Unavailable {
                    reason: e.to_string(),
                }
            }
            other => StoreError::Backend {
                message: other.to_string(),
            },
        }
    }
}

/// Build the full collaborator set from configuration.
///
/// The auth provider always talks to the hosted backend. Records follow
/// `database.enabled` and the key-value store follows `storage.backend`.
pub async fn initialize(config: &AppConfig) -> Result<Collaborators, InfrastructureError> {
    tracing::info!(
        environment = ?config.environment,
        storage = ?config.storage.backend,
        mysql_records = config.database.enabled,
        email_provider = %config.email.provider,
        "Initializing infrastructure services..."
    );

    let auth = Arc::new(SupabaseAuthProvider::new(config.backend.clone())?);
    let records = create_record_repository(config, &auth).await?;
    let key_value = create_key_value_store(config).await?;
    let email = create_email_sender(&config.email);

    tracing::info!("Infrastructure services initialized successfully");

    Ok(Collaborators {
        auth,
        records,
        email,
        key_value,
        clock: Arc::new(SystemClock),
    })
}

/// MySQL when `database.enabled`, otherwise the hosted REST store
pub async fn create_record_repository(
    config: &AppConfig,
    auth: &Arc<SupabaseAuthProvider>,
) -> Result<Arc<dyn VerificationRecordRepository>, InfrastructureError> {
    if config.database.enabled {
        return open_mysql_records(config).await;
    }

    Ok(Arc::new(
        PostgrestVerificationRecordRepository::new(config.backend.clone())?
            .with_auth(auth.clone()),
    ))
}

#[cfg(feature = "mysql")]
async fn open_mysql_records(
    config: &AppConfig,
) -> Result<Arc<dyn VerificationRecordRepository>, InfrastructureError> {
    let pool = database::DatabasePool::new(config.database.clone()).await?;
    let repository = database::MySqlVerificationRecordRepository::new(
        pool.get_pool().clone(),
        config.database.profile_table.clone(),
    )?;
    repository.ensure_table().await?;
    Ok(Arc::new(repository))
}

#[cfg(not(feature = "mysql"))]
async fn open_mysql_records(
    _config: &AppConfig,
) -> Result<Arc<dyn VerificationRecordRepository>, InfrastructureError> {
    Err(InfrastructureError::Config(
        "MySQL records require the mysql feature".to_string(),
    ))
}

/// Key-value store selected by `storage.backend`
pub async fn create_key_value_store(
    config: &AppConfig,
) -> Result<Arc<dyn KeyValueStore>, InfrastructureError> {
    match config.storage.backend {
        StorageBackend::File => Ok(Arc::new(
            FileKeyValueStore::open(&config.storage.path).await?,
        )),
        StorageBackend::Memory => Ok(Arc::new(InMemoryKeyValueStore::new())),
        #[cfg(feature = "redis-cache")]
        StorageBackend::Redis => {
            let client = cache::RedisClient::new(config.cache.clone()).await?;
            Ok(Arc::new(cache::RedisKeyValueStore::new(client)))
        }
        #[cfg(not(feature = "redis-cache"))]
        StorageBackend::Redis => Err(InfrastructureError::Config(
            "Redis storage requires the redis-cache feature".to_string(),
        )),
    }
}
