//! Redis client for the shared counter store
//!
//! Wraps a multiplexed connection and retries transient failures with
//! exponential backoff. Keys are namespaced with the configured prefix.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client, ErrorKind, RedisError, RedisResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use aa_shared::CacheConfig;

use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

const MAX_BACKOFF_MS: u64 = 5_000;

/// Doubling delay capped at `MAX_BACKOFF_MS`
struct Backoff {
    attempt: u32,
    max_attempts: u32,
    delay_ms: u64,
}

impl Backoff {
    fn new(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            delay_ms: initial_delay_ms,
        }
    }

    fn start_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        self.delay_ms = (self.delay_ms * 2).min(MAX_BACKOFF_MS);
    }
}

#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    config: CacheConfig,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl RedisClient {
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        Self::new_with_retry_config(config, 3, 100).await
    }

    /// Connect, retrying up to `max_retries` times within `connection_timeout`
    pub async fn new_with_retry_config(
        config: CacheConfig,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, InfrastructureError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| InfrastructureError::Config(format!("Invalid Redis URL: {}", e)))?;

        let timeout = Duration::from_secs(config.connection_timeout);
        let connection = tokio::time::timeout(timeout, connect(&client, max_retries, retry_delay_ms))
            .await
            .map_err(|_| {
                InfrastructureError::Config(format!(
                    "Redis connection timed out after {}s",
                    config.connection_timeout
                ))
            })??;

        tracing::info!(
            url = %mask_url(&config.url),
            prefix = ?config.key_prefix,
            event = "redis_connected",
            "Redis client ready"
        );
        Ok(Self {
            connection,
            config,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Namespaced key
    pub fn key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    pub fn default_ttl(&self) -> u64 {
        self.config.default_ttl
    }

    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        let key = self.key(key);
        let value = value.to_string();
        self.run("SETEX", &key, move |mut conn, key| {
            let value = value.clone();
            Box::pin(async move { conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await })
        })
        .await
    }

    /// `None` when missing or expired
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        let key = self.key(key);
        self.run("GET", &key, |mut conn, key| {
            Box::pin(async move { conn.get::<_, Option<String>>(key).await })
        })
        .await
    }

    /// Returns whether the key existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        let key = self.key(key);
        let deleted: u32 = self
            .run("DEL", &key, |mut conn, key| {
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await?;
        Ok(deleted > 0)
    }

    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let reply: String = self
            .run("PING", "", |mut conn, _| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;
        Ok(reply == "PONG")
    }

    async fn run<F, T>(&self, command: &str, key: &str, operation: F) -> Result<T, InfrastructureError>
    where
        F: Fn(MultiplexedConnection, String) -> RedisFuture<T>,
    {
        let mut backoff = Backoff::new(self.max_retries, self.retry_delay_ms);
        loop {
            let attempt = backoff.start_attempt();
            match operation(self.connection.clone(), key.to_string()).await {
                Ok(value) => return Ok(value),
                Err(e) if backoff.can_retry() && is_retriable_error(&e) => {
                    tracing::warn!(
                        command = command,
                        attempt = attempt,
                        error = %e,
                        "Redis command failed, retrying"
                    );
                    backoff.wait().await;
                }
                Err(e) => {
                    tracing::error!(command = command, key = %key, error = %e, "Redis command failed");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }
}

async fn connect(
    client: &Client,
    max_retries: u32,
    retry_delay_ms: u64,
) -> Result<MultiplexedConnection, InfrastructureError> {
    let mut backoff = Backoff::new(max_retries, retry_delay_ms);
    loop {
        let attempt = backoff.start_attempt();
        match client.get_multiplexed_async_connection().await {
            Ok(connection) => return Ok(connection),
            Err(e) if backoff.can_retry() => {
                tracing::warn!(attempt = attempt, error = %e, "Redis connect failed, retrying");
                backoff.wait().await;
            }
            Err(e) => return Err(InfrastructureError::Cache(e)),
        }
    }
}

/// Transient failures worth another attempt
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::IoError | ErrorKind::ClientError | ErrorKind::BusyLoadingError | ErrorKind::TryAgain
    )
}

/// Hide credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
