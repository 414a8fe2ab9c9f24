//! Shared key-value store on Redis
//!
//! Values expire after the configured default TTL; rate-limit windows are
//! far shorter, so only stale counters are lost.

use async_trait::async_trait;

use aa_core::errors::StoreError;
use aa_core::KeyValueStore;

use super::RedisClient;

pub struct RedisKeyValueStore {
    client: RedisClient,
}

impl RedisKeyValueStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.client.get(key).await?)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.client
            .set_with_expiry(key, value, self.client.default_ttl())
            .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.client.delete(key).await?;
        Ok(())
    }
}
