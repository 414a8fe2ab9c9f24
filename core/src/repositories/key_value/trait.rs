//! Key-value persistence used for rate-limit counters and the onboarding flag.

use async_trait::async_trait;

use crate::errors::StoreError;

/// String key-value persistence, device-local or shared depending on the adapter
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}
