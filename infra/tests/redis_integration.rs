//! Integration tests for Redis-backed shared counters
//!
//! These tests require a running Redis instance to execute.
//! Run with: cargo test -p aa_infra --test redis_integration -- --ignored

use std::sync::Arc;

use aa_core::services::ResendRateLimiter;
use aa_core::{KeyValueStore, SystemClock};
use aa_infra::cache::{CacheConfig, RedisClient, RedisKeyValueStore};
use aa_shared::RateLimitPolicy;

async fn store(prefix: &str) -> Arc<dyn KeyValueStore> {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let client = RedisClient::new(CacheConfig::new(url).with_prefix(prefix))
        .await
        .expect("Failed to connect to Redis");
    Arc::new(RedisKeyValueStore::new(client))
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_counter_shared_between_devices() {
    let prefix = format!("aa_it_{}", std::process::id());
    let policy = RateLimitPolicy::new(2, 60);

    let phone = ResendRateLimiter::new(store(&prefix).await, Arc::new(SystemClock), "resend", policy);
    let tablet = ResendRateLimiter::new(store(&prefix).await, Arc::new(SystemClock), "resend", policy);

    phone.record_attempt("a@b.com").await.unwrap();
    tablet.record_attempt("a@b.com").await.unwrap();

    assert!(!phone.can_resend("a@b.com").await);
    assert!(!tablet.can_resend("a@b.com").await);

    phone.reset("a@b.com").await.unwrap();
    assert!(tablet.can_resend("a@b.com").await);
}
