//! Cache module for Redis-backed shared state
//!
//! Provides a Redis client with retry logic and a `KeyValueStore` on top of
//! it, so rate-limit counters can be shared across devices.

pub mod redis_client;
pub mod redis_key_value;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use redis_key_value::RedisKeyValueStore;

// Re-export commonly used types
pub use aa_shared::CacheConfig;
