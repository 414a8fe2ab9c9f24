//! Key-value backed rate limiter

use chrono::Duration;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use aa_shared::validation::normalize_email;
use aa_shared::RateLimitPolicy;

use crate::domain::entities::resend_counter::ResendCounterState;
use crate::errors::{DomainResult, StoreError, VerificationError};
use crate::repositories::KeyValueStore;
use crate::services::clock::Clock;

/// Whether another attempt is allowed right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    /// `remaining` attempts are left in the current window
    Allowed { remaining: u32 },
    /// Quota used up; the window frees after `retry_after`
    Limited { retry_after: Duration },
}

impl RateLimitStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitStatus::Allowed { .. })
    }

    /// Whole seconds until the next attempt, rounded up
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateLimitStatus::Allowed { .. } => 0,
            RateLimitStatus::Limited { retry_after } => {
                let millis = retry_after.num_milliseconds().max(0) as u64;
                (millis + 999) / 1000
            }
        }
    }

    /// Convert a limited status into the error surfaced to the user
    pub fn into_result(self) -> Result<u32, VerificationError> {
        match self {
            RateLimitStatus::Allowed { remaining } => Ok(remaining),
            RateLimitStatus::Limited { .. } => Err(VerificationError::RateLimited {
                retry_after_secs: self.retry_after_secs(),
            }),
        }
    }
}

/// Storage key for an account's counter: `rate_limit:{purpose}:{sha256(normalized email)}`
pub fn rate_limit_key(purpose: &str, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_email(email).as_bytes());
    format!("rate_limit:{}:{}", purpose, hex::encode(hasher.finalize()))
}

/// Bounds attempts per account to `max_attempts` per rolling window.
///
/// The read-modify-write against the key-value store is not atomic, so the
/// limit is advisory when several devices share a store.
#[derive(Clone)]
pub struct ResendRateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    purpose: String,
    policy: RateLimitPolicy,
    enabled: bool,
}

impl ResendRateLimiter {
    /// Create a limiter whose counters live in `store`
    ///
    /// # Arguments
    /// * `store` - Key-value store the counters persist in
    /// * `clock` - Time source for the rolling window
    /// * `purpose` - Middle segment of the storage key, e.g. `resend`
    /// * `policy` - Attempts allowed per window
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        purpose: impl Into<String>,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            purpose: purpose.into(),
            policy,
            enabled: true,
        }
    }

    /// A disabled limiter allows everything and persists nothing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    fn window(&self) -> Duration {
        Duration::milliseconds(self.policy.window_ms())
    }

    /// Current status for an account; resets and persists an expired window
    pub async fn status(&self, email: &str) -> RateLimitStatus {
        if !self.enabled {
            return RateLimitStatus::Allowed {
                remaining: self.policy.max_attempts,
            };
        }

        let key = rate_limit_key(&self.purpose, email);
        let now = self.clock.now();
        let mut state = self.load(&key).await;

        if state.reset_if_elapsed(now, self.window()) {
            if let Err(e) = self.save(&key, &state).await {
                tracing::warn!(
                    purpose = %self.purpose,
                    error = %e,
                    event = "rate_limit_persist_failed",
                    "Failed to persist counter reset"
                );
            }
        }

        self.evaluate(&state, now)
    }

    pub async fn can_resend(&self, email: &str) -> bool {
        self.status(email).await.is_allowed()
    }

    /// Count one attempt and return the status after it
    pub async fn record_attempt(&self, email: &str) -> DomainResult<RateLimitStatus> {
        if !self.enabled {
            return Ok(RateLimitStatus::Allowed {
                remaining: self.policy.max_attempts,
            });
        }

        let key = rate_limit_key(&self.purpose, email);
        let now = self.clock.now();
        let mut state = self.load(&key).await;
        state.reset_if_elapsed(now, self.window());
        state.record(now);
        self.save(&key, &state).await?;

        let status = self.evaluate(&state, now);
        tracing::info!(
            purpose = %self.purpose,
            count = state.count,
            limit = self.policy.max_attempts,
            allowed = status.is_allowed(),
            event = "rate_limit_attempt_recorded",
            "Recorded attempt"
        );
        Ok(status)
    }

    /// Forget the counter for an account
    pub async fn reset(&self, email: &str) -> DomainResult<()> {
        let key = rate_limit_key(&self.purpose, email);
        self.store.remove_item(&key).await?;
        Ok(())
    }

    fn evaluate(&self, state: &ResendCounterState, now: chrono::DateTime<chrono::Utc>) -> RateLimitStatus {
        if state.count >= self.policy.max_attempts && !state.window_elapsed(now, self.window()) {
            return RateLimitStatus::Limited {
                retry_after: state.retry_after(now, self.window()),
            };
        }
        RateLimitStatus::Allowed {
            remaining: self.policy.max_attempts.saturating_sub(state.count),
        }
    }

    // Unreadable state counts as no prior attempts.
    async fn load(&self, key: &str) -> ResendCounterState {
        let raw = match self.store.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ResendCounterState::default(),
            Err(e) => {
                tracing::warn!(
                    purpose = %self.purpose,
                    error = %e,
                    event = "rate_limit_read_failed",
                    "Failed to read counter, assuming no prior attempts"
                );
                return ResendCounterState::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                purpose = %self.purpose,
                error = %e,
                event = "rate_limit_state_corrupt",
                "Discarding malformed counter"
            );
            ResendCounterState::default()
        })
    }

    async fn save(&self, key: &str, state: &ResendCounterState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state).map_err(|e| StoreError::Corrupt {
            message: e.to_string(),
        })?;
        self.store.set_item(key, &raw).await
    }
}
