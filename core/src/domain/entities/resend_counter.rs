//! Persisted resend counter state for the rolling cooldown window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Attempts made within the current window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendCounterState {
    pub count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl ResendCounterState {
    /// True once `now - last_attempt_at` reaches the window, i.e. exactly when
    /// `retry_after` hits zero
    pub fn window_elapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.last_attempt_at {
            Some(last) => now - last >= window,
            None => true,
        }
    }

    /// Drops the count back to 0 if the window has elapsed; returns whether it did
    pub fn reset_if_elapsed(&mut self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.count > 0 && self.window_elapsed(now, window) {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn record(&mut self, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.last_attempt_at = Some(now);
    }

    /// Countdown until the window frees up: `window - (now - last_attempt_at)`, never negative
    pub fn retry_after(&self, now: DateTime<Utc>, window: Duration) -> Duration {
        match self.last_attempt_at {
            Some(last) => (window - (now - last)).max(Duration::zero()),
            None => Duration::zero(),
        }
    }
}
