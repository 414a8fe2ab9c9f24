//! Resend rate limiting with persisted counters and a rolling cooldown window

mod limiter;


pub use limiter::{rate_limit_key, RateLimitStatus, ResendRateLimiter};
