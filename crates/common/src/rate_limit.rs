//! Token bucket rate limiting.
//!
//! One bucket guards a whole class of operations for the process (comment
//! creation in the daemon). It is a coarse abuse guard, not a fairness
//! mechanism: a single aggressive client can drain the burst for everyone.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Configuration for a token bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens added back per second
    pub rate_per_sec: f64,
    /// Bucket capacity, i.e. how many operations may happen back to back
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: 1.0,
            burst: 5,
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Operation may proceed, one token was consumed
    Allowed,
    /// Operation is rejected
    Limited {
        /// Time until one token will be available again
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token bucket. Checks never block beyond the internal mutex and
/// never queue: an empty bucket rejects immediately.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter whose bucket starts full
    pub fn new(config: RateLimitConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    fn starting_at(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(config.burst),
                last_refill: now,
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Try to consume one token now
    pub fn check(&self) -> RateLimitResult {
        self.check_at(Instant::now())
    }

    /// Try to consume one token as of `now`
    pub fn check_at(&self, now: Instant) -> RateLimitResult {
        let rate = self.config.rate_per_sec;
        let capacity = f64::from(self.config.burst);

        let mut bucket = self.bucket.lock();

        // instants from a caller that raced behind us refill nothing
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if rate > 0.0 {
            bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * rate).min(capacity);
        }
        if now > bucket.last_refill {
            bucket.last_refill = now;
        }

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return RateLimitResult::Allowed;
        }

        // a tiny rate can push the wait past what Duration holds
        let retry_after = if rate > 0.0 {
            Duration::try_from_secs_f64((1.0 - bucket.tokens) / rate).unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };
        RateLimitResult::Limited { retry_after }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
