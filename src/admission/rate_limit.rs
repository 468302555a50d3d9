//! Per-key token bucket rate limiting.
//!
//! Buckets refill in whole intervals: every `interval` adds `refill_rate`
//! tokens, capped at `capacity`. A bucket is created full the first time its
//! key is seen and is only dropped once it has sat full and idle.

use dashmap::DashMap;
use tokio::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Shape of every bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    pub capacity: u32,
    pub refill_rate: u32,
    pub interval: Duration,
}

impl From<&RateLimitConfig> for BucketPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            capacity: config.capacity,
            refill_rate: config.refill_rate,
            interval: Duration::from_secs(config.interval_secs),
        }
    }
}

/// Outcome of a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Granted { remaining: u32 },
    Denied { retry_after: Duration },
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Acquire::Granted { .. })
    }
}

/// A single token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, policy: &BucketPolicy, now: Instant) {
        let interval = policy.interval.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(self.last_refill).as_nanos();
        let intervals = elapsed / interval;

        if intervals > 0 {
            let added = intervals.saturating_mul(u128::from(policy.refill_rate));
            let tokens = (u128::from(self.tokens) + added).min(u128::from(policy.capacity));
            self.tokens = tokens as u32;
            let advanced = u64::try_from(intervals * interval).unwrap_or(u64::MAX);
            self.last_refill += Duration::from_nanos(advanced);
        }

        // Capacity may have shrunk on reload.
        self.tokens = self.tokens.min(policy.capacity);
        if self.tokens == policy.capacity {
            self.last_refill = now;
        }
    }

    fn try_acquire(&mut self, policy: &BucketPolicy, cost: u32, now: Instant) -> Acquire {
        self.refill(policy, now);
        self.last_seen = now;

        if self.tokens >= cost {
            self.tokens -= cost;
            return Acquire::Granted {
                remaining: self.tokens,
            };
        }

        let missing = cost - self.tokens;
        let refill = policy.refill_rate.max(1);
        let intervals_needed = missing.div_ceil(refill);
        let ready_at = self.last_refill + policy.interval * intervals_needed;
        Acquire::Denied {
            retry_after: ready_at.saturating_duration_since(now),
        }
    }

    fn is_idle(&mut self, policy: &BucketPolicy, idle: Duration, now: Instant) -> bool {
        self.refill(policy, now);
        self.tokens == policy.capacity && now.saturating_duration_since(self.last_seen) >= idle
    }
}

/// Concurrent map of buckets keyed by request characteristic.
///
/// Each key's bucket is updated under its map shard lock, so concurrent
/// requests for one key never double-spend or lose tokens.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take `cost` tokens from the bucket for `key`.
    pub fn check(&self, key: &str, policy: &BucketPolicy, cost: u32) -> Acquire {
        let now = Instant::now();
        if let Some(mut bucket) = self.buckets.get_mut(key) {
            return bucket.try_acquire(policy, cost, now);
        }

        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(policy.capacity, now))
            .try_acquire(policy, cost, now)
    }

    /// Drop buckets that are full and untouched for at least `idle`.
    pub fn evict_idle(&self, policy: &BucketPolicy, idle: Duration) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| !bucket.is_idle(policy, idle, now));
        before.saturating_sub(self.buckets.len())
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
