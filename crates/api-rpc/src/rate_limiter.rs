//! Rate Limiter (Token Bucket Algorithm)
//!
//! Guards the public write paths (queue submissions, logins) against floods.
//! Each caller key gets its own bucket, so one noisy client cannot starve
//! the rest. Tokens are tracked in thousandths so slow refill rates still
//! accrue between closely spaced requests.

use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

const MILLI: u64 = 1000;

/// Buckets kept before full ones are pruned
const PRUNE_THRESHOLD: usize = 1024;

/// Token buckets keyed by caller
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    max_tokens: u32,
    refill_rate: u32, // tokens per second
}

struct Bucket {
    milli_tokens: u64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_tokens` - Maximum burst size per key
    /// * `refill_rate` - Tokens added per second per key
    ///
    /// # Example
    /// Allow 10 requests/sec with burst of 60:
    /// `RateLimiter::new(60, 10)`
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_tokens,
            refill_rate,
        }
    }

    /// Check if a request from `key` is allowed (consumes 1 token)
    ///
    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();

        if buckets.len() >= PRUNE_THRESHOLD && !buckets.contains_key(key) {
            buckets.retain(|_, bucket| self.refilled(bucket, now) < self.capacity());
        }

        let capacity = self.capacity();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            milli_tokens: capacity,
            last_refill: now,
        });
        bucket.milli_tokens = self.refilled(bucket, now);
        bucket.last_refill = now;

        if bucket.milli_tokens >= MILLI {
            bucket.milli_tokens -= MILLI;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }

    fn capacity(&self) -> u64 {
        self.max_tokens as u64 * MILLI
    }

    fn refilled(&self, bucket: &Bucket, now: Instant) -> u64 {
        let elapsed_ms = now.duration_since(bucket.last_refill).as_millis() as u64;
        let refill = elapsed_ms.saturating_mul(self.refill_rate as u64);
        bucket.milli_tokens.saturating_add(refill).min(self.capacity())
    }
}
