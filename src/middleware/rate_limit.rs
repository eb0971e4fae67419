//! Per-client token-bucket rate limiting.
//!
//! Each client (keyed by peer IP, or `unknown` when the address is not
//! known) owns a bucket holding up to `burst_size` tokens, refilled at
//! `requests_per_second`. A request takes one token; an empty bucket answers
//! `429 Too Many Requests` without running the rest of the chain.
//!
//! A bucket left idle long enough to refill completely is indistinguishable
//! from a fresh one, so such buckets are dropped at most once per
//! [`PRUNE_INTERVAL`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::http::StatusCode;

use crate::config::RateLimitConfig;
use crate::http::{RequestContext, Response};
use crate::middleware::{ChainResult, Middleware, Next};

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Minimum time between two sweeps of idle buckets.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

struct Buckets {
    clients: HashMap<String, TokenBucket>,
    last_prune: Instant,
}

pub struct RateLimiter {
    buckets: Mutex<Buckets>,
    rps: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            buckets: Mutex::new(Buckets {
                clients: HashMap::new(),
                last_prune: Instant::now(),
            }),
            rps: f64::from(requests_per_second),
            burst: f64::from(burst_size),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }

    /// Take a token for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(buckets.last_prune) >= PRUNE_INTERVAL {
            let dropped = self.prune(&mut buckets, now);
            if dropped > 0 {
                tracing::debug!(dropped, remaining = buckets.clients.len(), "Pruned idle rate-limit buckets");
            }
        }

        let bucket = buckets
            .clients
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst, now));

        bucket.try_acquire(self.burst, self.rps, now)
    }

    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Drop buckets that have been idle long enough to be full again.
    /// Returns how many were removed.
    pub fn prune_idle_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut buckets, now)
    }

    fn prune(&self, buckets: &mut Buckets, now: Instant) -> usize {
        buckets.last_prune = now;
        // with no refill a bucket never becomes fresh again
        if self.rps <= 0.0 {
            return 0;
        }
        let refill = Duration::from_secs_f64(self.burst / self.rps);
        let before = buckets.clients.len();
        buckets
            .clients
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) < refill);
        before - buckets.clients.len()
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clients
            .len()
    }
}

fn client_key(ctx: &RequestContext) -> String {
    ctx.client_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Middleware for RateLimiter {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> ChainResult {
        let key = client_key(ctx);
        if self.check(&key) {
            next.run(ctx)
        } else {
            tracing::warn!(client = %key, path = %ctx.path(), "Rate limit exceeded");
            Ok(Response::error(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded",
            ))
        }
    }

    fn name(&self) -> &str {
        "rate_limit"
    }
}
