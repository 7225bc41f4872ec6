//! Rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::warn;

use crate::extractors::client_ip;
use crate::response::ApiError;
use crate::state::AppState;

/// Token bucket rate limiter keyed by client.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Burst size
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Key on `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    /// Only enable behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

fn default_rate() -> u32 {
    100
}

fn default_burst() -> u32 {
    500
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            burst: default_burst(),
            trust_proxy: false,
        }
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(burst: u32) -> Self {
        Self {
            tokens: burst as f64,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, rate: u32, burst: u32) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        self.tokens = (self.tokens + elapsed * rate as f64).min(burst as f64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Check if a request is allowed for the given key.
    pub fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.burst));

        bucket.try_acquire(self.config.rate, self.config.burst)
    }

    /// Drop buckets idle for longer than `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.lock();
        let now = Instant::now();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn trusts_proxy(&self) -> bool {
        self.config.trust_proxy
    }
}

/// Bucket key for a request.
///
/// The TCP peer address, unless the limiter trusts a proxy and the request
/// carries forwarding headers.
pub fn client_key(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = client_ip(request.headers()) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Reject requests over the per-client budget with 429.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = client_key(&request, state.rate_limiter.trusts_proxy());

    if !state.rate_limiter.check(&key) {
        metrics().rate_limited_requests.inc();
        warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::rate_limited("Too many requests", Some(1)).into_response();
    }

    next.run(request).await
}
