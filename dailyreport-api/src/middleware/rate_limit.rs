/// Rate limiting middleware for the authentication routes
///
/// Token bucket per client address, held in process. Each client starts
/// with a full bucket of `max_requests` tokens that refills evenly over
/// `window`; every request consumes one token.
///
/// # Client key
///
/// The peer address from `ConnectInfo` when the server provides it, else the
/// first `X-Forwarded-For` entry, else a shared `unknown` bucket.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: Requests allowed per window
/// - `X-RateLimit-Remaining`: Whole tokens left
/// - `Retry-After`: Seconds to wait (429 responses only)
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use dailyreport_api::middleware::rate_limit::RateLimiter;
///
/// let limiter = RateLimiter::new(20, Duration::from_secs(120));
/// ```

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Buckets idle this long past a full refill are dropped on the next sweep
const IDLE_SWEEP_FACTOR: u32 = 2;

/// Token bucket state for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,

    /// Last refill time
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new full bucket
    fn new(capacity: u32, now: Instant) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    /// Refills tokens based on elapsed time
    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed_secs = now.saturating_duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed_secs * rate).min(capacity as f64);
        self.last_refill = now;
    }

    /// Attempts to consume N tokens
    fn try_consume(&mut self, count: f64) -> bool {
        if self.tokens >= count {
            self.tokens -= count;
            true
        } else {
            false
        }
    }

    /// Calculates seconds until N tokens available
    fn seconds_until_available(&self, count: f64, rate: f64) -> u64 {
        let deficit = count - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// Result of rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether request is allowed
    pub ok: bool,

    /// Tokens remaining
    pub remaining: u32,

    /// Seconds until a token is available (0 when allowed)
    pub retry_after: u64,
}

/// In-process token bucket limiter keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            capacity: max_requests.max(1),
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Requests allowed per window
    pub fn limit(&self) -> u32 {
        self.capacity
    }

    fn refill_rate(&self) -> f64 {
        self.capacity as f64 / self.window.as_secs_f64().max(f64::EPSILON)
    }

    /// Consumes one token for `key`
    pub async fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let rate = self.refill_rate();
        let mut buckets = self.buckets.lock().await;

        let idle = self.window * IDLE_SWEEP_FACTOR;
        buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) < idle);

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, now));
        bucket.refill(rate, self.capacity, now);

        if bucket.try_consume(1.0) {
            RateLimitResult {
                ok: true,
                remaining: bucket.tokens.floor() as u32,
                retry_after: 0,
            }
        } else {
            RateLimitResult {
                ok: false,
                remaining: 0,
                retry_after: bucket.seconds_until_available(1.0, rate).max(1),
            }
        }
    }
}

/// Identifies the client a request counts against
pub fn client_key(connect_info: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = connect_info {
        return addr.ip().to_string();
    }

    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware layer
///
/// # Errors
///
/// - 429 Too Many Requests: bucket empty for this client
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let connect_info = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(connect_info, request.headers());

    let limiter = &state.auth_limiter;
    let result = limiter.check(&key).await;

    if !result.ok {
        tracing::warn!(client = %key, retry_after = result.retry_after, "Auth rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: result.retry_after,
            message: "Too many authentication attempts, please try again later".to_string(),
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.limit()));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));

    Ok(response)
}
