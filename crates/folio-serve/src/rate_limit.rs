//! Per-client fixed-window rate limiting with moka.
//!
//! Each client key gets a counter that lives for one window. Requests spend
//! points from that counter; once the budget is gone the client gets `429`
//! until the entry expires.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use moka::future::Cache;

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum number of distinct clients tracked at once.
pub const DEFAULT_CLIENT_CAPACITY: u64 = 100_000;

/// Points charged for an ordinary request.
pub const STANDARD_COST: u32 = 1;

/// Points charged for credential checks.
pub const INTENSE_COST: u32 = 10;

/// Fixed-window point budget keyed by client.
#[derive(Clone)]
pub struct RateLimiter {
    points: u32,
    windows: Cache<String, Arc<AtomicU32>>,
}

impl RateLimiter {
    pub fn new(points: u32, window: Duration) -> Self {
        let windows = Cache::builder()
            .max_capacity(DEFAULT_CLIENT_CAPACITY)
            .time_to_live(window)
            .build();
        Self { points, windows }
    }

    /// Spend `points` for `key`. Returns `false` once the window's budget
    /// is exceeded.
    pub async fn consume(&self, key: &str, points: u32) -> bool {
        let counter = self
            .windows
            .get_with_by_ref(key, async { Arc::new(AtomicU32::new(0)) })
            .await;
        let used = counter
            .fetch_add(points, Ordering::Relaxed)
            .saturating_add(points);
        used <= self.points
    }
}

/// Identify the caller: first `X-Forwarded-For` entry, then the socket peer.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

async fn charge(
    state: &AppState,
    request: Request,
    next: Next,
    points: u32,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if !state.rate_limiter.consume(&key, points).await {
        tracing::info!(client = %key, points, "rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }

    Ok(next.run(request).await)
}

/// Middleware charging [`STANDARD_COST`] per request.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    charge(&state, request, next, STANDARD_COST).await
}

/// Middleware charging [`INTENSE_COST`] per request.
pub async fn intense_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    charge(&state, request, next, INTENSE_COST).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn budget_is_per_client() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.consume("a", 1).await);
        }
        assert!(!limiter.consume("a", 1).await);
        assert!(limiter.consume("b", 1).await);
    }

    #[tokio::test]
    async fn intense_cost_spends_ten_points() {
        let limiter = RateLimiter::new(25, Duration::from_secs(60));
        assert!(limiter.consume("a", INTENSE_COST).await);
        assert!(limiter.consume("a", INTENSE_COST).await);
        assert!(!limiter.consume("a", INTENSE_COST).await);
    }

    #[tokio::test]
    async fn budget_resets_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.consume("a", 1).await);
        assert!(!limiter.consume("a", 1).await);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.consume("a", 1).await);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn client_key_falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.1:4242".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.1");
        assert_eq!(client_key(&headers, None), "unknown");
    }
}
