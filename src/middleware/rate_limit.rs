//! Per-client-address request limiter.
//!
//! A coarse abuse guard, not a correctness mechanism: counts live in process memory,
//! are approximate, and vanish on restart. The quota is `requests` per `window`
//! expressed as a GCRA cell rate with a burst of `requests`, which behaves like a
//! sliding window. A background task evicts idle keys every window so the map stays
//! bounded by the number of recently active clients.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::state::AppState;

pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    window: Duration,
    trust_forwarded_for: bool,
}

impl ClientRateLimiter {
    /// `None` when either bound is zero.
    pub fn new(requests: u32, window: Duration, trust_forwarded_for: bool) -> Option<Self> {
        let burst = NonZeroU32::new(requests)?;
        let period = window.checked_div(requests)?;
        let quota = Quota::with_period(period)?.allow_burst(burst);

        Some(Self {
            limiter: RateLimiter::keyed(quota),
            window,
            trust_forwarded_for,
        })
    }

    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Drop keys whose quota has fully replenished.
    pub fn evict_idle(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Run [`ClientRateLimiter::evict_idle`] once per window for the life of the process.
    pub fn spawn_eviction(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            loop {
                ticker.tick().await;
                limiter.evict_idle();
                tracing::debug!("Rate limiter tracking {} clients", limiter.tracked_clients());
            }
        })
    }

    fn client_address(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        if self.trust_forwarded_for {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok());
            if forwarded.is_some() {
                return forwarded;
            }
        }
        peer.map(|addr| addr.ip())
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.limiter.as_ref() else {
        return Ok(next.run(request).await);
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    if let Some(client) = limiter.client_address(request.headers(), peer) {
        if !limiter.check(client) {
            tracing::warn!("Rate limit exceeded for {}", client);
            return Err(ApiError::too_many_requests("Too many requests, slow down"));
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn zero_quota_is_rejected() {
        assert!(ClientRateLimiter::new(0, Duration::from_secs(60), false).is_none());
        assert!(ClientRateLimiter::new(10, Duration::ZERO, false).is_none());
    }

    #[test]
    fn allows_burst_then_blocks_per_client() {
        let limiter = ClientRateLimiter::new(3, Duration::from_secs(3600), false).unwrap();
        let a = ip("10.0.0.1");
        let b = ip("10.0.0.2");

        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(!limiter.check(a));

        // Separate budget for another address
        assert!(limiter.check(b));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn forwarded_for_only_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        let trusting = ClientRateLimiter::new(1, Duration::from_secs(1), true).unwrap();
        assert_eq!(trusting.client_address(&headers, Some(peer)), Some(ip("203.0.113.7")));

        let strict = ClientRateLimiter::new(1, Duration::from_secs(1), false).unwrap();
        assert_eq!(strict.client_address(&headers, Some(peer)), Some(ip("127.0.0.1")));
        assert_eq!(strict.client_address(&headers, None), None);
    }
}
