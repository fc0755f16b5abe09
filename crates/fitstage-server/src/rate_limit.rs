//! Per-IP token-bucket rate limiting for the public API.
//!
//! Vote spam is the main concern: a spectator hammering `POST /votes` should
//! hit 429 long before the store sees the traffic. Health probes are exempt
//! so load balancers are never throttled.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

/// Refill rate and burst ceiling for one bucket.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    /// Tokens added per second.
    pub per_second: f64,
    /// Maximum tokens a bucket can hold.
    pub burst: f64,
}

impl Default for Quota {
    /// 20 req/s sustained with a burst of 60 -- voting traffic spikes when
    /// a show goes live, so the ceiling is higher than a typical API's.
    fn default() -> Self {
        Self {
            per_second: 20.0,
            burst: 60.0,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

impl Bucket {
    fn full(quota: Quota) -> Self {
        Self {
            tokens: quota.burst,
            last_seen: Instant::now(),
        }
    }

    fn take(&mut self, quota: Quota) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_seen).as_secs_f64();
        self.last_seen = now;

        self.tokens = (self.tokens + elapsed * quota.per_second).min(quota.burst);
        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    quota: Quota,
}

impl RateLimiter {
    pub fn new(quota: Quota) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            quota,
        }
    }

    /// Whether a request from `ip` is allowed right now.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.quota));
        bucket.take(self.quota)
    }

    /// Drop buckets that have been idle longer than `max_idle_secs`.
    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_seen).as_secs_f64() < max_idle_secs
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Quota::default())
    }
}

pub async fn rate_limit_middleware(
    axum::extract::State(limiter): axum::extract::State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    if let Some(ip) = extract_client_ip(&req) {
        if !limiter.allow(ip).await {
            warn!(ip = %ip, path = %req.uri().path(), "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Try ConnectInfo first, then X-Forwarded-For, then X-Real-IP.
fn extract_client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(connect_info.0.ip());
    }

    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            if let Ok(ip) = value.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(per_second: f64, burst: f64) -> Quota {
        Quota { per_second, burst }
    }

    #[tokio::test]
    async fn burst_is_allowed_then_throttled() {
        let limiter = RateLimiter::new(quota(10.0, 5.0));
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.allow(ip).await);
        }

        assert!(!limiter.allow(ip).await);
    }

    #[tokio::test]
    async fn buckets_are_per_ip() {
        let limiter = RateLimiter::new(quota(10.0, 2.0));
        let ip1: IpAddr = "10.0.0.1".parse().unwrap();
        let ip2: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.allow(ip1).await);
        assert!(limiter.allow(ip1).await);
        assert!(!limiter.allow(ip1).await);

        assert!(limiter.allow(ip2).await);
    }

    #[tokio::test]
    async fn purge_drops_idle_buckets() {
        let limiter = RateLimiter::new(quota(10.0, 5.0));
        let ip: IpAddr = "192.168.1.1".parse().unwrap();
        assert!(limiter.allow(ip).await);

        limiter.purge_stale(0.0).await;

        let buckets = limiter.buckets.lock().await;
        assert!(buckets.is_empty());
    }
}
