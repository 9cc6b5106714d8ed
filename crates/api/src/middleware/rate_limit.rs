//! Token-bucket rate limiting keyed by client IP.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Buckets kept before idle (full) ones are swept.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// One token bucket per client IP.
#[derive(Debug)]
pub struct IpRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl IpRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one token for `ip`. Returns `false` when the bucket is empty.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now()).await
    }

    async fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let capacity = f64::from(self.config.burst);
        let rate = f64::from(self.config.per_second);
        let mut buckets = self.buckets.lock().await;

        if buckets.len() >= SWEEP_THRESHOLD {
            buckets.retain(|_, b| {
                b.tokens + now.duration_since(b.refilled_at).as_secs_f64() * rate < capacity
            });
        }

        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: capacity,
            refilled_at: now,
        });
        let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Client IP: first `x-forwarded-for` hop, then `x-real-ip`, then the peer.
///
/// The headers are client-controlled unless a reverse proxy overwrites them.
/// With `trust_forwarded` off only the peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> IpAddr {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    let forwarded = if trust_forwarded {
        header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting requests from IPs that exhausted their bucket.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(
        request.headers(),
        peer,
        state.config.rate_limit.trust_forwarded,
    );

    if !state.rate_limiter.allow(ip).await {
        tracing::warn!(client_ip = %ip, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}
