//! Per-client request throttling.
//!
//! Every client address keeps the instants of its recent requests. Once
//! `max_requests` of them fall inside the window, further requests get
//! 429 until the oldest ages out. Rejected requests are not counted.

use crate::error::ApiError;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Idle clients are pruned once this many addresses are tracked.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per client inside one window.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(10),
        }
    }
}

/// Sliding-window limiter shared by every route.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `client` now. Returns false when the client
    /// is over its limit.
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        self.try_acquire_at(client, Instant::now())
    }

    /// Same as [`RateLimiter::try_acquire`] at an explicit instant.
    pub fn try_acquire_at(&self, client: IpAddr, now: Instant) -> bool {
        let window = self.config.window;
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, stamps| {
                stamps
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let stamps = clients.entry(client).or_default();
        while let Some(oldest) = stamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.config.max_requests as usize {
            return false;
        }
        stamps.push_back(now);
        true
    }
}

/// Middleware rejecting requests over the limit. Clients are told apart by
/// peer address; without connect info every request shares one bucket.
pub async fn throttle(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.try_acquire(client) {
        debug!(%client, "Rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}
