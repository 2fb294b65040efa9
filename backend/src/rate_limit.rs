use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::{
    config::{RateLimitConfig, WindowLimit},
    error::ApiError,
};

/// How often expired windows are swept
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Fixed-window counter keyed by client address
#[derive(Debug)]
pub struct Limiter {
    limit: WindowLimit,
    message: &'static str,
    trust_proxy: bool,
    windows: DashMap<String, Window>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl Limiter {
    pub fn new(limit: WindowLimit, message: &'static str) -> Self {
        Self {
            limit,
            message,
            trust_proxy: false,
            windows: DashMap::new(),
        }
    }

    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn check(&self, key: &str, now: Instant) -> Decision {
        let window = self.limit.window();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }
        if entry.hits >= self.limit.max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.started));
            return Decision::Limited { retry_after };
        }
        entry.hits += 1;
        Decision::Allowed {
            remaining: self.limit.max_requests - entry.hits,
        }
    }

    /// Drop windows that have already expired. Returns how many were removed.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let window = self.limit.window();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
        before - self.windows.len()
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// The three limiters guarding the API
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub auth: Arc<Limiter>,
    pub score_submit: Arc<Limiter>,
    pub api: Arc<Limiter>,
}

impl RateLimits {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            auth: Arc::new(
                Limiter::new(config.auth, "Too many login attempts, please try again later.")
                    .trusting_proxy(config.trust_proxy),
            ),
            score_submit: Arc::new(
                Limiter::new(config.score_submit, "Too many score submissions, please slow down.")
                    .trusting_proxy(config.trust_proxy),
            ),
            api: Arc::new(
                Limiter::new(config.api, "Too many requests, please try again later.")
                    .trusting_proxy(config.trust_proxy),
            ),
        }
    }

    pub fn evict_expired(&self, now: Instant) -> usize {
        self.auth.evict_expired(now)
            + self.score_submit.evict_expired(now)
            + self.api.evict_expired(now)
    }
}

/// The peer address. With `trust_proxy`, the first hop of
/// `x-forwarded-for` wins when present.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
    };
    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce(State(limiter): State<Arc<Limiter>>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer, limiter.trust_proxy);

    match limiter.check(&key, Instant::now()) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert("ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            tracing::warn!("Rate limit hit for {}", key);
            let mut response = ApiError::TooManyRequests(limiter.message.to_string()).into_response();
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            response
        }
    }
}

/// Background task that periodically sweeps expired rate-limit windows
pub async fn cleanup_task(limits: RateLimits) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        interval.tick().await;
        let removed = limits.evict_expired(Instant::now());
        if removed > 0 {
            tracing::debug!("Evicted {} expired rate-limit windows", removed);
        }
    }
}
