// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Custom middleware

use crate::config::RateLimitConfig;
use crate::error::ServerError;
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

struct Windows {
    clients: HashMap<String, Vec<Instant>>,
    last_sweep: Instant,
}

/// Rate limiting state
///
/// Sliding one-minute window per client key. Clients whose window has
/// emptied are dropped once per window.
#[derive(Clone)]
pub struct RateLimitState {
    windows: Arc<Mutex<Windows>>,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            config,
        }
    }

    /// Record a request for `key`; false when the key is over its budget
    pub async fn check_rate_limit(&self, key: &str) -> bool {
        if !self.config.enabled {
            return true;
        }
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;

        if now.duration_since(windows.last_sweep) >= WINDOW {
            windows.clients.retain(|_, times| {
                times.retain(|&time| now.duration_since(time) < WINDOW);
                !times.is_empty()
            });
            windows.last_sweep = now;
        }

        let client_requests = windows.clients.entry(key.to_string()).or_default();
        client_requests.retain(|&time| now.duration_since(time) < WINDOW);

        let allowed = client_requests.len() < self.config.requests_per_minute as usize;
        if allowed {
            client_requests.push(now);
        } else if client_requests.is_empty() {
            windows.clients.remove(key);
        }
        allowed
    }

    async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.clients.len()
    }
}

/// Client key: the peer address, or the first `x-forwarded-for` hop when the
/// server sits behind a trusted proxy
fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| req.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    state: Arc<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req, state.config.trust_forwarded_for);
    if state.check_rate_limit(&key).await {
        next.run(req).await
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        ServerError::RateLimited.into_response()
    }
}
