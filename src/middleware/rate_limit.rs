use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{connect_info::ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use super::ip::extract_ip_from_headers;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: usize,
}

/// A thread-safe, per-client fixed-window rate limiter.
///
/// A window opens at a client's first request and admits `max_requests`;
/// further requests inside the window are rejected until it expires.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<IpAddr, Window>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Records a request from `ip`. Returns the seconds until the window
    /// expires when the client is over its limit.
    pub async fn check_rate_limit(&self, ip: IpAddr) -> Result<(), AppError> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let entry = windows.entry(ip).or_insert(Window { started: now, count: 0 });

        // Expired window: start a fresh one
        if now.checked_duration_since(entry.started).map(|d| d >= self.window).unwrap_or(false) {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.checked_duration_since(entry.started).unwrap_or_default();
            let retry_after = self.window.saturating_sub(elapsed);
            return Err(AppError::RateLimited {
                retry_after_seconds: retry_after.as_secs().max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Evicts windows that have fully elapsed, keeping the in-memory IP map
    /// bounded in long-running processes.
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, w| {
            now.checked_duration_since(w.started).map(|d| d < self.window).unwrap_or(true)
        });
    }
}

/// Spawns the periodic eviction task for a limiter.
pub fn spawn_cleanup_task(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup_expired().await;
        }
    });
}

/// Axum middleware applying the shared fixed-window limiter to every request.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let remote_ip = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let ip = extract_ip_from_headers(req.headers(), remote_ip);

    match state.rate_limiter.check_rate_limit(ip).await {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}
