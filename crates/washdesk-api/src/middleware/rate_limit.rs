use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::client_ip::{client_ip, peer_addr};
use crate::error::{ApiError, WebhookError};
use crate::state::AppState;

/// Entries beyond this trigger a sweep of expired windows
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    /// Seconds until the caller's window resets
    Limited { retry_after: u64 },
}

/// Per-key request budget
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str, now: Instant) -> RateDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter: at most `max_requests` per key per `window`
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.max_requests {
            let left = self.window.saturating_sub(now.saturating_duration_since(entry.started));
            let retry_after = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            return RateDecision::Limited {
                retry_after: retry_after.max(1),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }
}

fn check(limiter: &Arc<dyn RateLimiter>, scope: &str, req: &Request) -> Option<u64> {
    let ip = client_ip(req.headers(), peer_addr(req));
    match limiter.check(&format!("{}_{}", scope, ip), Instant::now()) {
        RateDecision::Allowed { .. } => None,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client_ip = %ip, scope, retry_after, "rate limit exceeded");
            Some(retry_after)
        }
    }
}

/// Budget for provider webhooks
pub async fn limit_webhooks(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if let Some(retry_after) = check(&state.webhook_limiter, "webhook", &req) {
        return WebhookError::RateLimited { retry_after }.into_response();
    }
    next.run(req).await
}

/// Budget for the `/send-*` relay routes
pub async fn limit_relay(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if let Some(retry_after) = check(&state.relay_limiter, "relay", &req) {
        return ApiError::TooManyRequests { retry_after }.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_after_budget_within_window() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for expected in [2, 1, 0] {
            assert_eq!(
                limiter.check("ip", start),
                RateDecision::Allowed { remaining: expected }
            );
        }
        assert_eq!(
            limiter.check("ip", start + Duration::from_secs(10)),
            RateDecision::Limited { retry_after: 50 }
        );
        // other keys have their own budget
        assert!(matches!(limiter.check("other", start), RateDecision::Allowed { .. }));
    }

    #[test]
    fn test_resets_after_window_expiry() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(matches!(limiter.check("ip", start), RateDecision::Allowed { .. }));
        assert!(matches!(
            limiter.check("ip", start + Duration::from_secs(59)),
            RateDecision::Limited { .. }
        ));
        assert_eq!(
            limiter.check("ip", start + Duration::from_secs(60)),
            RateDecision::Allowed { remaining: 0 }
        );
    }

    #[test]
    fn test_zero_budget_always_limits() {
        let limiter = FixedWindowLimiter::new(0, Duration::from_millis(500));
        assert_eq!(
            limiter.check("ip", Instant::now()),
            RateDecision::Limited { retry_after: 1 }
        );
    }
}
