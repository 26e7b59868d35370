//! Rate limiting middleware.
//!
//! Provides per-identity rate limiting with one token bucket per subject.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::app::AppState;
use crate::middleware::identity::Identity;

/// Stale subjects are swept once every this many checks.
const SWEEP_EVERY_CHECKS: u64 = 1024;

type SubjectRateLimiter<C> = GovRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;

/// Rate limiter state shared across all requests, keyed by identity subject.
///
/// Subjects whose bucket has fully refilled are dropped on a periodic sweep,
/// so memory tracks recently active callers rather than every caller seen.
pub struct RateLimiterState<C: Clock = DefaultClock> {
    limiter: SubjectRateLimiter<C>,
    rate_limit_per_minute: u32,
    clock: C,
    checks: AtomicU64,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self::with_clock(rate_limit_per_minute, DefaultClock::default())
    }
}

impl<C: Clock + Clone> RateLimiterState<C> {
    pub fn with_clock(rate_limit_per_minute: u32, clock: C) -> Self {
        let per_minute = NonZeroU32::new(rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = GovRateLimiter::new(
            Quota::per_minute(per_minute),
            DefaultKeyedStateStore::default(),
            clock.clone(),
        );

        Self {
            limiter,
            rate_limit_per_minute,
            clock,
            checks: AtomicU64::new(0),
        }
    }

    /// Returns `Err(retry_after_secs)` when the subject is over its quota.
    pub fn check(&self, subject: &str) -> Result<(), u64> {
        let seen = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % SWEEP_EVERY_CHECKS == 0 {
            self.sweep();
        }

        self.limiter
            .check_key(&subject.to_string())
            .map_err(|not_until| {
                not_until
                    .wait_time_from(self.clock.now())
                    .as_secs()
                    .max(1)
            })
    }

    /// Forget subjects whose bucket is indistinguishable from a fresh one.
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    fn tracked_subjects(&self) -> usize {
        self.limiter.len()
    }
}

impl<C: Clock + Clone> std::fmt::Debug for RateLimiterState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_subjects", &self.tracked_subjects())
            .finish()
    }
}

/// Middleware that applies rate limiting per authenticated identity.
///
/// Must run after `require_identity`; requests without an identity pass
/// through untouched.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(subject) = req.extensions().get::<Identity>().map(|i| i.subject.clone()) else {
        return next.run(req).await;
    };

    if let Some(ref rate_limiter) = state.rate_limiter {
        if let Err(retry_after) = rate_limiter.check(&subject) {
            tracing::warn!(subject = %subject, retry_after, "Rate limit exceeded");
            return rate_limited_response(state.config.security.rate_limit_per_minute, retry_after);
        }
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
