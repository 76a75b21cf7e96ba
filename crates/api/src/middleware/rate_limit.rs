//! Per-IP request limiting for the API routes.
//!
//! Install with `axum::middleware::from_fn_with_state(state, rate_limit)`.
//! Counters live in `state.stores.rate_limiter`; a background task started by
//! [`spawn_prune_task`] forgets clients that went quiet.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::client_ip::ClientIp;
use crate::{
    error::AppError,
    state::AppState,
    stores::{RateLimitResult, RateLimiter},
};

pub const RATE_LIMITED: &str = "Too many requests, please try again later.";

pub async fn rate_limit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.rate_limit_enabled() {
        return Ok(next.run(request).await);
    }

    match state.stores.rate_limiter.check(&ip, Instant::now()) {
        RateLimitResult::Allowed(_) => Ok(next.run(request).await),
        RateLimitResult::Exceeded(count) => {
            tracing::warn!(ip = %ip, count, "rate limit exceeded");
            Err(AppError::External(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED))
        }
    }
}

/// Periodically drop idle rate-limit keys until `shutdown` is cancelled.
pub fn spawn_prune_task(
    limiter: Arc<dyn RateLimiter>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Nothing to prune at startup.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let pruned = limiter.prune(Instant::now());
            if pruned > 0 {
                tracing::debug!(pruned, "pruned idle rate limit keys");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MockRateLimiter;
    use crate::test_utils::{TestStateBuilder, test_config};
    use axum::{Router, body::Body, http::Request as HttpRequest, routing::get};
    use http_body_util::BodyExt;
    use shared::api::ErrorResponse;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit))
            .with_state(state)
    }

    fn request(ip: &'static str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn requests_under_the_limit_pass_through() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_check()
            .withf(|key, _| key == "203.0.113.9")
            .returning(|_, _| RateLimitResult::Allowed(1));

        let state = TestStateBuilder::new().with_rate_limiter(limiter).build();
        let response = app(state).oneshot(request("203.0.113.9")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn requests_over_the_limit_get_429() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_check()
            .returning(|_, _| RateLimitResult::Exceeded(61));

        let state = TestStateBuilder::new().with_rate_limiter(limiter).build();
        let response = app(state).oneshot(request("203.0.113.9")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.error, RATE_LIMITED);
    }

    #[tokio::test]
    async fn disabled_limit_never_consults_the_limiter() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_check().never();

        let mut config = test_config();
        config.rate_limit_max_requests = 0;
        let state = TestStateBuilder::new()
            .with_rate_limiter(limiter)
            .with_config(config)
            .build();
        let response = app(state).oneshot(request("203.0.113.9")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn prune_task_runs_each_interval_and_stops_on_shutdown() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_prune().times(2).returning(|_| 0);

        let shutdown = CancellationToken::new();
        let handle = spawn_prune_task(
            Arc::new(limiter),
            Duration::from_secs(60),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown.cancel();
        handle.await.unwrap();
    }
}
