//! In-memory rate limiting.
//!
//! Counters live for the lifetime of the process: the limiter is built in
//! `main`, shared through `AppState`, pruned by a background task, and dropped
//! at shutdown.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Rate limiter trait for checking and recording request hits.
#[cfg_attr(test, mockall::automock)]
pub trait RateLimiter: Send + Sync {
    /// Record a hit for `key` and report whether it is within the limit.
    fn check(&self, key: &str, now: Instant) -> RateLimitResult;

    /// Forget keys with no hits inside the window. Returns how many were dropped.
    fn prune(&self, now: Instant) -> usize;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Under the limit, includes current count.
    Allowed(usize),
    /// Over the limit, includes current count.
    Exceeded(usize),
}

/// Sliding-window limiter keyed by client IP.
pub struct InMemoryRateLimiter {
    max_requests: usize,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: DashMap::new(),
        }
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str, now: Instant) -> RateLimitResult {
        let mut hits = self.hits.entry(key.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            hits.pop_front();
        }

        // Rejected hits count too, so a client hammering the API stays blocked.
        hits.push_back(now);
        let count = hits.len();

        if count > self.max_requests {
            RateLimitResult::Exceeded(count)
        } else {
            RateLimitResult::Allowed(count)
        }
    }

    fn prune(&self, now: Instant) -> usize {
        let before = self.hits.len();
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
        before - self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl RateLimitResult {
        fn allowed(&self) -> bool {
            matches!(self, RateLimitResult::Allowed(_))
        }
    }

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = InMemoryRateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check("1.1.1.1", now), RateLimitResult::Allowed(1));
        assert_eq!(limiter.check("1.1.1.1", now), RateLimitResult::Allowed(2));
        assert_eq!(limiter.check("1.1.1.1", now), RateLimitResult::Allowed(3));
        assert_eq!(limiter.check("1.1.1.1", now), RateLimitResult::Exceeded(4));
    }

    #[test]
    fn keys_are_counted_separately() {
        let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("1.1.1.1", now).allowed());
        assert!(!limiter.check("1.1.1.1", now).allowed());
        assert!(limiter.check("2.2.2.2", now).allowed());
    }

    #[test]
    fn old_hits_slide_out_of_the_window() {
        let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check("1.1.1.1", start).allowed());
        assert!(!limiter.check("1.1.1.1", start + Duration::from_secs(30)).allowed());
        // Both earlier hits are a full window old by now.
        assert!(
            limiter
                .check("1.1.1.1", start + Duration::from_secs(91))
                .allowed()
        );
    }

    #[test]
    fn prune_drops_idle_keys_only() {
        let limiter = InMemoryRateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check("idle", start);
        limiter.check("busy", start + Duration::from_secs(50));

        assert_eq!(limiter.prune(start + Duration::from_secs(70)), 1);
        assert_eq!(limiter.hits.len(), 1);
        assert!(limiter.hits.contains_key("busy"));
    }
}
