//! Rate limiting primitives for the unauthenticated endpoints.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_MAX_REQUESTS: usize = 10;

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    Register,
    Login,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-memory sliding window limiter keyed by client IP and action.
///
/// Requests with no resolvable IP share one bucket per action.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    window: Duration,
    max_requests: usize,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_REQUESTS)
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision {
        let key = format!("{action:?}:{}", ip.unwrap_or("unknown"));
        let now = Instant::now();

        let Ok(mut hits) = self.hits.lock() else {
            // Poisoned lock: fail open, limiting is best effort
            return RateLimitDecision::Allowed;
        };

        // Drop stale entries so the map does not grow without bound
        hits.retain(|_, stamps| {
            stamps.retain(|stamp| now.duration_since(*stamp) < self.window);
            !stamps.is_empty()
        });

        let stamps = hits.entry(key).or_default();
        if stamps.len() >= self.max_requests {
            return RateLimitDecision::Limited;
        }
        stamps.push(now);
        RateLimitDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        assert_eq!(
            limiter.check_ip(None, RateLimitAction::Register),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn limits_after_max_requests() {
        let limiter = SlidingWindowRateLimiter::new(Duration::from_secs(60), 3);
        for _ in 0..3 {
            assert_eq!(
                limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Register),
                RateLimitDecision::Allowed
            );
        }
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Register),
            RateLimitDecision::Limited
        );
    }

    #[test]
    fn buckets_are_per_ip() {
        let limiter = SlidingWindowRateLimiter::new(Duration::from_secs(60), 1);
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("5.6.7.8"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Limited
        );
    }

    #[test]
    fn buckets_are_per_action() {
        let limiter = SlidingWindowRateLimiter::new(Duration::from_secs(60), 1);
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Register),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn window_expiry_frees_the_bucket() {
        let limiter = SlidingWindowRateLimiter::new(Duration::from_millis(50), 1);
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Limited
        );
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn missing_ip_shares_one_bucket() {
        let limiter = SlidingWindowRateLimiter::new(Duration::from_secs(60), 1);
        assert_eq!(
            limiter.check_ip(None, RateLimitAction::Register),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(None, RateLimitAction::Register),
            RateLimitDecision::Limited
        );
    }
}
