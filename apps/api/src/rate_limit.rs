//! Submission rate limiting.
//!
//! The limiter is an injected capability (check-and-record) so a distributed
//! backend can replace the in-memory default without touching the intake
//! pipeline. The in-memory policy keeps a per-user timestamp list, prunes
//! entries older than the rolling window on each check, and is correct only
//! for a single-instance deployment.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` and records the attempt when the caller is under the
    /// cap, `false` when the cap has been reached for the window.
    async fn check_and_record(&self, user_id: Uuid) -> bool;
}

pub struct InMemoryRateLimiter {
    max_per_window: usize,
    window: Duration,
    log: Mutex<HashMap<Uuid, Vec<DateTime<Utc>>>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_window: usize) -> Self {
        Self {
            max_per_window,
            window: Duration::hours(1),
            log: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, user_id: Uuid, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = log.entry(user_id).or_default();
        timestamps.retain(|t| *t > cutoff);
        if timestamps.len() >= self.max_per_window {
            return false;
        }
        timestamps.push(now);
        true
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_record(&self, user_id: Uuid) -> bool {
        self.check_at(user_id, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_cap() {
        let limiter = InMemoryRateLimiter::new(5);
        let user = Uuid::new_v4();
        let now = Utc::now();
        for _ in 0..5 {
            assert!(limiter.check_at(user, now));
        }
        assert!(!limiter.check_at(user, now));
    }

    #[test]
    fn test_window_prunes_old_entries() {
        let limiter = InMemoryRateLimiter::new(2);
        let user = Uuid::new_v4();
        let now = Utc::now();
        assert!(limiter.check_at(user, now));
        assert!(limiter.check_at(user, now));
        assert!(!limiter.check_at(user, now));
        // 61 minutes later the window has rolled past both entries.
        assert!(limiter.check_at(user, now + Duration::minutes(61)));
    }

    #[test]
    fn test_users_are_limited_independently() {
        let limiter = InMemoryRateLimiter::new(1);
        let now = Utc::now();
        assert!(limiter.check_at(Uuid::new_v4(), now));
        assert!(limiter.check_at(Uuid::new_v4(), now));
    }
}
