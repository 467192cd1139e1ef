use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::app_error::{AppError, AppResult};

/// Trait for rate limiting implementations.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one request for `key` against `limit` requests per window.
    /// Returns Ok(()) if within limits, Err(AppError::RateLimited) if exceeded.
    async fn check(&self, key: &str, limit: u64) -> AppResult<()>;
}

/// Fixed-window counters held in process memory.
///
/// Counts are keyed by (key, window index) and are lost on restart; each
/// process instance limits independently.
pub struct FixedWindowRateLimiter {
    window_secs: u64,
    state: Mutex<WindowState>,
}

#[derive(Default)]
struct WindowState {
    /// Newest window index buckets were pruned against.
    pruned_window: u64,
    buckets: HashMap<(String, u64), u64>,
}

impl FixedWindowRateLimiter {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs: window_secs.max(1),
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Core check against an explicit clock, in seconds since the epoch.
    pub fn check_at(&self, key: &str, limit: u64, now_secs: u64) -> AppResult<()> {
        let window = now_secs / self.window_secs;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // Stale windows are dropped once per window advance
        if window > state.pruned_window {
            state.buckets.retain(|(_, w), _| *w >= window);
            state.pruned_window = window;
        }

        let count = state.buckets.entry((key.to_string(), window)).or_insert(0);
        if *count >= limit {
            let retry_after_secs = (window + 1) * self.window_secs - now_secs;
            tracing::debug!(key, limit, retry_after_secs, "Rate limit exceeded");
            return Err(AppError::RateLimited { retry_after_secs });
        }
        *count += 1;
        Ok(())
    }

    fn bucket_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .buckets
            .len()
    }
}

#[async_trait]
impl RateLimiterTrait for FixedWindowRateLimiter {
    async fn check(&self, key: &str, limit: u64) -> AppResult<()> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.check_at(key, limit, now_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_then_blocks() {
        let limiter = FixedWindowRateLimiter::new(60);
        let now = 6_000; // window start

        for _ in 0..3 {
            assert!(limiter.check_at("user-a", 3, now).is_ok());
        }
        match limiter.check_at("user-a", 3, now + 15) {
            Err(AppError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 45),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowRateLimiter::new(60);
        assert!(limiter.check_at("user-a", 1, 0).is_ok());
        assert!(limiter.check_at("user-a", 1, 1).is_err());
        assert!(limiter.check_at("user-b", 1, 1).is_ok());
    }

    #[test]
    fn test_next_window_resets_and_prunes() {
        let limiter = FixedWindowRateLimiter::new(60);
        assert!(limiter.check_at("user-a", 1, 59).is_ok());
        assert!(limiter.check_at("user-a", 1, 59).is_err());

        assert!(limiter.check_at("user-a", 1, 60).is_ok());
        assert_eq!(limiter.bucket_count(), 1);
    }

    #[test]
    fn test_prunes_only_when_window_advances() {
        let limiter = FixedWindowRateLimiter::new(60);
        assert!(limiter.check_at("user-a", 5, 10).is_ok());
        assert!(limiter.check_at("user-b", 5, 20).is_ok());
        assert_eq!(limiter.bucket_count(), 2);

        // First request of the next window drops both stale buckets
        assert!(limiter.check_at("user-c", 5, 65).is_ok());
        assert_eq!(limiter.bucket_count(), 1);

        assert!(limiter.check_at("user-d", 5, 70).is_ok());
        assert_eq!(limiter.bucket_count(), 2);
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let limiter = FixedWindowRateLimiter::new(60);
        assert!(limiter.check_at("k", 1, 119).is_ok());
        assert!(matches!(
            limiter.check_at("k", 1, 119),
            Err(AppError::RateLimited { retry_after_secs: 1 })
        ));
    }

    #[tokio::test]
    async fn test_trait_check_uses_wall_clock() {
        let limiter = FixedWindowRateLimiter::new(3600);
        assert!(limiter.check("k", 2).await.is_ok());
    }
}
