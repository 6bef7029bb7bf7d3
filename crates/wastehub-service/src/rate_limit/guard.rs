//! Fixed-window counters keyed by tier and client identity.
//!
//! A window opens on the first charged request and resets once its length
//! has elapsed. Counters live in a sharded map so unrelated clients never
//! contend on one lock.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use wastehub_core::config::Environment;
use wastehub_core::config::rate_limit::RateLimitConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;

use super::tier::RateLimitTier;

const TIER_COUNT: usize = RateLimitTier::ALL.len();

#[derive(Debug, Clone, Copy)]
struct Limit {
    max_requests: u32,
    window: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn fresh(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.started) >= window
    }

    fn retry_after(&self, now: Instant, window: Duration) -> u64 {
        let left = window.saturating_sub(now.duration_since(self.started));
        // Round partial seconds up so the hint is never early.
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }
}

/// Gate in front of every external entry point.
#[derive(Debug)]
pub struct RateLimitGuard {
    enabled: bool,
    limits: [Limit; TIER_COUNT],
    windows: DashMap<(RateLimitTier, String), Window>,
}

impl RateLimitGuard {
    /// Build the guard. Ceilings are multiplied outside production.
    pub fn new(config: &RateLimitConfig, environment: Environment) -> Self {
        let multiplier = if environment.is_production() {
            1
        } else {
            config.non_production_multiplier.max(1)
        };
        let limits = RateLimitTier::ALL.map(|tier| {
            let tier = tier.config(config);
            Limit {
                max_requests: tier.max_requests.saturating_mul(multiplier),
                window: Duration::from_secs(tier.window_seconds),
            }
        });
        Self {
            enabled: config.enabled,
            limits,
            windows: DashMap::new(),
        }
    }

    /// Effective ceiling for a tier.
    pub fn ceiling(&self, tier: RateLimitTier) -> u32 {
        self.limit(tier).max_requests
    }

    fn limit(&self, tier: RateLimitTier) -> Limit {
        self.limits[tier as usize]
    }

    /// Charge one request to `key`, or reject with a retry hint.
    pub fn acquire(&self, tier: RateLimitTier, key: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let limit = self.limit(tier);
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry((tier, key.to_string()))
            .or_insert_with(|| Window::fresh(now));
        if entry.is_expired(now, limit.window) {
            *entry = Window::fresh(now);
        }
        if entry.count >= limit.max_requests {
            let retry_after = entry.retry_after(now, limit.window);
            warn!(tier = %tier, key, retry_after, "Rate limit exceeded");
            return Err(AppError::rate_limited(retry_after));
        }
        entry.count += 1;
        Ok(())
    }

    /// Reject if `key` has exhausted the tier, without charging anything.
    ///
    /// Used by failure-only tiers before the attempt runs.
    pub fn check(&self, tier: RateLimitTier, key: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let limit = self.limit(tier);
        let now = Instant::now();
        match self.windows.get(&(tier, key.to_string())) {
            Some(window)
                if !window.is_expired(now, limit.window) && window.count >= limit.max_requests =>
            {
                let retry_after = window.retry_after(now, limit.window);
                warn!(tier = %tier, key, retry_after, "Rate limit exceeded");
                Err(AppError::rate_limited(retry_after))
            }
            _ => Ok(()),
        }
    }

    /// Charge a failed attempt to a failure-only tier.
    pub fn record_failure(&self, tier: RateLimitTier, key: &str) {
        if !self.enabled {
            return;
        }
        let limit = self.limit(tier);
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry((tier, key.to_string()))
            .or_insert_with(|| Window::fresh(now));
        if entry.is_expired(now, limit.window) {
            *entry = Window::fresh(now);
        }
        entry.count = entry.count.saturating_add(1);
        debug!(tier = %tier, key, count = entry.count, "Failed attempt recorded");
    }

    /// Remaining budget for `key` in its current window.
    pub fn remaining(&self, tier: RateLimitTier, key: &str) -> u32 {
        let limit = self.limit(tier);
        let now = Instant::now();
        match self.windows.get(&(tier, key.to_string())) {
            Some(window) if !window.is_expired(now, limit.window) => {
                limit.max_requests.saturating_sub(window.count)
            }
            _ => limit.max_requests,
        }
    }

    /// Drop expired windows. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|(tier, _), window| !window.is_expired(now, self.limit(*tier).window));
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Swept expired rate limit windows");
        }
        removed
    }

    /// Number of live windows.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wastehub_core::error::ErrorKind;

    fn production() -> RateLimitGuard {
        RateLimitGuard::new(&RateLimitConfig::default(), Environment::Production)
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_tier_rejects_after_ceiling() {
        let guard = production();
        for _ in 0..50 {
            guard.acquire(RateLimitTier::Write, "10.0.0.1").unwrap();
        }
        let err = guard.acquire(RateLimitTier::Write, "10.0.0.1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.retry_after_seconds, Some(900));
        assert!(err.message.contains("15 minutes"));

        // Other clients and tiers are unaffected.
        guard.acquire(RateLimitTier::Write, "10.0.0.2").unwrap();
        guard.acquire(RateLimitTier::Read, "10.0.0.1").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_elapsed() {
        let guard = production();
        for _ in 0..3 {
            guard.acquire(RateLimitTier::PasswordReset, "ip").unwrap();
        }
        assert!(guard.acquire(RateLimitTier::PasswordReset, "ip").is_err());

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        let err = guard.acquire(RateLimitTier::PasswordReset, "ip").unwrap_err();
        assert_eq!(err.retry_after_seconds, Some(30 * 60));

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        guard.acquire(RateLimitTier::PasswordReset, "ip").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_tier_counts_failures_only() {
        let guard = production();
        let key = "203.0.113.9";
        for attempt in 0..5 {
            guard.check(RateLimitTier::Auth, key).unwrap();
            guard.record_failure(RateLimitTier::Auth, key);
            if attempt == 2 {
                // A success checks but never charges or resets.
                guard.check(RateLimitTier::Auth, key).unwrap();
                assert_eq!(guard.remaining(RateLimitTier::Auth, key), 2);
            }
        }
        let err = guard.check(RateLimitTier::Auth, key).unwrap_err();
        assert_eq!(err.retry_after_seconds, Some(900));
        assert!(err.message.contains("15 minutes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_production_multiplies_ceilings() {
        let guard = RateLimitGuard::new(&RateLimitConfig::default(), Environment::Development);
        assert_eq!(guard.ceiling(RateLimitTier::Auth), 50);
        assert_eq!(guard.ceiling(RateLimitTier::Read), 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_guard_never_rejects() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        let guard = RateLimitGuard::new(&config, Environment::Production);
        for _ in 0..100 {
            guard.acquire(RateLimitTier::PasswordReset, "ip").unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_only_expired_windows() {
        let guard = production();
        guard.acquire(RateLimitTier::Write, "a").unwrap();
        guard.acquire(RateLimitTier::Upload, "a").unwrap();
        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        assert_eq!(guard.sweep(), 1);
        assert_eq!(guard.tracked(), 1);
    }
}
