//! Retry classification and backoff delays.
//!
//! Failures are classified by substring matching against the error text.
//! Recoverable patterns win over non-recoverable ones when both match, so
//! a transient wrapper around a permanent-looking message still retries.
//! Unknown errors default to recoverable.

use crate::config::RetryConfig;
use rand::Rng;

/// Error fragments that indicate a transient failure worth retrying.
const RECOVERABLE_PATTERNS: &[&str] = &[
    "timeout",
    "connection",
    "network",
    "rate limit",
    "server error",
    "5xx",
    "temporary",
    "retry",
];

/// Error fragments that indicate a permanent failure.
const NON_RECOVERABLE_PATTERNS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "not found",
    "invalid",
    "malformed",
    "file not exist",
];

/// Whether an error message describes a transient condition.
pub fn is_recoverable(error: &str) -> bool {
    let lower = error.to_lowercase();
    if RECOVERABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    if NON_RECOVERABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return false;
    }
    true
}

/// Retry decisions and backoff delays for failed task executions.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Whether a task that just failed with `error` on attempt
    /// `retry_count` should be rescheduled.
    pub fn should_retry(&self, error: &str, retry_count: u32) -> bool {
        if retry_count > self.config.max_retries {
            return false;
        }
        is_recoverable(error)
    }

    /// Exponential backoff delay in minutes before attempt `retry_count`,
    /// without jitter. Capped at the configured maximum.
    pub fn base_delay_minutes(&self, retry_count: u32) -> f64 {
        let exponent = retry_count.saturating_sub(1);
        let delay = self.config.base_delay_minutes as f64 * self.config.backoff_base.powi(exponent as i32);
        delay.min(self.config.max_delay_minutes as f64)
    }

    /// Backoff delay with +/-20% jitter applied, in minutes. The cap
    /// holds after jitter too, so a jittered delay never exceeds the
    /// configured maximum.
    pub fn delay_minutes(&self, retry_count: u32, rng: &mut impl Rng) -> f64 {
        let jitter = rng.random_range(0.8..=1.2);
        (self.base_delay_minutes(retry_count) * jitter).min(self.config.max_delay_minutes as f64)
    }

    /// Unix-ms timestamp at which the next attempt becomes claimable.
    pub fn next_attempt_at(&self, now_ms: i64, retry_count: u32, rng: &mut impl Rng) -> i64 {
        now_ms + (self.delay_minutes(retry_count, rng) * 60_000.0) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(RetryConfig::default())
    }

    #[test]
    fn test_recoverable_patterns() {
        assert!(is_recoverable("Connection reset by peer"));
        assert!(is_recoverable("request timeout after 30s"));
        assert!(is_recoverable("HTTP 429: rate limit exceeded"));
        assert!(is_recoverable("internal server error"));
    }

    #[test]
    fn test_non_recoverable_patterns() {
        assert!(!is_recoverable("401 Unauthorized"));
        assert!(!is_recoverable("media file not exist"));
        assert!(!is_recoverable("invalid request payload"));
        assert!(!is_recoverable("403 Forbidden"));
    }

    #[test]
    fn test_recoverable_wins_over_non_recoverable() {
        // Both lists match; the transient signal takes precedence
        assert!(is_recoverable("temporary unauthorized error"));
    }

    #[test]
    fn test_unknown_error_defaults_to_recoverable() {
        assert!(is_recoverable("something completely unexpected"));
    }

    #[test]
    fn test_retry_exhaustion() {
        let policy = policy();
        assert!(policy.should_retry("timeout", 1));
        assert!(policy.should_retry("timeout", 3));
        assert!(!policy.should_retry("timeout", 4));
    }

    #[test]
    fn test_non_recoverable_never_retries() {
        assert!(!policy().should_retry("401 Unauthorized", 1));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = policy();
        assert_eq!(policy.base_delay_minutes(1), 30.0);
        assert_eq!(policy.base_delay_minutes(2), 60.0);
        assert_eq!(policy.base_delay_minutes(3), 120.0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = policy();
        assert_eq!(policy.base_delay_minutes(4), 240.0);
        assert_eq!(policy.base_delay_minutes(10), 240.0);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let delay = policy.delay_minutes(2, &mut rng);
            assert!((48.0..=72.0).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let delay = policy.delay_minutes(10, &mut rng);
            assert!(delay <= 240.0, "jittered delay {} above cap", delay);
        }
    }

    #[test]
    fn test_next_attempt_is_in_the_future() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(7);
        let now = 1_700_000_000_000;
        assert!(policy.next_attempt_at(now, 1, &mut rng) > now);
    }
}
