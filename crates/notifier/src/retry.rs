//! Retry policy for event delivery

use std::time::Duration;

use crate::variant::ApiVariant;

/// Bounded exponential backoff without jitter.
///
/// After the `n`-th failed attempt the engine waits `base_delay * 2^n`, so with
/// the default one second base the schedule is 2s, 4s, 8s, ...
///
/// # Example
///
/// ```
/// use healthcheck_notifier::{ApiVariant, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::for_variant(ApiVariant::Resources);
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.delay_after_failure(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_after_failure(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Unit of the backoff schedule
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }

    /// The fixed policy of an API variant
    pub fn for_variant(variant: ApiVariant) -> Self {
        Self::exponential(variant.max_retries())
    }

    /// Delay to wait after `failures` failed attempts (1-based)
    pub fn delay_after_failure(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Check if there are remaining attempts
    pub fn has_attempts_remaining(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_variant(ApiVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_doubles() {
        let policy = RetryPolicy::exponential(5);

        assert_eq!(policy.delay_after_failure(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_after_failure(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_after_failure(3), Duration::from_millis(8000));
        assert_eq!(policy.delay_after_failure(4), Duration::from_millis(16000));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let policy = RetryPolicy::exponential(3);
        assert_eq!(policy.delay_after_failure(2), policy.delay_after_failure(2));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::exponential(3);
        assert!(policy.delay_after_failure(64) >= policy.delay_after_failure(31));
    }

    #[test]
    fn test_has_attempts_remaining() {
        let policy = RetryPolicy::exponential(3);

        assert!(policy.has_attempts_remaining(1));
        assert!(policy.has_attempts_remaining(2));
        assert!(!policy.has_attempts_remaining(3));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::exponential(0).max_attempts, 1);
    }

    #[test]
    fn test_default_matches_resources_variant() {
        assert_eq!(RetryPolicy::default().max_attempts, 3);
        assert_eq!(RetryPolicy::for_variant(ApiVariant::Components).max_attempts, 5);
    }
}
