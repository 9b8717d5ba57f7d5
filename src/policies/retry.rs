//! # Retry policy for pending deliveries.
//!
//! [`RetryPolicy`] holds the three knobs of the delivery state machine:
//! - [`RetryPolicy::interval`] delay between attempts (fixed, optionally jittered);
//! - [`RetryPolicy::max_retries`] retry budget after the first failure;
//! - [`RetryPolicy::timeout`] absolute lifetime of a pending record.
//!
//! The budget and the timeout are independent: the timeout is armed once when
//! the record is created and is never extended by retries.
//!
//! Both durations are capped at [`RetryPolicy::MAX_DELAY`] (365 days) when
//! armed; the manager's timer wheel cannot hold deadlines much further out.
//!
//! ```text
//! t=0        first attempt fails → record(retry_count=0), arm retry(+interval), arm timeout(+timeout)
//! t=1×iv     retry: attempt → fail → retry_count=1, arm retry(+interval)
//! ...
//! t=n×iv     retry: retry_count >= max_retries → exhausted
//! t=timeout  timeout: record still present → timed out
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delivery retry/timeout policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between a failed attempt and the next one.
    pub interval: Duration,
    /// Retries allowed after the first failed attempt.
    pub max_retries: u32,
    /// Absolute lifetime of a pending record, measured from its creation.
    pub timeout: Duration,
    /// Randomization applied to each interval.
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    /// Returns:
    /// - `interval = 5s`;
    /// - `max_retries = 3`;
    /// - `timeout = 30s`;
    /// - `jitter = None`.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_retries: 3,
            timeout: Duration::from_secs(30),
            jitter: JitterPolicy::None,
        }
    }
}

impl RetryPolicy {
    /// Upper bound for any armed retry or timeout delay.
    pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Delay before the next retry callback, capped at [`Self::MAX_DELAY`].
    pub fn next_delay(&self) -> Duration {
        self.jitter.apply(self.interval.min(Self::MAX_DELAY))
    }

    /// Record lifetime capped at [`Self::MAX_DELAY`].
    #[inline]
    pub fn timeout_clamped(&self) -> Duration {
        self.timeout.min(Self::MAX_DELAY)
    }

    /// True if a record that has already been retried `retry_count` times may
    /// be attempted again.
    #[inline]
    pub fn allows(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Upper bound on capability invocations for one logical delivery.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.interval, Duration::from_secs(5));
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.timeout, Duration::from_secs(30));
        assert_eq!(p.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn budget_boundary() {
        let p = RetryPolicy::default();
        assert!(p.allows(0));
        assert!(p.allows(2));
        assert!(!p.allows(3));
        assert!(!p.allows(4));
        assert_eq!(p.max_attempts(), 4);
    }

    #[test]
    fn huge_durations_are_capped() {
        let p = RetryPolicy {
            interval: Duration::MAX,
            timeout: Duration::from_secs(5 * 365 * 24 * 60 * 60),
            ..RetryPolicy::default()
        };
        assert_eq!(p.next_delay(), RetryPolicy::MAX_DELAY);
        assert_eq!(p.timeout_clamped(), RetryPolicy::MAX_DELAY);
        assert_eq!(RetryPolicy::default().timeout_clamped(), Duration::from_secs(30));
    }

    #[test]
    fn zero_budget_never_retries() {
        let p = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert!(!p.allows(0));
        assert_eq!(p.max_attempts(), 1);
    }
}
