//! # Backoff calculation for failing pollers.
//!
//! [`next_delay`] is the pure rule behind every scheduling decision:
//!
//! ```text
//! delay = min(interval × 2^error_count, max_interval)
//! ```
//!
//! - `error_count = 0` yields `interval` (the normal cadence);
//! - every consecutive failure doubles the delay;
//! - the result never exceeds `max_interval`, and huge counts never overflow.
//!
//! [`BackoffPolicy`] bundles the three inputs that live in a
//! [`PollerConfig`](crate::PollerConfig) and applies a [`JitterPolicy`] on top of the
//! clamped base. Jitter output never feeds back into later computations: the base
//! is derived from the error count alone.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     interval: Duration::from_secs(1),
//!     max: Duration::from_secs(10),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! assert_eq!(backoff.next(2), Duration::from_secs(4));
//! // 1s × 2^10 = 1024s → capped at max=10s
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Computes `min(interval × 2^error_count, max_interval)` without overflowing.
///
/// Pure: no state, no side effects.
pub fn next_delay(interval: Duration, error_count: u32, max_interval: Duration) -> Duration {
    if interval.is_zero() {
        return Duration::ZERO;
    }
    let Some(factor) = 1u32.checked_shl(error_count) else {
        return max_interval;
    };
    match interval.checked_mul(factor) {
        Some(d) => d.min(max_interval),
        None => max_interval,
    }
}

/// Backoff parameters of one poller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay used while the action keeps succeeding.
    pub interval: Duration,
    /// Upper bound for the backed-off delay.
    pub max: Duration,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl BackoffPolicy {
    /// Delay before the next invocation after `error_count` consecutive failures.
    pub fn next(&self, error_count: u32) -> Duration {
        self.jitter
            .apply(next_delay(self.interval, error_count, self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_zero_errors_is_interval() {
        assert_eq!(next_delay(SEC, 0, Duration::from_secs(30)), SEC);
    }

    #[test]
    fn test_doubles_per_error() {
        let max = Duration::from_secs(300);
        assert_eq!(next_delay(SEC, 1, max), Duration::from_secs(2));
        assert_eq!(next_delay(SEC, 2, max), Duration::from_secs(4));
        assert_eq!(next_delay(SEC, 3, max), Duration::from_secs(8));
        assert_eq!(next_delay(SEC, 8, max), Duration::from_secs(256));
    }

    #[test]
    fn test_clamped_to_max() {
        let max = Duration::from_secs(10);
        assert_eq!(next_delay(SEC, 4, max), max);
        assert_eq!(next_delay(SEC, 31, max), max);
    }

    #[test]
    fn test_huge_error_count_does_not_overflow() {
        let max = Duration::from_secs(300);
        assert_eq!(next_delay(SEC, 32, max), max);
        assert_eq!(next_delay(SEC, 1_000, max), max);
        assert_eq!(next_delay(SEC, u32::MAX, max), max);
        assert_eq!(next_delay(Duration::MAX, 1, max), max);
    }

    #[test]
    fn test_interval_above_max_is_clamped() {
        let max = Duration::from_secs(5);
        assert_eq!(next_delay(Duration::from_secs(8), 0, max), max);
    }

    #[test]
    fn test_monotonic_in_error_count() {
        let interval = Duration::from_millis(1500);
        let max = Duration::from_secs(300);
        let mut prev = Duration::ZERO;
        for e in 0..80 {
            let d = next_delay(interval, e, max);
            assert!(d >= prev, "error_count {e}: {d:?} < {prev:?}");
            assert!(d <= max);
            prev = d;
        }
    }

    #[test]
    fn test_matches_formula_below_cap() {
        let interval = Duration::from_millis(250);
        let max = Duration::from_secs(3600);
        for e in 0..12u32 {
            let expected = Duration::from_millis(250 * 2u64.pow(e)).min(max);
            assert_eq!(next_delay(interval, e, max), expected);
        }
    }

    #[test]
    fn test_policy_without_jitter_is_exact() {
        let policy = BackoffPolicy {
            interval: Duration::from_millis(1000),
            max: Duration::from_millis(10_000),
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_millis(1000));
        assert_eq!(policy.next(1), Duration::from_millis(2000));
        assert_eq!(policy.next(2), Duration::from_millis(4000));
        assert_eq!(policy.next(5), Duration::from_millis(10_000));
    }

    #[test]
    fn test_policy_equal_jitter_bounds() {
        let policy = BackoffPolicy {
            interval: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::Equal,
        };
        for e in 0..10 {
            let base = next_delay(policy.interval, e, policy.max);
            let d = policy.next(e);
            assert!(d >= base / 2, "error_count {e}: {d:?} below half of {base:?}");
            assert!(d <= base, "error_count {e}: {d:?} above {base:?}");
        }
    }
}
