//! Reconnect backoff policy.
//!
//! The delay starts at [`BACKOFF_INITIAL`], is slept after each failed
//! attempt, then doubles up to [`BACKOFF_MAX`]. A successful handshake resets
//! it, so the delay after the k-th consecutive failure is
//! `min(2^(k-1), 30)` seconds.

use std::time::Duration;

/// First reconnect delay.
pub const BACKOFF_INITIAL: Duration = Duration::from_secs(1);

/// Upper bound for the reconnect delay.
pub const BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: BACKOFF_INITIAL,
            max: BACKOFF_MAX,
        }
    }
}

/// Capped exponential backoff for a single channel.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current: config.initial.min(config.max),
            consecutive_failures: 0,
        }
    }

    /// Delay to sleep now; advances the policy for the next failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.config.max);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }

    /// Back to the initial delay (called after a confirmed handshake).
    pub fn reset(&mut self) {
        self.current = self.config.initial.min(self.config.max);
        self.consecutive_failures = 0;
    }

    /// Delay the next failure would sleep.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Failures since the last reset.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(d: Duration) -> u64 {
        d.as_secs()
    }

    #[test]
    fn test_doubles_and_caps_at_thirty() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..8).map(|_| secs(backoff.next_delay())).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
        assert_eq!(backoff.consecutive_failures(), 8);
    }

    #[test]
    fn test_delay_after_n_failures() {
        for n in 1..=10u32 {
            let mut backoff = Backoff::default();
            for _ in 0..n - 1 {
                backoff.next_delay();
            }
            let expected = 2u64.pow(n - 1).min(30);
            assert_eq!(secs(backoff.next_delay()), expected, "failure #{n}");
        }
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(secs(backoff.current()), 8);

        backoff.reset();

        assert_eq!(secs(backoff.current()), 1);
        assert_eq!(backoff.consecutive_failures(), 0);
        assert_eq!(secs(backoff.next_delay()), 1);
    }

    #[test]
    fn test_initial_above_max_is_clamped() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial: Duration::from_secs(60),
            max: Duration::from_secs(30),
        });
        assert_eq!(secs(backoff.next_delay()), 30);
        assert_eq!(secs(backoff.next_delay()), 30);
    }
}
