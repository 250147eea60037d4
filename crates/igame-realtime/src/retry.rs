//! Reconnect policy for realtime subscriptions.

use std::time::Duration;

/// How the delay before each reconnect is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

/// Decides whether and when a failed subscription is retried.
///
/// `attempt` counts consecutive failures since the last successful
/// subscribe, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub strategy: DelayStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(10),
            strategy: DelayStrategy::Fixed(Duration::from_millis(2000)),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            max_attempts,
            strategy: DelayStrategy::Fixed(delay),
        }
    }

    pub fn exponential(base: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            max_attempts,
            strategy: DelayStrategy::Exponential { base, max },
        }
    }

    /// Never reconnect.
    pub fn never() -> Self {
        Self::fixed(Duration::ZERO, Some(0))
    }

    /// Delay before reconnect number `attempt`, or `None` to give up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        if self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }
        Some(match self.strategy {
            DelayStrategy::Fixed(delay) => delay,
            DelayStrategy::Exponential { base, max } => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                base.checked_mul(factor).unwrap_or(max).min(max)
            }
        })
    }
}
