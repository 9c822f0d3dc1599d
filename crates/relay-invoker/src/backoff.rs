//! Jittered exponential backoff for retried tool dispatches.

use std::time::Duration;

/// Governs the Tool Invoker's retry schedule on transport-level failures
/// (§4.3): base 500ms, cap 4s, 2 retries by default.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(4_000),
            max_attempts: 2,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(base_ms: u64, cap_ms: u64, attempts: u32) -> Self {
        Self {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(cap_ms),
            max_attempts: attempts,
            backoff_factor: 2.0,
        }
    }

    /// Delay before retry attempt `attempt` (0-indexed: the first retry is
    /// attempt 0, i.e. the second dispatch overall).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let delay_ms = base_ms * self.backoff_factor.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        let jitter = capped_ms * 0.25 * pseudo_random_fraction(attempt);
        Duration::from_millis((capped_ms + jitter) as u64)
    }

    pub fn should_give_up(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

/// Cheap deterministic "random" fraction [0, 1) based on attempt number.
/// Not cryptographically secure — just enough to spread retry bursts.
fn pseudo_random_fraction(attempt: u32) -> f64 {
    let hash = attempt.wrapping_mul(2654435761);
    (hash as f64) / (u32::MAX as f64)
}
