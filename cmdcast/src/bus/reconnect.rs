//! Reconnect delay policy
//!
//! The delay before retry `n` (0-indexed) is `initial × factor^n`, clamped
//! to `max`. There is no attempt limit: the listener retries until it
//! succeeds.

use std::time::Duration;

/// Capped exponential delay between failed reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay after the first failed attempt
    pub initial: Duration,
    /// Upper bound for any delay
    pub max: Duration,
    /// Growth factor per failed attempt (`>= 1.0`)
    pub factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
        }
    }
}

impl ReconnectPolicy {
    /// Retry back-to-back with no delay
    pub fn immediate() -> Self {
        Self {
            initial: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.initial.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
