//! Exponential backoff with jitter
//!
//! Delay policy for retrying after remote rate limits and transport drops.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Backoff configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffConfig {
    /// Base delay in milliseconds, doubled per consecutive failure.
    pub base_delay_ms: u64,
    /// Ceiling for any single delay in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter applied to each delay (percentage, 0-100).
    pub jitter_percent: u8,
    /// Maximum consecutive retries before a recoverable failure escalates
    /// (used by stream sources as the reconnect ceiling).
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,   // 1 second base
            max_delay_ms: 300_000, // 5 minute cap
            jitter_percent: 20,
            max_retries: 5,
        }
    }
}

impl BackoffConfig {
    /// Delay for the given consecutive-failure count: `base * 2^attempt`
    /// capped at the maximum, with jitter.
    ///
    /// `attempt` is 1-based (the first retry passes 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = calculate_backoff_with_jitter(
            attempt,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_percent,
        );
        debug!(attempt, delay_ms = delay.as_millis() as u64, "backoff delay");
        delay
    }

    /// Whether another retry is allowed after `attempt` consecutive failures.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

/// Calculate delay with exponential backoff and jitter (standalone function)
pub fn calculate_backoff_with_jitter(
    attempt: u32,
    base_ms: u64,
    max_ms: u64,
    jitter_percent: u8,
) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let base_delay = base_ms.saturating_mul(1u64 << exponent);
    let capped_delay = base_delay.min(max_ms);

    let jitter_range = capped_delay * u64::from(jitter_percent.min(100)) / 100;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range * 2) as i64 - jitter_range as i64
    } else {
        0
    };

    Duration::from_millis((capped_delay as i64 + jitter).max(0) as u64)
}
