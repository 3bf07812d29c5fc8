//! Run policy: retry, timeout and concurrency limits for one run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ProviderOptions, RegressionError, Result};

/// Configuration passed explicitly into every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunPolicy {
    /// Retries after the first attempt for transient failures (0 = run once).
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds).
    pub base_delay_ms: u64,
    /// Upper bound on any single backoff delay (milliseconds).
    pub max_backoff_ms: u64,
    /// Wall-clock limit for a single provider attempt (milliseconds, 0 = none).
    pub attempt_timeout_ms: u64,
    /// Maximum number of cases in flight at once.
    pub max_concurrency: usize,
    /// Deadline for the whole run (milliseconds).
    pub run_timeout_ms: Option<u64>,
    /// Options applied to every case unless the case overrides them.
    pub default_options: ProviderOptions,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_backoff_ms: 8_000,
            attempt_timeout_ms: 30_000,
            max_concurrency: 4,
            run_timeout_ms: None,
            default_options: ProviderOptions::default(),
        }
    }
}

impl RunPolicy {
    /// Reject policies that cannot make progress.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(RegressionError::InvalidPolicy(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(RegressionError::InvalidPolicy(
                "run_timeout_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (0-based):
    /// `min(base_delay × 2^attempt, max_backoff)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let ms = 2u64
            .checked_pow(attempt)
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}
