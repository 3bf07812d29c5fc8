//! Global atomic counters for run observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocation or locking.
pub struct Metrics {
    cases_dispatched: AtomicU64,
    retries: AtomicU64,
    provider_errors: AtomicU64,
    regressions: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            cases_dispatched: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            provider_errors: AtomicU64::new(0),
            regressions: AtomicU64::new(0),
        }
    }

    /// One case handed to a provider.
    pub fn inc_cases_dispatched(&self) {
        self.cases_dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cases_dispatched", "counter incremented");
    }

    /// One retry scheduled after a transient failure.
    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "retries", "counter incremented");
    }

    /// One case that settled with a provider error.
    pub fn inc_provider_errors(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "provider_errors", "counter incremented");
    }

    /// Add `n` regressed cases found by a comparison.
    pub fn add_regressions(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.regressions.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "regressions", n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a CLI command) rather than on
    /// every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            cases_dispatched = self.cases_dispatched(),
            retries = self.retries(),
            provider_errors = self.provider_errors(),
            regressions = self.regressions(),
        );
    }

    pub fn cases_dispatched(&self) -> u64 {
        self.cases_dispatched.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn provider_errors(&self) -> u64 {
        self.provider_errors.load(Ordering::Relaxed)
    }

    pub fn regressions(&self) -> u64 {
        self.regressions.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.cases_dispatched.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.provider_errors.store(0, Ordering::Relaxed);
        self.regressions.store(0, Ordering::Relaxed);
    }
}
