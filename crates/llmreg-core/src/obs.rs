//! Structured observability hooks for run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span via the `RunSpan` RAII guard
//! - Emission functions for the events a run goes through
//!
//! Events are emitted at `info!` level (retries and timeouts at `warn!`).
//! Filter with `LLMREG_LOG`; for JSON output pass `--json` to the CLI or set
//! `LLMREG_LOG_FORMAT=json`.

use tracing::{info, warn};

use crate::compare::{DeltaCounts, RegressionDelta};
use crate::domain::{RunSummary, Verdict};
use crate::metrics::METRICS;
use crate::provider::{ProviderError, ResponseStatus};

/// RAII guard that enters a span for synchronous work on one run, such as
/// writing or comparing reports.
///
/// Not meant to be held across `.await`; async code uses `#[instrument]`.
///
/// ```ignore
/// let _span = RunSpan::enter("5f0c…");
/// // tracing calls here carry run_id = "5f0c…"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("llmreg.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started.
///
/// ```ignore
/// emit_run_started("5f0c…", "smoke", "openai/gpt-4o-mini", 12);
/// // logs: event=run.started run_id=5f0c… suite_id=smoke provider=openai/gpt-4o-mini cases=12
/// ```
pub fn emit_run_started(run_id: &str, suite_id: &str, provider: &str, cases: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        suite_id = %suite_id,
        provider = %provider,
        cases = cases,
    );
}

/// Emit event: a transient failure is about to be retried.
pub fn emit_case_retry(
    case_id: &str,
    attempt: u32,
    error: &ProviderError,
    status: ResponseStatus,
    delay_ms: u64,
) {
    warn!(
        event = "case.retry",
        case_id = %case_id,
        attempt = attempt,
        error_kind = error.kind(),
        status = ?status,
        delay_ms = delay_ms,
        error = %error,
    );
}

/// Emit event: a case reached its terminal verdict.
pub fn emit_case_finished(case_id: &str, verdict: Verdict, retries: u32, latency_ms: u64) {
    info!(
        event = "case.finished",
        case_id = %case_id,
        verdict = verdict.as_str(),
        retries = retries,
        latency_ms = latency_ms,
    );
}

/// Emit event: the run deadline passed with cases still in flight.
pub fn emit_run_timeout(run_id: &str, pending: usize) {
    warn!(event = "run.timeout", run_id = %run_id, pending = pending);
}

/// Emit event: run finished, with the verdict counts.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, summary: &RunSummary) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        ambiguous = summary.ambiguous,
        errored = summary.errored,
        pass_rate = summary.pass_rate,
    );
}

/// Emit event: two runs were compared.
pub fn emit_delta_computed(baseline_run_id: &str, candidate_run_id: &str, counts: &DeltaCounts) {
    info!(
        event = "delta.computed",
        baseline_run_id = %baseline_run_id,
        candidate_run_id = %candidate_run_id,
        regressed = counts.regressed,
        fixed = counts.fixed,
        new = counts.new,
        removed = counts.removed,
    );
}

/// Count a computed delta's regressions and emit `delta.computed`.
pub fn record_delta(delta: &RegressionDelta) {
    let counts = delta.counts();
    METRICS.add_regressions(counts.regressed as u64);
    emit_delta_computed(
        &delta.baseline_run_id.to_string(),
        &delta.candidate_run_id.to_string(),
        &counts,
    );
}

/// Emit event: gate evaluation completed with pass rate and verdict.
pub fn emit_gate_evaluated(run_id: &str, pass_rate: f32, passed: bool, violations: usize) {
    info!(
        event = "gate.evaluated",
        run_id = %run_id,
        pass_rate = pass_rate,
        passed = passed,
        violations = violations,
    );
}

/// Emit event: a report could not be persisted (warning level).
pub fn emit_report_write_error(run_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "report.write_error", run_id = %run_id, error = %error);
}
