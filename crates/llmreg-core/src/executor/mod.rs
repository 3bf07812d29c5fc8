//! Run executor: dispatches every registry case to a provider, judges the
//! answers and assembles the [`RunReport`].
//!
//! Cases run concurrently up to `policy.max_concurrency`. Each task owns its
//! case's retry state until it hands a terminal [`Outcome`] back to the
//! collection loop, which is the only writer of the outcome slots. Slots are
//! indexed by registry position, so the report is in registry order no
//! matter which case finishes first.
//!
//! # Modules
//!
//! - [`policy`]: `RunPolicy` (retries, backoff, timeouts, concurrency)
//! - [`retry`]: `evaluate_with_retry()`

pub mod policy;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::{Outcome, Result, RunReport, TestCase};
use crate::judge::Judge;
use crate::metrics::METRICS;
use crate::obs::{emit_case_finished, emit_run_finished, emit_run_started, emit_run_timeout};
use crate::provider::ProviderAdapter;
use crate::registry::CaseRegistry;

pub use policy::RunPolicy;
pub use retry::{evaluate_with_retry, Settled};

/// Run one case to a terminal outcome. Never fails: provider errors become
/// an error verdict.
pub async fn execute_case(
    case: &TestCase,
    adapter: &dyn ProviderAdapter,
    judge: &Judge,
    policy: &RunPolicy,
) -> Outcome {
    METRICS.inc_cases_dispatched();
    let options = case.effective_options(&policy.default_options);
    let settled = evaluate_with_retry(adapter, &case.id, &case.prompt, &options, policy).await;

    let outcome = match settled.result {
        Ok(response) => {
            let verdict = judge.judge(&response.text, &case.expected);
            Outcome::judged(
                case.id.clone(),
                verdict,
                response.text,
                response.latency_ms,
                settled.retries,
            )
        }
        Err(err) => {
            METRICS.inc_provider_errors();
            warn!(case_id = %case.id, error = %err, retries = settled.retries, "case errored");
            Outcome::errored(
                case.id.clone(),
                err.to_string(),
                settled.latency_ms,
                settled.retries,
            )
        }
    };
    outcome.with_tags(case.tags.clone())
}

/// Execute every case in `registry` against `adapter`.
///
/// Returns `Err` only for an invalid policy. Provider failures, panicking
/// case tasks and a run-level timeout all still produce a complete report
/// with one outcome per case.
#[instrument(
    skip(registry, adapter, policy),
    fields(suite_id = %registry.suite_id(), run_id = tracing::field::Empty)
)]
pub async fn run(
    registry: &CaseRegistry,
    adapter: Arc<dyn ProviderAdapter>,
    policy: &RunPolicy,
) -> Result<RunReport> {
    policy.validate()?;

    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));
    let started_at = Utc::now();
    let provider = adapter.identity();
    emit_run_started(&run_id.to_string(), registry.suite_id(), &provider.to_string(), registry.len());

    let judge = Arc::new(registry.judge());
    let shared_policy = Arc::new(policy.clone());
    let semaphore = Arc::new(Semaphore::new(policy.max_concurrency));
    let mut tasks = JoinSet::new();

    for (index, case) in registry.cases().iter().enumerate() {
        let case = case.clone();
        let adapter = Arc::clone(&adapter);
        let judge = Arc::clone(&judge);
        let policy = Arc::clone(&shared_policy);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let outcome = execute_case(&case, adapter.as_ref(), &judge, &policy).await;
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<Outcome>> = (0..registry.len()).map(|_| None).collect();
    let deadline = policy
        .run_timeout_ms
        .map(|ms| tokio::time::Instant::now() + Duration::from_millis(ms));
    let mut timed_out = false;

    loop {
        let next = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(next) => next,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            },
            None => tasks.join_next().await,
        };

        let Some(joined) = next else { break };
        match joined {
            Ok((index, outcome)) => {
                emit_case_finished(&outcome.case_id, outcome.verdict, outcome.retry_count, outcome.latency_ms);
                slots[index] = Some(outcome);
            }
            Err(e) => warn!(error = %e, "case task did not complete"),
        }
    }

    let pending_reason = if timed_out {
        tasks.abort_all();
        let pending = slots.iter().filter(|s| s.is_none()).count();
        emit_run_timeout(&run_id.to_string(), pending);
        format!(
            "run timeout exceeded after {}ms",
            policy.run_timeout_ms.unwrap_or_default()
        )
    } else {
        "case task did not complete".to_string()
    };

    let outcomes: Vec<Outcome> = registry
        .cases()
        .iter()
        .zip(slots)
        .map(|(case, slot)| {
            slot.unwrap_or_else(|| {
                Outcome::errored(case.id.clone(), pending_reason.clone(), 0, 0)
                    .with_tags(case.tags.clone())
            })
        })
        .collect();

    let report = RunReport::with_run_id(
        run_id,
        registry.suite_id(),
        registry.digest(),
        provider,
        started_at,
        Utc::now(),
        outcomes,
    );
    emit_run_finished(&run_id.to_string(), report.duration_ms(), &report.summary());
    Ok(report)
}
