//! Execution controls: per-attempt timeout and retry with exponential backoff.

use std::time::{Duration, Instant};

use crate::domain::ProviderOptions;
use crate::executor::policy::RunPolicy;
use crate::metrics::METRICS;
use crate::obs::emit_case_retry;
use crate::provider::{ProviderAdapter, ProviderError, ProviderResponse};

/// Terminal state of one case's provider calls.
#[derive(Debug)]
pub struct Settled {
    /// The successful response, or the last error seen.
    pub result: Result<ProviderResponse, ProviderError>,
    /// Retries performed after the first attempt.
    pub retries: u32,
    /// Latency of the final attempt in milliseconds.
    pub latency_ms: u64,
}

async fn attempt(
    adapter: &dyn ProviderAdapter,
    prompt: &str,
    options: &ProviderOptions,
    policy: &RunPolicy,
) -> Result<ProviderResponse, ProviderError> {
    if policy.attempt_timeout_ms == 0 {
        return adapter.evaluate(prompt, options).await;
    }
    let limit = Duration::from_millis(policy.attempt_timeout_ms);
    match tokio::time::timeout(limit, adapter.evaluate(prompt, options)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ProviderError::Timeout {
            limit_ms: policy.attempt_timeout_ms,
        }),
    }
}

/// Invoke `adapter` until it succeeds, fails permanently, or transient
/// failures exhaust `policy.max_retries`.
///
/// The delay before retry `n` (0-based) is `base_delay × 2^n`, capped at
/// `max_backoff`.
pub async fn evaluate_with_retry(
    adapter: &dyn ProviderAdapter,
    case_id: &str,
    prompt: &str,
    options: &ProviderOptions,
    policy: &RunPolicy,
) -> Settled {
    let mut retries = 0;

    loop {
        let started = Instant::now();
        let result = attempt(adapter, prompt, options, policy).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let latency_ms = response.latency_ms;
                return Settled {
                    result: Ok(response),
                    retries,
                    latency_ms,
                };
            }
            Err(err) => {
                let failed = ProviderResponse::failed(&err, elapsed_ms);
                if !err.is_transient() || retries >= policy.max_retries {
                    return Settled {
                        result: Err(err),
                        retries,
                        latency_ms: failed.latency_ms,
                    };
                }

                let delay = policy.backoff_delay(retries);
                retries += 1;
                METRICS.inc_retries();
                emit_case_retry(case_id, retries, &err, failed.status, delay.as_millis() as u64);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProviderIdentity;
    use crate::provider::ProviderResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times with `error`, then answers "ok".
    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        error: ProviderError,
    }

    impl Flaky {
        fn new(failures: u32, error: ProviderError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                error,
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for Flaky {
        fn identity(&self) -> ProviderIdentity {
            ProviderIdentity::new("flaky", None)
        }

        async fn evaluate(
            &self,
            _prompt: &str,
            _options: &ProviderOptions,
        ) -> ProviderResult<ProviderResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(ProviderResponse::success("ok", 1))
            }
        }
    }

    fn policy(max_retries: u32) -> RunPolicy {
        RunPolicy {
            max_retries,
            base_delay_ms: 100,
            max_backoff_ms: 1_000,
            attempt_timeout_ms: 1_000,
            ..RunPolicy::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let adapter = Flaky::new(0, ProviderError::Connectivity("x".into()));
        let settled =
            evaluate_with_retry(&adapter, "c", "p", &ProviderOptions::default(), &policy(2)).await;
        assert!(settled.result.is_ok());
        assert_eq!(settled.retries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let adapter = Flaky::new(3, ProviderError::Connectivity("reset".into()));
        let settled =
            evaluate_with_retry(&adapter, "c", "p", &ProviderOptions::default(), &policy(3)).await;
        assert_eq!(settled.result.unwrap().text, "ok");
        assert_eq!(settled.retries, 3);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_retries_and_keeps_last_error() {
        let adapter = Flaky::new(10, ProviderError::RateLimited("429".into()));
        let settled =
            evaluate_with_retry(&adapter, "c", "p", &ProviderOptions::default(), &policy(2)).await;
        assert_eq!(settled.retries, 2);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(settled.result, Err(ProviderError::RateLimited(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let adapter = Flaky::new(10, ProviderError::MalformedRequest("bad".into()));
        let settled =
            evaluate_with_retry(&adapter, "c", "p", &ProviderOptions::default(), &policy(5)).await;
        assert_eq!(settled.retries, 0);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
        assert!(settled.result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_elapse() {
        let adapter = Flaky::new(2, ProviderError::Connectivity("x".into()));
        let start = tokio::time::Instant::now();
        let settled =
            evaluate_with_retry(&adapter, "c", "p", &ProviderOptions::default(), &policy(2)).await;
        assert!(settled.result.is_ok());
        // 100ms + 200ms of virtual backoff.
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    struct Hangs;

    #[async_trait]
    impl ProviderAdapter for Hangs {
        fn identity(&self) -> ProviderIdentity {
            ProviderIdentity::new("hangs", None)
        }

        async fn evaluate(
            &self,
            _prompt: &str,
            _options: &ProviderOptions,
        ) -> ProviderResult<ProviderResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ProviderResponse::success("late", 0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_transient() {
        let settled =
            evaluate_with_retry(&Hangs, "c", "p", &ProviderOptions::default(), &policy(1)).await;
        assert_eq!(settled.retries, 1);
        match settled.result {
            Err(ProviderError::Timeout { limit_ms }) => assert_eq!(limit_ms, 1_000),
            other => panic!("expected Timeout, got {other:?}"),
        }
    }
}
