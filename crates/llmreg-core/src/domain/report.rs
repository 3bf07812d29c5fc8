//! Run reports: the persisted unit of comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::outcome::{Outcome, Verdict};

/// Which backend produced a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderIdentity {
    /// Provider kind (e.g. `openai`, `scripted`).
    pub name: String,

    /// Model identifier, when the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderIdentity {
    pub fn new(name: impl Into<String>, model: Option<String>) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}/{}", self.name, model),
            None => f.write_str(&self.name),
        }
    }
}

/// Aggregate counts for a run.
///
/// `ambiguous` and `errored` are reported on their own and are never folded
/// into `passed` or `failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub ambiguous: usize,
    pub errored: usize,
    /// `passed / total`, or 0.0 for an empty run.
    pub pass_rate: f32,
}

/// Immutable snapshot of one run of a suite against one provider.
///
/// # Invariants
///
/// `outcomes` has exactly one entry per registry case, in registry order.
/// Fields are private so a finalized report cannot be altered; build one
/// with [`RunReport::new`] (the executor does this) or deserialize a stored
/// report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    run_id: Uuid,
    suite_id: String,
    #[serde(default)]
    suite_digest: String,
    provider: ProviderIdentity,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    outcomes: Vec<Outcome>,
}

impl RunReport {
    pub fn new(
        suite_id: impl Into<String>,
        suite_digest: impl Into<String>,
        provider: ProviderIdentity,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: Vec<Outcome>,
    ) -> Self {
        Self::with_run_id(
            Uuid::new_v4(),
            suite_id,
            suite_digest,
            provider,
            started_at,
            finished_at,
            outcomes,
        )
    }

    /// Like [`RunReport::new`] but with a caller-chosen run id.
    pub fn with_run_id(
        run_id: Uuid,
        suite_id: impl Into<String>,
        suite_digest: impl Into<String>,
        provider: ProviderIdentity,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: Vec<Outcome>,
    ) -> Self {
        Self {
            run_id,
            suite_id: suite_id.into(),
            suite_digest: suite_digest.into(),
            provider,
            started_at,
            finished_at,
            outcomes,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn suite_id(&self) -> &str {
        &self.suite_id
    }

    pub fn suite_digest(&self) -> &str {
        &self.suite_digest
    }

    pub fn provider(&self) -> &ProviderIdentity {
        &self.provider
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Outcomes in registry order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, case_id: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.case_id == case_id)
    }

    pub fn summary(&self) -> RunSummary {
        let count = |v: Verdict| self.outcomes.iter().filter(|o| o.verdict == v).count();
        let total = self.outcomes.len();
        let passed = count(Verdict::Pass);
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f32 / total as f32
        };
        RunSummary {
            total,
            passed,
            failed: count(Verdict::Fail),
            ambiguous: count(Verdict::Ambiguous),
            errored: count(Verdict::Error),
            pass_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdicts: &[(&str, Verdict)]) -> RunReport {
        let outcomes = verdicts
            .iter()
            .map(|(id, v)| match v {
                Verdict::Error => Outcome::errored(*id, "boom", 0, 0),
                other => Outcome::judged(*id, *other, "text".to_string(), 5, 0),
            })
            .collect();
        let now = Utc::now();
        RunReport::new(
            "suite",
            "digest",
            ProviderIdentity::new("scripted", None),
            now,
            now,
            outcomes,
        )
    }

    #[test]
    fn test_summary_counts_each_verdict_separately() {
        let r = report(&[
            ("a", Verdict::Pass),
            ("b", Verdict::Fail),
            ("c", Verdict::Ambiguous),
            ("d", Verdict::Error),
        ]);
        let s = r.summary();
        assert_eq!(s.total, 4);
        assert_eq!(s.passed, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.ambiguous, 1);
        assert_eq!(s.errored, 1);
        assert_eq!(s.pass_rate, 0.25);
    }

    #[test]
    fn test_empty_report_pass_rate_is_zero() {
        let r = report(&[]);
        assert_eq!(r.summary().pass_rate, 0.0);
    }

    #[test]
    fn test_report_serde_preserves_order_and_identity() {
        let r = report(&[("z", Verdict::Pass), ("a", Verdict::Fail)]);
        let json = serde_json::to_string(&r).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
        assert_eq!(back.outcomes()[0].case_id, "z");
        assert_eq!(back.run_id(), r.run_id());
    }

    #[test]
    fn test_provider_identity_display() {
        assert_eq!(
            ProviderIdentity::new("openai", Some("gpt-4o".to_string())).to_string(),
            "openai/gpt-4o"
        );
        assert_eq!(ProviderIdentity::new("echo", None).to_string(), "echo");
    }
}
