//! Verdicts and per-case outcomes.

use serde::{Deserialize, Serialize};

/// Classification of a single case in a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Response satisfied the expected outcome.
    Pass,
    /// Response was judged and did not satisfy the expected outcome.
    Fail,
    /// The judge could not classify the response. Never folded into pass or fail.
    Ambiguous,
    /// No response could be judged (provider failure or run timeout).
    Error,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Ambiguous => "ambiguous",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one test case in one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub case_id: String,

    pub verdict: Verdict,

    /// Raw response text from the last successful attempt, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Latency of the last attempt in milliseconds.
    pub latency_ms: u64,

    /// Number of retries performed (0 = first attempt settled it).
    pub retry_count: u32,

    /// Description of the last error when `verdict == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Tags inherited from the test case.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Outcome {
    /// Outcome for a judged response.
    pub fn judged(
        case_id: impl Into<String>,
        verdict: Verdict,
        response: String,
        latency_ms: u64,
        retry_count: u32,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            verdict,
            response: Some(response),
            latency_ms,
            retry_count,
            error: None,
            tags: Vec::new(),
        }
    }

    /// Outcome for a case that never produced a judgeable response.
    pub fn errored(
        case_id: impl Into<String>,
        error: impl Into<String>,
        latency_ms: u64,
        retry_count: u32,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            verdict: Verdict::Error,
            response: None,
            latency_ms,
            retry_count,
            error: Some(error.into()),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}
