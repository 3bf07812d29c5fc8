//! Test case definitions and expected-outcome specifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::options::ProviderOptions;

/// Canonical yes/no answer for boolean-classification cases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BooleanAnswer {
    Yes,
    No,
}

impl std::fmt::Display for BooleanAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// How a response is judged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpectedOutcome {
    /// Case-insensitive, whitespace-trimmed equality.
    Exact { value: String },

    /// Case-insensitive substring match.
    Contains { value: String },

    /// Response must normalize to the given yes/no token.
    Boolean { expect: BooleanAnswer },

    /// Case-insensitive regular expression tested against the trimmed response.
    Matches { pattern: String },
}

impl ExpectedOutcome {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact {
            value: value.into(),
        }
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self::Contains {
            value: value.into(),
        }
    }

    pub fn boolean(expect: BooleanAnswer) -> Self {
        Self::Boolean { expect }
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        Self::Matches {
            pattern: pattern.into(),
        }
    }

    /// Short name used in logs and rendered reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exact { .. } => "exact",
            Self::Contains { .. } => "contains",
            Self::Boolean { .. } => "boolean",
            Self::Matches { .. } => "matches",
        }
    }
}

/// Expected outcome as written in a suite file.
///
/// A bare string is shorthand for [`ExpectedOutcome::Exact`]. Anything
/// else that is not a well-formed outcome lands in `Unrecognized` so the
/// registry can reject it with the offending case's index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExpectedSpec {
    Literal(String),
    Outcome(ExpectedOutcome),
    Unrecognized(Value),
}

impl ExpectedSpec {
    /// Resolve to an outcome, or describe why the value is not one.
    pub fn into_outcome(self) -> Result<ExpectedOutcome, String> {
        match self {
            Self::Literal(value) => Ok(ExpectedOutcome::Exact { value }),
            Self::Outcome(outcome) => Ok(outcome),
            Self::Unrecognized(value) => match serde_json::from_value::<ExpectedOutcome>(value) {
                Ok(outcome) => Ok(outcome),
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

/// Raw, unvalidated test case record as supplied by a suite source.
///
/// `id` and `prompt` stay as raw JSON so a wrongly typed field is reported
/// as a malformed case rather than a parse failure of the whole suite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub prompt: Option<Value>,

    #[serde(default)]
    pub expected: Option<ExpectedSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ProviderOptions>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// A validated test case. Only the registry constructs these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Identifier, unique within a suite.
    pub id: String,

    /// Prompt sent to the provider.
    pub prompt: String,

    /// How the response is judged.
    pub expected: ExpectedOutcome,

    /// Per-case provider options, merged over the policy defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ProviderOptions>,

    /// Tags for filtering and gate rules.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TestCase {
    /// Build a case directly. Used by tests and programmatic suites; the
    /// registry still performs duplicate and shape checks on load.
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, expected: ExpectedOutcome) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected,
            options: None,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Convert back into a raw record (for building suites programmatically).
    pub fn into_record(self) -> CaseRecord {
        CaseRecord {
            id: Some(Value::String(self.id)),
            prompt: Some(Value::String(self.prompt)),
            expected: Some(ExpectedSpec::Outcome(self.expected)),
            options: self.options,
            tags: self.tags,
        }
    }

    /// Effective provider options for this case.
    pub fn effective_options(&self, defaults: &ProviderOptions) -> ProviderOptions {
        match &self.options {
            Some(options) => options.merged_over(defaults),
            None => defaults.clone(),
        }
    }
}
