//! Test case registry: the validated, ordered suite a run executes.
//!
//! Loading is deterministic and all-or-nothing. A suite with a duplicate
//! identifier or a case missing its identifier, prompt or expected outcome
//! is rejected before any provider is contacted.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::digest::compute_digest;
use crate::domain::{CaseRecord, ExpectedOutcome, RegressionError, Result, TestCase};
use crate::judge::{BooleanVocabulary, Judge};

/// A suite as supplied by a suite source (file, database, in-memory).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteDefinition {
    pub suite_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Overrides the default yes/no vocabulary for boolean cases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<BooleanVocabulary>,

    #[serde(default)]
    pub cases: Vec<CaseRecord>,
}

impl SuiteDefinition {
    pub fn new(suite_id: impl Into<String>) -> Self {
        Self {
            suite_id: suite_id.into(),
            name: None,
            version: None,
            vocabulary: None,
            cases: Vec::new(),
        }
    }

    pub fn add_case(mut self, case: TestCase) -> Self {
        self.cases.push(case.into_record());
        self
    }

    pub fn add_record(mut self, record: CaseRecord) -> Self {
        self.cases.push(record);
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: BooleanVocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }
}

/// Ordered, duplicate-checked, read-only collection of test cases.
#[derive(Debug, Clone)]
pub struct CaseRegistry {
    suite_id: String,
    name: Option<String>,
    version: Option<String>,
    vocabulary: BooleanVocabulary,
    digest: String,
    cases: Vec<TestCase>,
    /// `matches` patterns compiled once at load, keyed by source text.
    patterns: Arc<HashMap<String, Regex>>,
}

impl CaseRegistry {
    /// Validate a suite definition into a registry.
    pub fn load(definition: SuiteDefinition) -> Result<Self> {
        let SuiteDefinition {
            suite_id,
            name,
            version,
            vocabulary,
            cases: records,
        } = definition;

        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(records.len());
        let mut patterns = HashMap::new();

        for (index, record) in records.into_iter().enumerate() {
            let (case, compiled) = validate_record(index, record)?;
            if !seen.insert(case.id.clone()) {
                return Err(RegressionError::DuplicateIdentifier(case.id));
            }
            if let (ExpectedOutcome::Matches { pattern }, Some(re)) = (&case.expected, compiled) {
                patterns.entry(pattern.clone()).or_insert(re);
            }
            cases.push(case);
        }

        let vocabulary = vocabulary.unwrap_or_default();
        let digest = suite_digest(&suite_id, &vocabulary, &cases)?;
        debug!(suite_id = %suite_id, cases = cases.len(), digest = %digest, "suite loaded");

        Ok(Self {
            suite_id,
            name,
            version,
            vocabulary,
            digest,
            cases,
            patterns: Arc::new(patterns),
        })
    }

    /// Load from already-built test cases, still enforcing all checks.
    pub fn from_cases(suite_id: impl Into<String>, cases: Vec<TestCase>) -> Result<Self> {
        let definition = cases
            .into_iter()
            .fold(SuiteDefinition::new(suite_id), SuiteDefinition::add_case);
        Self::load(definition)
    }

    /// Parse a JSON suite definition.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definition: SuiteDefinition = serde_json::from_str(json)?;
        Self::load(definition)
    }

    /// Read and parse a JSON suite file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn suite_id(&self) -> &str {
        &self.suite_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// SHA-256 of the canonical suite content.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn vocabulary(&self) -> &BooleanVocabulary {
        &self.vocabulary
    }

    /// A judge configured with this suite's vocabulary.
    pub fn judge(&self) -> Judge {
        Judge::new(self.vocabulary.clone()).with_patterns(Arc::clone(&self.patterns))
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, case_id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == case_id)
    }

    /// A new registry holding only cases carrying at least one of `tags`,
    /// in the original order. An empty tag list keeps every case.
    pub fn filter_by_tags(&self, tags: &[String]) -> Result<Self> {
        if tags.is_empty() {
            return Ok(self.clone());
        }
        let cases: Vec<TestCase> = self
            .cases
            .iter()
            .filter(|c| c.tags.iter().any(|t| tags.contains(t)))
            .cloned()
            .collect();
        let digest = suite_digest(&self.suite_id, &self.vocabulary, &cases)?;
        Ok(Self {
            suite_id: self.suite_id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            vocabulary: self.vocabulary.clone(),
            digest,
            cases,
            patterns: Arc::clone(&self.patterns),
        })
    }
}

/// A string-valued raw field. `None` when absent or null.
fn text_field(index: usize, field: &str, value: Option<Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(RegressionError::malformed(
            index,
            format!("field '{field}' must be a string, got {other}"),
        )),
    }
}

fn validate_record(index: usize, record: CaseRecord) -> Result<(TestCase, Option<Regex>)> {
    let id = text_field(index, "id", record.id)?
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RegressionError::malformed(index, "missing identifier"))?;

    let prompt = text_field(index, "prompt", record.prompt)
        .map_err(|_| RegressionError::malformed(index, format!("case '{id}' has a non-string prompt")))?
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| RegressionError::malformed(index, format!("case '{id}' has no prompt")))?;

    let expected = record
        .expected
        .ok_or_else(|| {
            RegressionError::malformed(index, format!("case '{id}' has no expected outcome"))
        })?
        .into_outcome()
        .map_err(|reason| {
            RegressionError::malformed(index, format!("case '{id}' has an invalid expected outcome: {reason}"))
        })?;

    let blank = match &expected {
        ExpectedOutcome::Exact { value } | ExpectedOutcome::Contains { value } => {
            value.trim().is_empty()
        }
        ExpectedOutcome::Matches { pattern } => pattern.trim().is_empty(),
        ExpectedOutcome::Boolean { .. } => false,
    };
    if blank {
        return Err(RegressionError::malformed(
            index,
            format!("case '{id}' has an empty expected {}", expected.kind()),
        ));
    }

    let compiled = match &expected {
        ExpectedOutcome::Matches { pattern } => Some(
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    RegressionError::malformed(index, format!("case '{id}' has invalid pattern: {e}"))
                })?,
        ),
        _ => None,
    };

    let case = TestCase {
        id,
        prompt,
        expected,
        options: record.options,
        tags: record.tags,
    };
    Ok((case, compiled))
}

fn suite_digest(suite_id: &str, vocabulary: &BooleanVocabulary, cases: &[TestCase]) -> Result<String> {
    compute_digest(&serde_json::json!({
        "suite_id": suite_id,
        "vocabulary": vocabulary,
        "cases": cases,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExpectedSpec;
    use serde_json::json;

    fn record(id: &str, prompt: &str, expected: &str) -> CaseRecord {
        CaseRecord {
            id: Some(json!(id)),
            prompt: Some(json!(prompt)),
            expected: Some(ExpectedSpec::Literal(expected.to_string())),
            ..CaseRecord::default()
        }
    }

    #[test]
    fn test_load_preserves_order() {
        let def = SuiteDefinition::new("smoke")
            .add_record(record("c", "p3", "x"))
            .add_record(record("a", "p1", "y"))
            .add_record(record("b", "p2", "z"));
        let registry = CaseRegistry::load(def).unwrap();
        let ids: Vec<&str> = registry.cases().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let def = SuiteDefinition::new("smoke")
            .add_record(record("a", "p1", "x"))
            .add_record(record("a", "p2", "y"));
        match CaseRegistry::load(def) {
            Err(RegressionError::DuplicateIdentifier(id)) => assert_eq!(id, "a"),
            other => panic!("expected DuplicateIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_prompt_is_malformed() {
        let mut bad = record("a", "", "x");
        bad.prompt = None;
        let def = SuiteDefinition::new("smoke").add_record(bad);
        match CaseRegistry::load(def) {
            Err(RegressionError::MalformedCase { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("no prompt"));
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_prompt_is_malformed() {
        let def = SuiteDefinition::new("smoke").add_record(record("a", "   ", "x"));
        assert!(matches!(
            CaseRegistry::load(def),
            Err(RegressionError::MalformedCase { .. })
        ));
    }

    #[test]
    fn test_empty_expected_value_is_malformed() {
        let def = SuiteDefinition::new("smoke").add_record(record("a", "prompt", "  "));
        match CaseRegistry::load(def) {
            Err(RegressionError::MalformedCase { reason, .. }) => {
                assert!(reason.contains("empty expected exact"));
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_expected_is_malformed() {
        let mut bad = record("a", "prompt", "x");
        bad.expected = None;
        let def = SuiteDefinition::new("smoke")
            .add_record(record("ok", "prompt", "x"))
            .add_record(bad);
        match CaseRegistry::load(def) {
            Err(RegressionError::MalformedCase { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("expected outcome"));
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_expected_without_value_is_malformed() {
        let json = r#"{"suite_id":"s","cases":[
            {"id":"ok","prompt":"p","expected":"x"},
            {"id":"a","prompt":"p","expected":{"type":"contains"}}
        ]}"#;
        match CaseRegistry::from_json_str(json) {
            Err(RegressionError::MalformedCase { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("case 'a'"), "{reason}");
                assert!(reason.contains("missing field `value`"), "{reason}");
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_expected_type_is_malformed() {
        let json = r#"{"suite_id":"s","cases":[
            {"id":"a","prompt":"p","expected":{"type":"fuzzy","value":"x"}}
        ]}"#;
        match CaseRegistry::from_json_str(json) {
            Err(RegressionError::MalformedCase { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("unknown variant `fuzzy`"), "{reason}");
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_prompt_is_malformed() {
        let json = r#"{"suite_id":"s","cases":[{"id":"a","prompt":42,"expected":"x"}]}"#;
        match CaseRegistry::from_json_str(json) {
            Err(RegressionError::MalformedCase { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("non-string prompt"), "{reason}");
            }
            other => panic!("expected MalformedCase, got {:?}", other),
        }
    }

    #[test]
    fn test_matches_patterns_are_compiled_once_at_load() {
        let registry = CaseRegistry::from_cases(
            "s",
            vec![
                TestCase::new("a", "p", ExpectedOutcome::matches(r"^\d+$")),
                TestCase::new("b", "p", ExpectedOutcome::matches(r"^\d+$")),
                TestCase::new("c", "p", ExpectedOutcome::exact("x")),
            ],
        )
        .unwrap();
        let judge = registry.judge();
        assert_eq!(judge.compiled_patterns(), 1);
        assert_eq!(
            judge.judge("42", &registry.get("a").unwrap().expected),
            crate::domain::Verdict::Pass
        );
    }

    #[test]
    fn test_missing_identifier_is_malformed() {
        let mut bad = record("a", "prompt", "x");
        bad.id = None;
        let def = SuiteDefinition::new("smoke").add_record(bad);
        assert!(matches!(
            CaseRegistry::load(def),
            Err(RegressionError::MalformedCase { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_is_malformed() {
        let def = SuiteDefinition::new("smoke").add_case(TestCase::new(
            "a",
            "prompt",
            ExpectedOutcome::matches("(unclosed"),
        ));
        assert!(matches!(
            CaseRegistry::load(def),
            Err(RegressionError::MalformedCase { .. })
        ));
    }

    #[test]
    fn test_from_json_str_with_vocabulary() {
        let json = json!({
            "suite_id": "bool-suite",
            "vocabulary": {"yes": ["si"], "no": ["no"]},
            "cases": [
                {"id": "a", "prompt": "Is it?", "expected": {"type": "boolean", "expect": "yes"}}
            ]
        })
        .to_string();
        let registry = CaseRegistry::from_json_str(&json).unwrap();
        assert_eq!(registry.suite_id(), "bool-suite");
        assert_eq!(registry.vocabulary().yes, vec!["si"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = CaseRegistry::from_cases(
            "s",
            vec![TestCase::new("a", "p", ExpectedOutcome::exact("x"))],
        )
        .unwrap();
        let b = CaseRegistry::from_cases(
            "s",
            vec![TestCase::new("a", "p", ExpectedOutcome::exact("x"))],
        )
        .unwrap();
        let c = CaseRegistry::from_cases(
            "s",
            vec![TestCase::new("a", "p2", ExpectedOutcome::exact("x"))],
        )
        .unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_filter_by_tags_keeps_order() {
        let registry = CaseRegistry::from_cases(
            "s",
            vec![
                TestCase::new("a", "p", ExpectedOutcome::exact("x")).with_tag("critical"),
                TestCase::new("b", "p", ExpectedOutcome::exact("x")),
                TestCase::new("c", "p", ExpectedOutcome::exact("x")).with_tag("critical"),
            ],
        )
        .unwrap();

        let filtered = registry.filter_by_tags(&["critical".to_string()]).unwrap();
        let ids: Vec<&str> = filtered.cases().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(filtered.suite_id(), "s");
        assert_ne!(filtered.digest(), registry.digest());

        let all = registry.filter_by_tags(&[]).unwrap();
        assert_eq!(all.len(), 3);
    }
}
