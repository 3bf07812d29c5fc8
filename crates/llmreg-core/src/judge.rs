//! Deterministic response judging.
//!
//! The judge never calls a model: it normalizes the raw response and checks
//! it against the case's [`ExpectedOutcome`]. Boolean-classification answers
//! outside the configured vocabulary are [`Verdict::Ambiguous`], so a
//! malformed reply is never silently counted as a pass or a fail.

use std::collections::HashMap;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::{BooleanAnswer, ExpectedOutcome, Verdict};

/// Tokens recognized as yes/no answers. Matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BooleanVocabulary {
    pub yes: Vec<String>,
    pub no: Vec<String>,
}

impl Default for BooleanVocabulary {
    fn default() -> Self {
        let words = |ws: &[&str]| -> Vec<String> { ws.iter().map(|w| w.to_string()).collect() };
        Self {
            yes: words(&["yes", "y", "affirmative", "true", "correct"]),
            no: words(&["no", "n", "negative", "false", "incorrect"]),
        }
    }
}

impl BooleanVocabulary {
    /// Map a response to a canonical answer, or `None` when it is outside
    /// the vocabulary.
    pub fn classify(&self, response: &str) -> Option<BooleanAnswer> {
        let token = normalize_token(response);
        if token.is_empty() {
            return None;
        }
        let hit = |words: &[String]| words.iter().any(|w| w.trim().to_lowercase() == token);
        match (hit(&self.yes), hit(&self.no)) {
            (true, false) => Some(BooleanAnswer::Yes),
            (false, true) => Some(BooleanAnswer::No),
            // A token listed on both sides cannot be classified.
            _ => None,
        }
    }
}

/// Lowercase, trim, strip wrapping quotes and trailing sentence punctuation.
fn normalize_token(response: &str) -> String {
    let trimmed = response
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
        .trim();
    trimmed.to_lowercase()
}

/// Response judge configured with a boolean vocabulary and, when built by
/// a registry, the suite's precompiled `matches` patterns.
#[derive(Debug, Clone, Default)]
pub struct Judge {
    vocabulary: BooleanVocabulary,
    patterns: Arc<HashMap<String, Regex>>,
}

impl Judge {
    pub fn new(vocabulary: BooleanVocabulary) -> Self {
        Self {
            vocabulary,
            patterns: Arc::default(),
        }
    }

    pub fn with_patterns(mut self, patterns: Arc<HashMap<String, Regex>>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Number of precompiled patterns available to this judge.
    pub fn compiled_patterns(&self) -> usize {
        self.patterns.len()
    }

    fn is_match(&self, pattern: &str, response: &str) -> bool {
        match self.patterns.get(pattern) {
            Some(re) => re.is_match(response),
            // Outcomes built outside a registry have not been compiled yet.
            None => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(response))
                .unwrap_or(false),
        }
    }

    pub fn vocabulary(&self) -> &BooleanVocabulary {
        &self.vocabulary
    }

    /// Judge `response` against `expected`. Never returns [`Verdict::Error`].
    pub fn judge(&self, response: &str, expected: &ExpectedOutcome) -> Verdict {
        let response = response.trim();

        let passed = match expected {
            ExpectedOutcome::Boolean { expect } => {
                return match self.vocabulary.classify(response) {
                    Some(answer) if answer == *expect => Verdict::Pass,
                    Some(_) => Verdict::Fail,
                    None => Verdict::Ambiguous,
                };
            }
            _ if response.is_empty() => false,
            ExpectedOutcome::Exact { value } => {
                response.to_lowercase() == value.trim().to_lowercase()
            }
            ExpectedOutcome::Contains { value } => response
                .to_lowercase()
                .contains(&value.trim().to_lowercase()),
            ExpectedOutcome::Matches { pattern } => self.is_match(pattern, response),
        };

        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Judge with the default vocabulary.
pub fn judge(response: &str, expected: &ExpectedOutcome) -> Verdict {
    Judge::default().judge(response, expected)
}
