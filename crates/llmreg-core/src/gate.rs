//! Merge gate rules engine.
//!
//! Evaluates a [`RunReport`] (and, when a baseline exists, its
//! [`RegressionDelta`]) against a [`GateRuleSet`] to produce a
//! [`GateVerdict`]: the pass/fail decision that a CI job turns into an exit
//! code. Supports pass-rate thresholds, regression limits, fail-fast and
//! tag-based required-pass rules.

use serde::{Deserialize, Serialize};

use crate::compare::{Classification, RegressionDelta};
use crate::domain::{RunReport, Verdict};
use crate::obs::emit_gate_evaluated;

/// Numeric limits referenced by the gate rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum pass rate (0.0–1.0).
    pub min_pass_rate: f32,
    /// Maximum number of cases allowed to regress against the baseline.
    pub max_regressions: usize,
    /// Stop at the first violation.
    pub fail_fast: bool,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_pass_rate: 0.8,
            max_regressions: 0,
            fail_fast: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Gate rules
// ---------------------------------------------------------------------------

/// A single gate rule that can block a merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateRule {
    /// Pass rate must meet or exceed `GateThresholds::min_pass_rate`.
    MinPassRate,
    /// Regressed cases must not exceed `GateThresholds::max_regressions`.
    MaxRegressions,
    /// All cases with the given tag must pass.
    RequireTag { tag: String },
    /// No case may end ambiguous.
    NoAmbiguous,
}

/// A set of gate rules plus the thresholds they reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateRuleSet {
    #[serde(default)]
    pub thresholds: GateThresholds,
    pub rules: Vec<GateRule>,
}

impl Default for GateRuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl GateRuleSet {
    /// Default thresholds with the standard rules
    /// (`MinPassRate` + `MaxRegressions`).
    pub fn standard() -> Self {
        Self {
            thresholds: GateThresholds::default(),
            rules: vec![GateRule::MinPassRate, GateRule::MaxRegressions],
        }
    }

    pub fn with_rule(mut self, rule: GateRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_thresholds(mut self, thresholds: GateThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// A single rule violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub rule: GateRule,
    /// Human-readable explanation.
    pub reason: String,
}

/// The outcome of evaluating a gate rule set against a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    /// Violations found (empty when passed).
    pub violations: Vec<Violation>,
}

impl GateVerdict {
    /// Whether the gate passed (i.e., there are no violations).
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate `report` against `rule_set`.
///
/// `delta` is the comparison with a baseline run; without one,
/// `MaxRegressions` has nothing to check and is skipped. When
/// `thresholds.fail_fast` is set, evaluation stops at the first violation.
pub fn evaluate_gate(
    rule_set: &GateRuleSet,
    report: &RunReport,
    delta: Option<&RegressionDelta>,
) -> GateVerdict {
    let mut violations = Vec::new();

    for rule in &rule_set.rules {
        if let Some(v) = check_rule(rule, &rule_set.thresholds, report, delta) {
            violations.push(v);
            if rule_set.thresholds.fail_fast {
                break;
            }
        }
    }

    let verdict = GateVerdict { violations };
    emit_gate_evaluated(
        &report.run_id().to_string(),
        report.summary().pass_rate,
        verdict.passed(),
        verdict.violations.len(),
    );
    verdict
}

fn check_rule(
    rule: &GateRule,
    thresholds: &GateThresholds,
    report: &RunReport,
    delta: Option<&RegressionDelta>,
) -> Option<Violation> {
    let violation = |reason: String| {
        Some(Violation {
            rule: rule.clone(),
            reason,
        })
    };

    match rule {
        GateRule::MinPassRate => {
            let pass_rate = report.summary().pass_rate;
            if pass_rate < thresholds.min_pass_rate {
                violation(format!(
                    "pass rate {:.2}% < required {:.2}%",
                    pass_rate * 100.0,
                    thresholds.min_pass_rate * 100.0,
                ))
            } else {
                None
            }
        }
        GateRule::MaxRegressions => {
            // No baseline → no regression to check
            let delta = delta?;
            let regressed: Vec<&str> = delta
                .with_classification(Classification::Regressed)
                .into_iter()
                .map(|e| e.case_id.as_str())
                .collect();
            if regressed.len() > thresholds.max_regressions {
                violation(format!(
                    "{} regressed cases > allowed {}: [{}]",
                    regressed.len(),
                    thresholds.max_regressions,
                    regressed.join(", "),
                ))
            } else {
                None
            }
        }
        GateRule::RequireTag { tag } => {
            let tagged: Vec<_> = report
                .outcomes()
                .iter()
                .filter(|o| o.tags.contains(tag))
                .collect();
            let failed: Vec<&str> = tagged
                .iter()
                .filter(|o| !o.verdict.is_pass())
                .map(|o| o.case_id.as_str())
                .collect();

            if failed.is_empty() {
                None
            } else {
                violation(format!(
                    "{} of {} cases tagged '{}' did not pass: [{}]",
                    failed.len(),
                    tagged.len(),
                    tag,
                    failed.join(", "),
                ))
            }
        }
        GateRule::NoAmbiguous => {
            let ambiguous: Vec<&str> = report
                .outcomes()
                .iter()
                .filter(|o| o.verdict == Verdict::Ambiguous)
                .map(|o| o.case_id.as_str())
                .collect();
            if ambiguous.is_empty() {
                None
            } else {
                violation(format!(
                    "{} ambiguous cases: [{}]",
                    ambiguous.len(),
                    ambiguous.join(", "),
                ))
            }
        }
    }
}
