//! Regression comparator: classifies every case between a baseline run and
//! a candidate run.
//!
//! Pure and order-stable. Entries follow the candidate's order, followed by
//! cases only present in the baseline (in baseline order). Every identifier
//! in either report appears exactly once.
//!
//! Callers that want the `delta.computed` event and the regression counter
//! pass the result to [`crate::obs::record_delta`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RunReport, Verdict};

/// How a case moved between baseline and candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    UnchangedPass,
    UnchangedFail,
    /// pass → not pass
    Regressed,
    /// not pass → pass
    Fixed,
    /// Only in the candidate.
    New,
    /// Only in the baseline.
    Removed,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnchangedPass => "unchanged-pass",
            Self::UnchangedFail => "unchanged-fail",
            Self::Regressed => "regressed",
            Self::Fixed => "fixed",
            Self::New => "new",
            Self::Removed => "removed",
        }
    }

    /// Classify a case present in both runs. Fail, ambiguous and error all
    /// count as "not pass" here; the entry keeps the exact verdicts.
    fn between(baseline: Verdict, candidate: Verdict) -> Self {
        match (baseline.is_pass(), candidate.is_pass()) {
            (true, true) => Self::UnchangedPass,
            (true, false) => Self::Regressed,
            (false, true) => Self::Fixed,
            (false, false) => Self::UnchangedFail,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One case in a delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaEntry {
    pub case_id: String,
    pub classification: Classification,
    pub baseline: Option<Verdict>,
    pub candidate: Option<Verdict>,
}

/// Per-classification counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaCounts {
    pub unchanged_pass: usize,
    pub unchanged_fail: usize,
    pub regressed: usize,
    pub fixed: usize,
    pub new: usize,
    pub removed: usize,
}

/// Classified difference between two runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionDelta {
    pub baseline_run_id: Uuid,
    pub candidate_run_id: Uuid,
    pub entries: Vec<DeltaEntry>,
}

impl RegressionDelta {
    pub fn entry(&self, case_id: &str) -> Option<&DeltaEntry> {
        self.entries.iter().find(|e| e.case_id == case_id)
    }

    pub fn classification(&self, case_id: &str) -> Option<Classification> {
        self.entry(case_id).map(|e| e.classification)
    }

    /// Entries with the given classification, in delta order.
    pub fn with_classification(&self, classification: Classification) -> Vec<&DeltaEntry> {
        self.entries
            .iter()
            .filter(|e| e.classification == classification)
            .collect()
    }

    pub fn counts(&self) -> DeltaCounts {
        let mut counts = DeltaCounts::default();
        for entry in &self.entries {
            match entry.classification {
                Classification::UnchangedPass => counts.unchanged_pass += 1,
                Classification::UnchangedFail => counts.unchanged_fail += 1,
                Classification::Regressed => counts.regressed += 1,
                Classification::Fixed => counts.fixed += 1,
                Classification::New => counts.new += 1,
                Classification::Removed => counts.removed += 1,
            }
        }
        counts
    }

    pub fn has_regressions(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.classification == Classification::Regressed)
    }
}

/// Ordered, first-occurrence-wins view of a report's verdicts.
fn verdicts(report: &RunReport) -> (Vec<&str>, HashMap<&str, Verdict>) {
    let mut order = Vec::with_capacity(report.outcomes().len());
    let mut map = HashMap::with_capacity(report.outcomes().len());
    for outcome in report.outcomes() {
        let id = outcome.case_id.as_str();
        if !map.contains_key(id) {
            map.insert(id, outcome.verdict);
            order.push(id);
        }
    }
    (order, map)
}

/// Diff `candidate` against `baseline`.
pub fn compare(baseline: &RunReport, candidate: &RunReport) -> RegressionDelta {
    let (baseline_order, baseline_map) = verdicts(baseline);
    let (candidate_order, candidate_map) = verdicts(candidate);

    let mut entries = Vec::with_capacity(baseline_order.len().max(candidate_order.len()));
    let mut seen: HashSet<&str> = HashSet::new();

    for id in &candidate_order {
        let candidate_verdict = candidate_map[id];
        let baseline_verdict = baseline_map.get(id).copied();
        let classification = match baseline_verdict {
            Some(b) => Classification::between(b, candidate_verdict),
            None => Classification::New,
        };
        seen.insert(*id);
        entries.push(DeltaEntry {
            case_id: id.to_string(),
            classification,
            baseline: baseline_verdict,
            candidate: Some(candidate_verdict),
        });
    }

    for id in &baseline_order {
        if seen.contains(id) {
            continue;
        }
        entries.push(DeltaEntry {
            case_id: id.to_string(),
            classification: Classification::Removed,
            baseline: Some(baseline_map[id]),
            candidate: None,
        });
    }

    RegressionDelta {
        baseline_run_id: baseline.run_id(),
        candidate_run_id: candidate.run_id(),
        entries,
    }
}
