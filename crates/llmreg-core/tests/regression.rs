//! End-to-end regression detection: run a suite twice against scripted
//! providers and compare the reports.

use std::sync::Arc;

use llmreg_core::{
    compare, run, CaseRegistry, Classification, ExpectedOutcome, RunPolicy, RunReport,
    ScriptedProvider, TestCase, Verdict,
};

fn three_case_suite() -> CaseRegistry {
    CaseRegistry::from_cases(
        "three-case",
        vec![
            TestCase::new("A", "Is the sky blue?", ExpectedOutcome::exact("yes")),
            TestCase::new("B", "Is fire cold?", ExpectedOutcome::exact("no")),
            TestCase::new("C", "What happened?", ExpectedOutcome::contains("error")),
        ],
    )
    .unwrap()
}

async fn run_with(registry: &CaseRegistry, a: &str, b: &str, c: &str) -> RunReport {
    let adapter = ScriptedProvider::new()
        .respond("Is the sky blue?", a)
        .respond("Is fire cold?", b)
        .respond("What happened?", c);
    run(registry, Arc::new(adapter), &RunPolicy::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn three_case_scenario_flags_exactly_one_regression() {
    let registry = three_case_suite();
    let baseline = run_with(&registry, "Yes", "No", "fatal error occurred").await;
    let candidate = run_with(&registry, "No", "No", "fatal error occurred").await;

    let verdicts = |r: &RunReport| -> Vec<Verdict> { r.outcomes().iter().map(|o| o.verdict).collect() };
    assert_eq!(verdicts(&baseline), vec![Verdict::Pass; 3]);
    assert_eq!(
        verdicts(&candidate),
        vec![Verdict::Fail, Verdict::Pass, Verdict::Pass]
    );

    let delta = compare(&baseline, &candidate);
    assert_eq!(delta.classification("A"), Some(Classification::Regressed));
    assert_eq!(delta.classification("B"), Some(Classification::UnchangedPass));
    assert_eq!(delta.classification("C"), Some(Classification::UnchangedPass));
    assert_eq!(delta.entries.len(), 3);
    assert_eq!(delta.baseline_run_id, baseline.run_id());
    assert_eq!(delta.candidate_run_id, candidate.run_id());
}

#[tokio::test]
async fn comparing_a_report_with_itself_changes_nothing() {
    let registry = three_case_suite();
    let report = run_with(&registry, "Yes", "maybe", "all good").await;

    let delta = compare(&report, &report);

    assert_eq!(delta.entries.len(), report.outcomes().len());
    for entry in &delta.entries {
        assert!(
            matches!(
                entry.classification,
                Classification::UnchangedPass | Classification::UnchangedFail
            ),
            "{} classified {:?}",
            entry.case_id,
            entry.classification
        );
    }
    assert!(!delta.has_regressions());
}

#[tokio::test]
async fn every_identifier_appears_exactly_once() {
    let old_suite = CaseRegistry::from_cases(
        "suite",
        vec![
            TestCase::new("kept", "k", ExpectedOutcome::exact("yes")),
            TestCase::new("dropped", "d", ExpectedOutcome::exact("yes")),
        ],
    )
    .unwrap();
    let new_suite = CaseRegistry::from_cases(
        "suite",
        vec![
            TestCase::new("added", "a", ExpectedOutcome::exact("yes")),
            TestCase::new("kept", "k", ExpectedOutcome::exact("yes")),
        ],
    )
    .unwrap();
    let adapter = || {
        Arc::new(
            ScriptedProvider::new()
                .respond("k", "yes")
                .respond("d", "yes")
                .respond("a", "no"),
        )
    };

    let baseline = run(&old_suite, adapter(), &RunPolicy::default()).await.unwrap();
    let candidate = run(&new_suite, adapter(), &RunPolicy::default()).await.unwrap();
    let delta = compare(&baseline, &candidate);

    let mut ids: Vec<&str> = delta.entries.iter().map(|e| e.case_id.as_str()).collect();
    assert_eq!(ids, vec!["added", "kept", "dropped"]);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    assert_eq!(delta.classification("added"), Some(Classification::New));
    assert_eq!(delta.classification("kept"), Some(Classification::UnchangedPass));
    assert_eq!(delta.classification("dropped"), Some(Classification::Removed));

    let counts = delta.counts();
    assert_eq!(counts.new, 1);
    assert_eq!(counts.removed, 1);
    assert_eq!(counts.unchanged_pass, 1);
}

#[tokio::test]
async fn provider_error_in_candidate_counts_as_regression() {
    let registry = three_case_suite();
    let baseline = run_with(&registry, "Yes", "No", "error").await;

    // No scripted answer for C: permanent provider error.
    let adapter = ScriptedProvider::new()
        .respond("Is the sky blue?", "Yes")
        .respond("Is fire cold?", "No");
    let candidate = run(&registry, Arc::new(adapter), &RunPolicy::default())
        .await
        .unwrap();

    let delta = compare(&baseline, &candidate);
    let entry = delta.entry("C").unwrap();
    assert_eq!(entry.classification, Classification::Regressed);
    assert_eq!(entry.candidate, Some(Verdict::Error));
    assert_eq!(delta.counts().regressed, 1);
}
