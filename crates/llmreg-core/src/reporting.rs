//! Report persistence and Markdown rendering for CI output.

use anyhow::{Context, Result};
use std::path::Path;

use crate::compare::{Classification, RegressionDelta};
use crate::domain::{RunReport, Verdict};
use crate::gate::GateVerdict;

/// Write a run report as pretty JSON.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize run report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Load a previously written run report, e.g. a stored baseline.
pub fn read_report_json(path: &Path) -> Result<RunReport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("parse run report {:?}", path))?;
    Ok(report)
}

/// Write a regression delta as pretty JSON.
pub fn write_delta_json(path: &Path, delta: &RegressionDelta) -> Result<()> {
    let content = serde_json::to_string_pretty(delta).context("serialize regression delta")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn verdict_label(verdict: Option<Verdict>) -> &'static str {
    verdict.map(Verdict::as_str).unwrap_or("absent")
}

/// Render a run summary: header, counts table, then every case that did not pass.
pub fn render_summary_md(report: &RunReport) -> String {
    let summary = report.summary();
    let mut out = String::new();
    out.push_str("# Run Summary\n\n");
    out.push_str(&format!(
        "- suite: `{}`\n- run: `{}`\n- provider: `{}`\n- duration: {}ms\n\n",
        report.suite_id(),
        report.run_id(),
        report.provider(),
        report.duration_ms(),
    ));
    out.push_str("| total | passed | failed | ambiguous | errored | pass rate |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} | {} | {:.2}% |\n",
        summary.total,
        summary.passed,
        summary.failed,
        summary.ambiguous,
        summary.errored,
        summary.pass_rate * 100.0,
    ));

    let not_passing: Vec<_> = report
        .outcomes()
        .iter()
        .filter(|o| !o.verdict.is_pass())
        .collect();
    if !not_passing.is_empty() {
        out.push_str("\n## Not Passing\n");
        for outcome in not_passing {
            match &outcome.error {
                Some(error) => out.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    outcome.case_id, outcome.verdict, error
                )),
                None => out.push_str(&format!("- `{}` ({})\n", outcome.case_id, outcome.verdict)),
            }
        }
    }
    out
}

/// Render a regression delta: counts, then one section per changed classification.
pub fn render_delta_md(delta: &RegressionDelta) -> String {
    let counts = delta.counts();
    let mut out = String::new();
    out.push_str("# Regression Delta\n\n");
    out.push_str(&format!(
        "- baseline: `{}`\n- candidate: `{}`\n\n",
        delta.baseline_run_id, delta.candidate_run_id
    ));
    out.push_str(&format!(
        "- regressed: {}\n- fixed: {}\n- new: {}\n- removed: {}\n- unchanged pass: {}\n- unchanged fail: {}\n",
        counts.regressed,
        counts.fixed,
        counts.new,
        counts.removed,
        counts.unchanged_pass,
        counts.unchanged_fail,
    ));

    let sections = [
        ("Regressed", Classification::Regressed),
        ("Fixed", Classification::Fixed),
        ("New", Classification::New),
        ("Removed", Classification::Removed),
    ];
    for (title, classification) in sections {
        let entries = delta.with_classification(classification);
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n", title));
        for entry in entries {
            out.push_str(&format!(
                "- `{}`: {} → {}\n",
                entry.case_id,
                verdict_label(entry.baseline),
                verdict_label(entry.candidate),
            ));
        }
    }
    out
}

/// Render a gate verdict as a short Markdown block.
pub fn render_gate_md(verdict: &GateVerdict) -> String {
    let mut out = String::from("## Gate\n");
    if verdict.passed() {
        out.push_str("- passed\n");
        return out;
    }
    for v in &verdict.violations {
        out.push_str(&format!("- FAILED: {}\n", v.reason));
    }
    out
}

/// Write the delta Markdown.
pub fn write_delta_md(path: &Path, delta: &RegressionDelta) -> Result<()> {
    let md = render_delta_md(delta);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
