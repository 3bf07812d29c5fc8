//! The sample suite and configs under `demos/` must load and pass.

use std::path::{Path, PathBuf};

use llmreg_core::{
    evaluate_gate, run, CaseRegistry, GateRuleSet, ProviderConfig, ProviderRegistry, RunPolicy,
    Verdict,
};

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn read<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let content = std::fs::read_to_string(demos_dir().join(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn demo_suite_loads_in_file_order() {
    let registry = CaseRegistry::from_path(&demos_dir().join("suite.json")).unwrap();
    let ids: Vec<&str> = registry.cases().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["capital-france", "sky-blue", "fire-cold", "rivers", "year-format"]
    );
    assert_eq!(registry.name(), Some("Geography smoke suite"));
    assert_eq!(registry.digest().len(), 64);
}

#[test]
fn demo_openai_config_builds_without_network() {
    let config: ProviderConfig = read("provider.openai.json");
    let adapter = ProviderRegistry::with_builtins().build(&config).unwrap();
    assert_eq!(adapter.identity().to_string(), "openai/gpt-4o-mini");
}

#[tokio::test]
async fn demo_scripted_run_passes_demo_gate() {
    let registry = CaseRegistry::from_path(&demos_dir().join("suite.json")).unwrap();
    let config: ProviderConfig = read("provider.scripted.json");
    let adapter = ProviderRegistry::with_builtins().build(&config).unwrap();
    let policy: RunPolicy = read("policy.json");
    let gate: GateRuleSet = read("gate.json");

    let report = run(&registry, adapter, &policy).await.unwrap();

    for outcome in report.outcomes() {
        assert_eq!(outcome.verdict, Verdict::Pass, "{} did not pass", outcome.case_id);
    }
    assert!(evaluate_gate(&gate, &report, None).passed());
}
