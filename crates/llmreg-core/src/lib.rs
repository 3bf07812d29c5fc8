//! llmreg Core Library
//!
//! Runs a suite of prompts against a pluggable LLM provider, judges each
//! answer against its expected outcome, and compares the resulting run
//! report with a stored baseline to surface regressions.
//!
//! The two entry points are [`run`] and [`compare`]; [`evaluate_gate`] and
//! the [`reporting`] helpers turn their results into CI decisions and
//! artifacts.

pub mod compare;
pub mod domain;
pub mod executor;
pub mod gate;
pub mod judge;
pub mod metrics;
pub mod obs;
pub mod provider;
pub mod registry;
pub mod reporting;
pub mod telemetry;

pub use compare::{compare, Classification, DeltaCounts, DeltaEntry, RegressionDelta};

pub use domain::{
    BooleanAnswer, CaseRecord, ExpectedOutcome, ExpectedSpec, Outcome, ProviderIdentity,
    ProviderOptions, RegressionError, Result, RunReport, RunSummary, TestCase, Verdict,
};

pub use executor::{evaluate_with_retry, execute_case, run, RunPolicy, Settled};

pub use gate::{evaluate_gate, GateRule, GateRuleSet, GateThresholds, GateVerdict, Violation};

pub use judge::{judge, BooleanVocabulary, Judge};

pub use provider::{
    EchoProvider, OpenAiProvider, ProviderAdapter, ProviderConfig, ProviderConstructor,
    ProviderError, ProviderRegistry, ProviderResponse, ProviderResult, ResponseStatus,
    ScriptedProvider,
};

pub use registry::{CaseRegistry, SuiteDefinition};

pub use reporting::{
    read_report_json, render_delta_md, render_gate_md, render_summary_md, write_delta_json,
    write_delta_md, write_report_json,
};

pub use metrics::METRICS;
pub use obs::{
    emit_case_finished, emit_case_retry, emit_delta_computed, emit_gate_evaluated,
    emit_report_write_error, emit_run_finished, emit_run_started, emit_run_timeout, record_delta,
    RunSpan,
};
pub use telemetry::init_tracing;

/// llmreg version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
