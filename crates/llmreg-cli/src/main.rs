//! llmreg - LLM regression tester CLI
//!
//! ## Commands
//!
//! - `run`: Execute a suite against a provider, optionally gating on a baseline
//! - `compare`: Diff two stored run reports
//! - `validate`: Check a suite file without contacting any provider
//! - `providers`: List the provider kinds this build knows about

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use llmreg_core::{
    compare, emit_report_write_error, evaluate_gate, read_report_json, record_delta, render_delta_md,
    render_gate_md, render_summary_md, write_delta_md, write_report_json, CaseRegistry,
    GateRuleSet, ProviderConfig, ProviderRegistry, RunPolicy, RunSpan, METRICS,
};

/// Environment variable selecting the log format (`json` or `text`).
const LOG_FORMAT_ENV: &str = "LLMREG_LOG_FORMAT";

#[derive(Parser)]
#[command(name = "llmreg")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Regression testing for LLM provider outputs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines (also LLMREG_LOG_FORMAT=json)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a suite against a provider and judge every answer
    Run(RunArgs),

    /// Compare a candidate report against a baseline report
    Compare {
        /// Baseline run report (JSON)
        baseline: PathBuf,

        /// Candidate run report (JSON)
        candidate: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = CompareFormat::Markdown)]
        format: CompareFormat,

        /// Exit non-zero when any case regressed
        #[arg(long)]
        fail_on_regression: bool,
    },

    /// Validate a suite file
    Validate {
        /// Suite definition (JSON)
        suite: PathBuf,
    },

    /// List registered provider kinds
    Providers,
}

#[derive(Args)]
struct RunArgs {
    /// Suite definition (JSON)
    #[arg(short, long)]
    suite: PathBuf,

    /// Provider configuration (JSON: {"kind": ..., "settings": {...}})
    #[arg(short, long)]
    provider: PathBuf,

    /// Run policy (JSON); flags below override individual fields
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Gate rule set (JSON); defaults to the standard rules
    #[arg(long)]
    gate: Option<PathBuf>,

    /// API key injected into the provider settings when they carry none
    #[arg(long, env = "LLMREG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Retries after the first attempt for transient failures
    #[arg(long)]
    max_retries: Option<u32>,

    /// Maximum cases in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-attempt timeout in milliseconds (0 disables)
    #[arg(long)]
    attempt_timeout_ms: Option<u64>,

    /// Deadline for the whole run in milliseconds
    #[arg(long)]
    run_timeout_ms: Option<u64>,

    /// Only run cases carrying one of these tags (repeatable)
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Write the run report here (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stored baseline report to compare against
    #[arg(short, long)]
    baseline: Option<PathBuf>,

    /// Write the regression delta Markdown here (requires --baseline)
    #[arg(long, requires = "baseline")]
    delta_md: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CompareFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let json_logs = cli.json
        || std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    llmreg_core::init_tracing(json_logs, level);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Compare {
            baseline,
            candidate,
            format,
            fail_on_regression,
        } => cmd_compare(&baseline, &candidate, format, fail_on_regression),
        Commands::Validate { suite } => cmd_validate(&suite),
        Commands::Providers => cmd_providers(),
    };

    METRICS.flush();
    result
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let registry = CaseRegistry::from_path(&args.suite)
        .with_context(|| format!("Failed to load suite: {:?}", args.suite))?
        .filter_by_tags(&args.tags)
        .context("Failed to filter suite by tags")?;

    let policy = load_policy(args)?;
    let provider_config = load_provider_config(&args.provider, args.api_key.as_deref())?;
    let adapter = ProviderRegistry::with_builtins()
        .build(&provider_config)
        .with_context(|| format!("Failed to build provider '{}'", provider_config.kind))?;
    let rule_set: GateRuleSet = match &args.gate {
        Some(path) => read_json_file(path)?,
        None => GateRuleSet::standard(),
    };

    info!(
        suite_id = %registry.suite_id(),
        cases = registry.len(),
        provider = %provider_config.kind,
        "starting run"
    );
    let report = llmreg_core::run(&registry, adapter, &policy)
        .await
        .context("Run failed")?;

    if let Some(path) = &args.output {
        if let Err(e) = write_report_json(path, &report) {
            emit_report_write_error(&report.run_id().to_string(), &e);
            return Err(e);
        }
        println!("Report written to {:?}", path);
    }

    println!("{}", render_summary_md(&report));

    let delta = match &args.baseline {
        Some(path) => {
            let baseline = read_report_json(path)?;
            if baseline.suite_digest() != report.suite_digest() {
                tracing::warn!(
                    baseline = %baseline.suite_digest(),
                    candidate = %report.suite_digest(),
                    "suite changed since baseline"
                );
            }
            let delta = compare(&baseline, &report);
            record_delta(&delta);
            println!("{}", render_delta_md(&delta));
            if let Some(md_path) = &args.delta_md {
                write_delta_md(md_path, &delta)?;
            }
            Some(delta)
        }
        None => None,
    };

    let verdict = evaluate_gate(&rule_set, &report, delta.as_ref());
    println!("{}", render_gate_md(&verdict));

    if verdict.passed() {
        Ok(())
    } else {
        anyhow::bail!("Regression gate failed")
    }
}

fn cmd_compare(
    baseline: &Path,
    candidate: &Path,
    format: CompareFormat,
    fail_on_regression: bool,
) -> Result<()> {
    let baseline = read_report_json(baseline)?;
    let candidate = read_report_json(candidate)?;
    let _span = RunSpan::enter(&candidate.run_id().to_string());

    let delta = compare(&baseline, &candidate);
    record_delta(&delta);
    match format {
        CompareFormat::Json => println!("{}", serde_json::to_string_pretty(&delta)?),
        CompareFormat::Markdown => println!("{}", render_delta_md(&delta)),
    }

    if fail_on_regression && delta.has_regressions() {
        anyhow::bail!("{} case(s) regressed", delta.counts().regressed);
    }
    Ok(())
}

fn cmd_validate(suite: &Path) -> Result<()> {
    let registry = CaseRegistry::from_path(suite)
        .with_context(|| format!("Invalid suite: {:?}", suite))?;
    println!(
        "✓ {} ({} cases, digest {})",
        registry.suite_id(),
        registry.len(),
        registry.digest()
    );
    Ok(())
}

fn cmd_providers() -> Result<()> {
    for kind in ProviderRegistry::with_builtins().kinds() {
        println!("{}", kind);
    }
    Ok(())
}

/// Policy file (or defaults) with command-line overrides applied.
fn load_policy(args: &RunArgs) -> Result<RunPolicy> {
    let mut policy: RunPolicy = match &args.policy {
        Some(path) => read_json_file(path)?,
        None => RunPolicy::default(),
    };
    if let Some(n) = args.max_retries {
        policy.max_retries = n;
    }
    if let Some(n) = args.concurrency {
        policy.max_concurrency = n;
    }
    if let Some(ms) = args.attempt_timeout_ms {
        policy.attempt_timeout_ms = ms;
    }
    if let Some(ms) = args.run_timeout_ms {
        policy.run_timeout_ms = Some(ms);
    }
    policy.validate().context("Invalid run policy")?;
    Ok(policy)
}

/// Provider configuration, with `api_key` filled in from the CLI when the
/// file does not set one.
fn load_provider_config(path: &Path, api_key: Option<&str>) -> Result<ProviderConfig> {
    let mut config: ProviderConfig = read_json_file(path)?;
    if let Some(key) = api_key {
        if config.setting_str("api_key").is_none() {
            config = config.with_setting("api_key", Value::String(key.to_string()));
        }
    }
    Ok(config)
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}
