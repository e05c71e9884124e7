// crates/tracker-contract-cli/src/main.rs
// ============================================================================
// Module: Tracker Contract CLI Entry Point
// Description: Command dispatcher for running the issue contract catalog.
// Purpose: Run contract scenarios against a live tracker and report results.
// Dependencies: clap, thiserror, tracing, tracing-subscriber, tracker-contract-core
// ============================================================================

//! ## Overview
//! `tracker-contract run` executes the issue catalog against the configured
//! service and exits with the aggregate result: `0` when every scenario
//! passed, `1` on any failed or broken scenario, `2` when configuration or
//! report setup fails. `tracker-contract list` prints the catalog.
//! Security posture: the auth token is read from config or environment and
//! never echoed.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracker_contract_core::CleanupPolicy;
use tracker_contract_core::DirectorySink;
use tracker_contract_core::HarnessConfig;
use tracker_contract_core::MemorySink;
use tracker_contract_core::ReportSink;
use tracker_contract_core::RunOptions;
use tracker_contract_core::ScenarioRunner;
use tracker_contract_core::ScenarioTemplate;
use tracker_contract_core::issue_catalog;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "tracker_contract=info";
/// Exit code for configuration and setup errors.
const EXIT_CONFIG: u8 = 2;
/// Exit code for failed or broken scenarios.
const EXIT_FAILURE: u8 = 1;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tracker-contract", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the issue contract catalog against the configured service.
    Run(RunCommand),
    /// List catalog scenarios.
    List(ListCommand),
}

/// Arguments for `run`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
struct RunCommand {
    /// TOML configuration file (overrides `TRACKER_CONTRACT_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Only run scenarios whose id contains this substring.
    #[arg(long, value_name = "SUBSTR")]
    filter: Option<String>,
    /// Keep issues created by scenarios instead of deleting them.
    #[arg(long)]
    keep_fixtures: bool,
    /// Report root directory (overrides `[report].root`).
    #[arg(long, value_name = "DIR", conflicts_with = "no_report")]
    report_dir: Option<PathBuf>,
    /// Do not write reports to disk.
    #[arg(long)]
    no_report: bool,
    /// Seed for generated issue text.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

/// Arguments for `list`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
struct ListCommand {
    /// Only list scenarios whose id contains this substring.
    #[arg(long, value_name = "SUBSTR")]
    filter: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying its exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit code.
    code: u8,
}

impl CliError {
    /// Builds a configuration error (exit code 2).
    fn config(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: EXIT_CONFIG,
        }
    }

    /// Builds a runtime error (exit code 1).
    fn runtime(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: EXIT_FAILURE,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the selected subcommand.
fn dispatch(command: Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Run(command) => command_run(&command),
        Commands::List(command) => command_list(&command),
    }
}

/// Installs the stderr tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let mut config = HarnessConfig::load(command.config.as_deref())
        .map_err(|err| CliError::config(format!("configuration error: {err}")))?;
    apply_run_flags(&mut config, command);
    tracing::debug!(
        base_url = %config.service.base_url,
        report = config.report.enabled,
        "configuration loaded"
    );

    let (sink, run_root) = build_sink(&config)?;
    let runner = ScenarioRunner::new(config, sink)
        .map_err(|err| CliError::config(format!("session setup failed: {err}")))?;
    let summary = runner.run_all(
        &issue_catalog(),
        &RunOptions {
            filter: command.filter.clone(),
            seed: command.seed,
        },
    );

    let mut out = summary.to_markdown();
    if let Some(root) = run_root {
        out.push_str(&format!("\nReport: {}\n", root.display()));
    }
    write_stdout(&out)?;
    Ok(ExitCode::from(summary.exit_code()))
}

/// Applies command-line flags on top of the loaded configuration.
fn apply_run_flags(config: &mut HarnessConfig, command: &RunCommand) {
    if command.keep_fixtures {
        config.fixtures.cleanup = CleanupPolicy::Keep;
    }
    if let Some(dir) = &command.report_dir {
        config.report.root.clone_from(dir);
        config.report.enabled = true;
    }
    if command.no_report {
        config.report.enabled = false;
    }
}

/// Selects the report sink; returns the run directory when writing to disk.
fn build_sink(config: &HarnessConfig) -> CliResult<(Arc<dyn ReportSink>, Option<PathBuf>)> {
    if !config.report.enabled {
        return Ok((Arc::new(MemorySink::new()), None));
    }
    let sink = DirectorySink::new(&config.report.root).map_err(|err| {
        CliError::config(format!(
            "cannot create report directory under {}: {err}",
            config.report.root.display()
        ))
    })?;
    let run_root = sink.run_root().to_path_buf();
    Ok((Arc::new(sink), Some(run_root)))
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(command: &ListCommand) -> CliResult<ExitCode> {
    write_stdout(&render_list(&issue_catalog(), command.filter.as_deref()))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders one tab-separated line per scenario: id, severity, story, title.
fn render_list(catalog: &[ScenarioTemplate], filter: Option<&str>) -> String {
    let mut out = String::new();
    for template in catalog {
        let meta = &template.meta;
        if filter.is_some_and(|filter| !meta.id.contains(filter)) {
            continue;
        }
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            meta.id,
            meta.severity.as_str(),
            meta.story,
            meta.title
        ));
    }
    out
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes text to stdout.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| CliError::runtime(format!("failed to write stdout: {err}")))
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    tracing::debug!(code = err.code, "command failed");
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "tracker-contract: {err}");
    ExitCode::from(err.code)
}
