// crates/tenant-isolation-cli/src/main.rs
// ============================================================================
// Module: Tenant Isolation CLI Entry Point
// Description: Runs isolation validations or a labeled-resource sweep.
// Purpose: Provide a localized CLI around the validation orchestrator.
// Dependencies: clap, serde_json, thiserror, tokio, tenant-isolation-*
// ============================================================================

//! ## Overview
//! `tenant-isolation` loads configuration, checks that Docker answers, and then
//! either runs a full validation or (with `--cleanup-only`) removes every
//! resource carrying the isolation label. Ctrl-C during a validation routes
//! into the orchestrator's shutdown path so created resources are still
//! removed. Exit code 0 means the run passed or the sweep was clean.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use tenant_isolation_cli::i18n::Locale;
use tenant_isolation_cli::i18n::set_locale;
use tenant_isolation_cli::t;
use tenant_isolation_config::IsolationConfig;
use tenant_isolation_core::CleanupCoordinator;
use tenant_isolation_core::CleanupReport;
use tenant_isolation_core::ContainerPlatform;
use tenant_isolation_core::FileAuditSink;
use tenant_isolation_core::ISOLATION_LABEL;
use tenant_isolation_core::ISOLATION_LABEL_VALUE;
use tenant_isolation_core::IsolationAuditSink;
use tenant_isolation_core::NoopAuditSink;
use tenant_isolation_core::ProbeStatus;
use tenant_isolation_core::StderrAuditSink;
use tenant_isolation_core::ValidationOrchestrator;
use tenant_isolation_core::ValidationReport;
use tenant_isolation_core::ValidationRun;
use tenant_isolation_docker::DockerCli;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "TENANT_ISOLATION_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tenant-isolation", disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue)]
    show_version: bool,
    /// Preferred output language (overrides `TENANT_ISOLATION_LANG`).
    #[arg(long, value_enum, value_name = "LANG")]
    lang: Option<LangArg>,
    /// Number of tenants to provision (overrides `run.tenants`).
    #[arg(long, value_name = "N")]
    tenants: Option<usize>,
    /// Write the JSON report to this path.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Only remove resources left behind by earlier runs.
    #[arg(long, action = ArgAction::SetTrue)]
    cleanup_only: bool,
    /// Config file path (defaults to tenant-isolation.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Append JSON-lines audit events to this file instead of stderr.
    #[arg(long, value_name = "PATH", conflicts_with = "quiet_audit")]
    audit_log: Option<PathBuf>,
    /// Discard audit events.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet_audit: bool,
}

/// CLI locale arguments.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Resolves configuration and dispatches to validation or sweep.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))?;
    }

    if cli.show_version {
        write_stdout_line(&t!("main.version", version = env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = IsolationConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let audit = build_audit_sink(cli.audit_log.as_deref(), cli.quiet_audit)?;

    let docker = DockerCli::new(config.docker.binary.clone());
    let version = docker
        .ensure_available()
        .await
        .map_err(|err| CliError::new(t!("docker.unavailable", error = err)))?;
    write_stdout_line(&t!(
        "docker.connected",
        version = version,
        binary = docker.binary().display()
    ))?;
    let platform: Arc<dyn ContainerPlatform> = Arc::new(docker);

    if cli.cleanup_only {
        return command_sweep(platform, &config, audit).await;
    }
    let tenants = cli.tenants.unwrap_or(config.run.tenants);
    command_validate(platform, &config, audit, tenants, cli.output.as_deref()).await
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs a validation and reports the outcome.
async fn command_validate(
    platform: Arc<dyn ContainerPlatform>,
    config: &IsolationConfig,
    audit: Arc<dyn IsolationAuditSink>,
    tenants: usize,
    output: Option<&Path>,
) -> CliResult<ExitCode> {
    let orchestrator = ValidationOrchestrator::new(platform, config.to_settings(), audit);
    write_stdout_line(&t!("validate.start", tenants = tenants))?;
    let run = orchestrator.run_validation_until(tenants, shutdown_signal()).await;
    write_stdout_text(&render_run(&run))?;
    if let Some(path) = output {
        write_report(path, &run.report)?;
        write_stdout_line(&t!("report.written", path = path.display()))?;
    }
    Ok(exit_code(run.report.is_passed()))
}

/// Removes every labeled resource.
async fn command_sweep(
    platform: Arc<dyn ContainerPlatform>,
    config: &IsolationConfig,
    audit: Arc<dyn IsolationAuditSink>,
) -> CliResult<ExitCode> {
    let label = format!("{ISOLATION_LABEL}={ISOLATION_LABEL_VALUE}");
    write_stdout_line(&t!("cleanup.sweep_start", label = label))?;
    let coordinator = CleanupCoordinator::new(platform, config.to_settings().stop_timeout, audit);
    let report = coordinator
        .sweep_labeled()
        .await
        .map_err(|err| CliError::new(t!("cleanup.sweep_failed", error = err)))?;
    write_stdout_text(&render_cleanup(&report, true))?;
    Ok(exit_code(report.is_clean()))
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the console summary of a validation run.
fn render_run(run: &ValidationRun) -> String {
    let report = &run.report;
    let mut text = String::new();
    push_line(
        &mut text,
        &t!(
            "validate.header",
            status = report.validation_status,
            tenants = report.total_tenants,
            timestamp = report.timestamp
        ),
    );
    for (category, result) in &report.isolation_checks {
        let line = match (result.status, &result.skip_reason) {
            (ProbeStatus::Skipped, Some(reason)) => t!(
                "validate.check_skipped",
                category = category,
                status = result.status,
                reason = reason
            ),
            _ => t!("validate.check", category = category, status = result.status),
        };
        push_line(&mut text, &line);
    }
    let summary = &report.summary;
    push_line(
        &mut text,
        &t!(
            "validate.counts",
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            total = summary.total_checks
        ),
    );
    if !summary.issues.is_empty() {
        push_line(&mut text, &t!("validate.issues_header"));
        for issue in &summary.issues {
            push_line(&mut text, &t!("validate.issue", issue = issue));
        }
    }
    text.push_str(&render_cleanup(&run.cleanup, false));
    text
}

/// Renders a cleanup or sweep outcome; `list_removed` adds one line per removal.
fn render_cleanup(report: &CleanupReport, list_removed: bool) -> String {
    let mut text = String::new();
    push_line(
        &mut text,
        &t!("cleanup.summary", removed = report.removed.len(), failures = report.failures.len()),
    );
    if list_removed {
        for (kind, name) in &report.removed {
            push_line(&mut text, &t!("cleanup.removed", kind = kind, name = name));
        }
    }
    for failure in &report.failures {
        push_line(
            &mut text,
            &t!("cleanup.failure", kind = failure.kind, name = failure.name, error = failure.error),
        );
    }
    text
}

/// Appends `line` and a newline.
fn push_line(text: &mut String, line: &str) {
    let _ = writeln!(text, "{line}");
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Selects the audit destination.
fn build_audit_sink(
    audit_log: Option<&Path>,
    quiet: bool,
) -> CliResult<Arc<dyn IsolationAuditSink>> {
    if quiet {
        return Ok(Arc::new(NoopAuditSink));
    }
    match audit_log {
        Some(path) => {
            let sink = FileAuditSink::new(path).map_err(|err| {
                CliError::new(t!("audit.open_failed", path = path.display(), error = err))
            })?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Writes the report as pretty JSON.
fn write_report(path: &Path, report: &ValidationReport) -> CliResult<()> {
    let mut bytes = serde_json::to_vec_pretty(report)
        .map_err(|err| CliError::new(t!("report.serialize_failed", error = err)))?;
    bytes.push(b'\n');
    fs::write(path, bytes).map_err(|err| {
        CliError::new(t!("report.write_failed", path = path.display(), error = err))
    })
}

/// Maps success to the process exit code.
fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes preformatted text to stdout.
fn write_stdout_text(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}").map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
