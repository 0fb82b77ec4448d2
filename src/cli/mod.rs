//! CLI module for fixcheck
//!
//! `fixcheck [FIXTURE_DIR]` runs every fixture in the directory through the
//! transform tool and the validator tool and reports the outcome.
//!
//! ## Exit codes
//!
//! - `0` every fixture passed (or there were none)
//! - `1` at least one fixture failed
//! - `2` setup error: missing fixture directory, missing tool, bad configuration
//! - `130` interrupted (SIGINT / ctrl-c)
//! - `143` terminated (SIGTERM)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros. Tool commands and
//! run settings come from the environment (see [`crate::config`]).
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use crate::config::CheckConfig;
use crate::error::SetupError;
use crate::fixture::{self, DEFAULT_FIXTURE_DIR};
use crate::report::{Reporter, reporter_for};
use crate::validator::FixtureValidator;
use crate::version::FIXCHECK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const SETUP: ExitCode = ExitCode(2);
    pub const INTERRUPTED: ExitCode = ExitCode(130);
    pub const TERMINATED: ExitCode = ExitCode(143);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a setup error (exit code 2).
    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::SETUP)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        tracing::error!("setup failed: {}", err);
        CliError::setup(format!("Error: {}", err))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Check that a transform tool keeps fixture sources syntactically valid
#[derive(Parser, Debug)]
#[command(name = "fixcheck")]
#[command(version = FIXCHECK_VERSION)]
#[command(
    about = "Run fixture files through a transform tool and check the output with a validator",
    long_about = None
)]
#[command(after_help = "Tools and run settings are read from FIXCHECK_TRANSFORM, FIXCHECK_VALIDATOR, \
FIXCHECK_LANG, FIXCHECK_JOBS, FIXCHECK_TIMEOUT_MS, FIXCHECK_FORMAT and FIXCHECK_TMPDIR.\n\
Tool commands are split on whitespace without quote handling; use a wrapper script \
for a program whose path contains spaces.")]
pub struct Cli {
    /// Directory containing the fixture files
    #[arg(value_name = "FIXTURE_DIR", default_value = DEFAULT_FIXTURE_DIR)]
    pub fixture_dir: PathBuf,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = CheckConfig::from_env()?;
    let mut reporter = reporter_for(config.format);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SetupError::Runtime)?;

    runtime.block_on(check_fixtures_until(
        &cli.fixture_dir,
        config,
        reporter.as_mut(),
        shutdown_signal(),
    ))
}

/// Wait for SIGINT or SIGTERM and return the matching exit code.
///
/// If a handler cannot be installed the run is left to finish on its own.
#[cfg(unix)]
pub async fn shutdown_signal() -> ExitCode {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!("cannot listen for SIGTERM: {}", e);
            None
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!("cannot listen for SIGINT: {}", e);
            None
        }
    };

    tokio::select! {
        Some(()) = recv_signal(sigterm.as_mut()) => ExitCode::TERMINATED,
        Some(()) = recv_signal(sigint.as_mut()) => ExitCode::INTERRUPTED,
        else => std::future::pending().await,
    }
}

#[cfg(unix)]
async fn recv_signal(stream: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match stream {
        Some(stream) => stream.recv().await,
        None => None,
    }
}

/// Wait for ctrl-c and return the matching exit code.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> ExitCode {
    match tokio::signal::ctrl_c().await {
        Ok(()) => ExitCode::INTERRUPTED,
        Err(e) => {
            tracing::warn!("cannot listen for ctrl-c: {}", e);
            std::future::pending().await
        }
    }
}

/// Run [`check_fixtures`] until it finishes or `shutdown` resolves.
///
/// On shutdown the run is dropped, which kills in-flight tools and removes
/// their temp files; no summary is printed and the shutdown's exit code is
/// returned.
pub async fn check_fixtures_until(
    dir: &Path,
    config: CheckConfig,
    reporter: &mut dyn Reporter,
    shutdown: impl Future<Output = ExitCode>,
) -> CliResult<ExitCode> {
    tokio::select! {
        outcome = check_fixtures(dir, config, reporter) => outcome,
        code = shutdown => {
            if code == ExitCode::TERMINATED {
                eprintln!("Terminated");
            } else {
                eprintln!("Interrupted");
            }
            Ok(code)
        }
    }
}

/// Check every fixture in `dir`, reporting through `reporter`.
///
/// Setup problems are returned before any fixture is touched. A run with
/// failing fixtures returns an error with an empty message, since the
/// reporter has already described the failures.
pub async fn check_fixtures(dir: &Path, config: CheckConfig, reporter: &mut dyn Reporter) -> CliResult<ExitCode> {
    let validator = FixtureValidator::new(config);
    validator.verify_tools()?;

    let language = validator.config().language;
    let files = fixture::discover_fixture_files(dir, language)?;

    for missing in fixture::missing_upstream_fixtures(dir, language) {
        tracing::warn!(
            "fixture {} is not present; fetch it from {}",
            missing.file_name(),
            missing.url()
        );
    }

    tracing::info!(
        count = files.len(),
        jobs = validator.config().jobs,
        transform = %validator.config().transform,
        validator = %validator.config().validator,
        "starting fixture run"
    );

    reporter.on_run_start(dir, files.len());
    let report = validator.run_to_completion(files, reporter).await;
    reporter.on_run_complete(&report);

    if report.summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================
