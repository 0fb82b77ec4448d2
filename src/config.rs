//! Run configuration
//!
//! The command line only names the fixture directory; everything else comes
//! from `FIXCHECK_*` environment variables on top of [`CheckConfig::default`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SetupError;
use crate::fixture::SourceLanguage;
use crate::tool::ToolCommand;

pub const ENV_TRANSFORM: &str = "FIXCHECK_TRANSFORM";
pub const ENV_VALIDATOR: &str = "FIXCHECK_VALIDATOR";
pub const ENV_LANG: &str = "FIXCHECK_LANG";
pub const ENV_JOBS: &str = "FIXCHECK_JOBS";
pub const ENV_TIMEOUT_MS: &str = "FIXCHECK_TIMEOUT_MS";
pub const ENV_FORMAT: &str = "FIXCHECK_FORMAT";
pub const ENV_TMPDIR: &str = "FIXCHECK_TMPDIR";

/// Default transform tool: the native minifier build output.
pub const DEFAULT_TRANSFORM: &str = "build/native/minify {lang} {file}";
/// Default validator: node in syntax-check mode.
pub const DEFAULT_VALIDATOR: &str = "node -c {file}";

/// How results are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "text" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("expected 'console' or 'json', got '{}'", other)),
        }
    }
}

/// Configuration for one fixture run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Tool that rewrites each fixture; its stdout is the transformed source
    pub transform: ToolCommand,
    /// Tool that must accept the transformed source
    pub validator: ToolCommand,
    /// Language of the fixtures (selects files and fills `{lang}`)
    pub language: SourceLanguage,
    /// Number of fixtures checked concurrently
    pub jobs: usize,
    /// Per-step limit; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub format: ReportFormat,
    /// Where transformed output is staged; `None` uses the system temp dir
    pub temp_dir: Option<PathBuf>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            transform: default_command(DEFAULT_TRANSFORM),
            validator: default_command(DEFAULT_VALIDATOR),
            language: SourceLanguage::JavaScript,
            jobs: default_jobs(),
            timeout: None,
            format: ReportFormat::Console,
            temp_dir: None,
        }
    }
}

fn default_command(line: &str) -> ToolCommand {
    let mut words = line.split_whitespace();
    let program = words.next().unwrap_or_default();
    ToolCommand::new(program, words)
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

impl CheckConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `FIXCHECK_*` environment variables.
    pub fn from_env() -> Result<Self, SetupError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SetupError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(line) = get(ENV_TRANSFORM) {
            config.transform = ToolCommand::parse("transform", &line)?;
        }
        if let Some(line) = get(ENV_VALIDATOR) {
            config.validator = ToolCommand::parse("validator", &line)?;
        }
        if let Some(value) = get(ENV_LANG) {
            config.language = value.parse().map_err(|reason| invalid(ENV_LANG, &value, reason))?;
        }
        if let Some(value) = get(ENV_JOBS) {
            let jobs: usize = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(ENV_JOBS, &value, e.to_string()))?;
            if jobs == 0 {
                return Err(invalid(ENV_JOBS, &value, "must be at least 1".to_string()));
            }
            config.jobs = jobs;
        }
        if let Some(value) = get(ENV_TIMEOUT_MS) {
            let ms: u64 = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(ENV_TIMEOUT_MS, &value, e.to_string()))?;
            // 0 disables the timeout
            config.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(value) = get(ENV_FORMAT) {
            config.format = value.parse().map_err(|reason| invalid(ENV_FORMAT, &value, reason))?;
        }
        if let Some(value) = get(ENV_TMPDIR) {
            config.temp_dir = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    pub fn with_transform(mut self, command: ToolCommand) -> Self {
        self.transform = command;
        self
    }

    pub fn with_validator(mut self, command: ToolCommand) -> Self {
        self.validator = command;
        self
    }

    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = language;
        self
    }

    /// Set the worker count (clamped to at least 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> SetupError {
    SetupError::InvalidConfig {
        key,
        value: value.to_string(),
        reason,
    }
}
