//! Error kinds for a fixture run
//!
//! - [`SetupError`] is fatal: the run aborts before any fixture is checked.
//! - [`CheckError`] is local to one fixture file and is recorded in its
//!   [`ValidationResult`](crate::result::ValidationResult).
//! - [`ToolError`] is what a single external tool invocation can fail with.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("fixture directory '{}' does not exist", .0.display())]
    MissingFixtureDir(PathBuf),

    #[error("fixture path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read fixture directory '{}': {source}", .path.display())]
    ReadFixtureDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} tool '{program}' not found")]
    MissingTool { role: &'static str, program: String },

    #[error("{role} command is empty")]
    EmptyCommand { role: &'static str },

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Failure of one external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}", describe_code(.code))]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' timed out after {}ms", .after.as_millis())]
    Timeout { program: String, after: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Diagnostic text the tool produced, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::ExitStatus { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Render the error along with captured diagnostics.
    pub fn detail(&self) -> String {
        match self.stderr() {
            Some(stderr) => format!("{}\n{}", self, stderr.trim_end()),
            None => self.to_string(),
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Per-file failure of the transform -> validate pipeline.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("transform failed: {0}")]
    Transform(#[source] ToolError),

    #[error("validation failed: {0}")]
    Validation(#[source] ToolError),

    #[error("{step} timed out after {}ms", .after.as_millis())]
    Timeout { step: &'static str, after: Duration },

    #[error("temporary file error: {0}")]
    TempFile(#[from] std::io::Error),
}

impl CheckError {
    /// Classify a transform-step tool error.
    pub fn from_transform(err: ToolError) -> Self {
        match err {
            ToolError::Timeout { after, .. } => CheckError::Timeout { step: "transform", after },
            other => CheckError::Transform(other),
        }
    }

    /// Classify a validation-step tool error.
    pub fn from_validation(err: ToolError) -> Self {
        match err {
            ToolError::Timeout { after, .. } => CheckError::Timeout { step: "validation", after },
            other => CheckError::Validation(other),
        }
    }

    /// Full error output for the failure summary.
    pub fn detail(&self) -> String {
        match self {
            CheckError::Transform(e) => format!("transform failed: {}", e.detail()),
            CheckError::Validation(e) => format!("validation failed: {}", e.detail()),
            other => other.to_string(),
        }
    }
}
