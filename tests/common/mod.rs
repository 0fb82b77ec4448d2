//! Shared helpers for the fixture-run integration tests
//!
//! Real subprocesses stand in for the transform and validator tools:
//! - transform: `cat`, failing for files named `*broken_transform*` and
//!   sleeping for files named `*slow*`
//! - validator: a brace-balance check, so a truncated file is "invalid"
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use fixcheck::{
    CheckConfig, FixtureValidator, Reporter, RunReport, SourceLanguage, ToolCommand, ValidationResult,
    discover_fixture_files,
};

pub const VALID_JS: &str = "function add(a, b) {\n  return a + b;\n}\nmodule.exports = { add };\n";
pub const UNMATCHED_BRACE_JS: &str = "function add(a, b) {\n  return a + b;\n";

const TRANSFORM_SCRIPT: &str = r#"
case "$2" in
  *broken_transform*) echo "minify: unterminated string literal" >&2; exit 1 ;;
  *slow*) sleep 5 ;;
esac
cat "$2"
"#;

const VALIDATOR_SCRIPT: &str = r#"
open=$(tr -cd '{' < "$1" | wc -c)
close=$(tr -cd '}' < "$1" | wc -c)
if [ "$open" -ne "$close" ]; then
  echo "SyntaxError: Unexpected end of input" >&2
  exit 1
fi
"#;

pub fn transform_tool() -> ToolCommand {
    ToolCommand::new("sh", ["-c", TRANSFORM_SCRIPT, "transform", "{lang}", "{file}"])
}

pub fn validator_tool() -> ToolCommand {
    ToolCommand::new("sh", ["-c", VALIDATOR_SCRIPT, "validator", "{file}"])
}

/// Fixture directory plus a private directory for staged output.
pub struct Workspace {
    pub fixtures: TempDir,
    pub scratch: TempDir,
}

impl Workspace {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let fixtures = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(fixtures.path().join(name), contents).unwrap();
        }
        Self {
            fixtures,
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.fixtures.path()
    }

    pub fn config(&self) -> CheckConfig {
        CheckConfig::new()
            .with_transform(transform_tool())
            .with_validator(validator_tool())
            .with_language(SourceLanguage::JavaScript)
            .with_jobs(4)
            .with_temp_dir(self.scratch.path())
    }

    pub fn leftover_temp_files(&self) -> Vec<PathBuf> {
        fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    pub async fn run(&self, config: CheckConfig) -> RunReport {
        let files = discover_fixture_files(self.dir(), config.language).unwrap();
        let mut reporter = CollectingReporter::default();
        FixtureValidator::new(config).run_to_completion(files, &mut reporter).await
    }
}

/// Records every reporter callback.
#[derive(Default)]
pub struct CollectingReporter {
    pub started_with: Option<usize>,
    pub started: Vec<PathBuf>,
    pub seen: Vec<PathBuf>,
    /// `start <name>` / `done <name>` in callback order
    pub events: Vec<String>,
    pub completed: bool,
}

impl Reporter for CollectingReporter {
    fn on_run_start(&mut self, _dir: &Path, count: usize) {
        self.started_with = Some(count);
    }

    fn on_file_start(&mut self, path: &Path) {
        self.events.push(format!("start {}", path_name(path)));
        self.started.push(path.to_path_buf());
    }

    fn on_file_complete(&mut self, result: &ValidationResult) {
        self.events.push(format!("done {}", path_name(&result.file_path)));
        self.seen.push(result.file_path.clone());
    }

    fn on_run_complete(&mut self, _report: &RunReport) {
        self.completed = true;
    }
}

pub fn file_name(result: &ValidationResult) -> String {
    path_name(&result.file_path)
}

pub fn path_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

/// A validator that never finishes within a test.
pub fn stuck_validator() -> ToolCommand {
    ToolCommand::new("sh", ["-c", "sleep 5", "validator", "{file}"])
}
