//! Result reporting
//!
//! The validator hands each [`ValidationResult`] to a [`Reporter`] as soon as
//! it is available and the whole [`RunReport`] once the run is over. Two
//! reporters ship with the crate:
//!
//! - [`ConsoleReporter`]: the fixture path when its check starts, a status
//!   line when it finishes, a failures section and a summary line
//! - [`JsonReporter`]: a single JSON document at the end, for CI

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::config::ReportFormat;
use crate::result::{RunReport, RunSummary, ValidationResult};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Trait for reporting fixture results.
///
/// Implement this trait to customize the output format.
pub trait Reporter {
    /// Called once the fixture files are known
    fn on_run_start(&mut self, _dir: &Path, _count: usize) {}

    /// Called when a fixture's check begins
    fn on_file_start(&mut self, _path: &Path) {}

    /// Called when a fixture has been checked
    fn on_file_complete(&mut self, result: &ValidationResult);

    /// Called after every fixture has been checked
    fn on_run_complete(&mut self, report: &RunReport);
}

/// Build the reporter for `format`.
pub fn reporter_for(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Console => Box::new(ConsoleReporter::new(io::stdout().is_terminal())),
        ReportFormat::Json => Box::new(JsonReporter::default()),
    }
}

/// Human-readable reporter
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Reporter for ConsoleReporter {
    fn on_run_start(&mut self, dir: &Path, count: usize) {
        if count == 0 {
            println!("No fixture files collected from {}", dir.display());
        } else {
            println!("collected {} fixture(s) from {}", count, dir.display());
            println!();
        }
    }

    fn on_file_start(&mut self, path: &Path) {
        println!("{}", path.display());
    }

    fn on_file_complete(&mut self, result: &ValidationResult) {
        println!("{}", render_result_line(result, self.color));
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        let failures = render_failures(report, self.color);
        if !failures.is_empty() {
            println!();
            print!("{}", failures);
        }
        println!();
        println!("{}", render_summary_line(&report.summary, self.color));
    }
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", code, text, RESET)
    } else {
        text.to_string()
    }
}

/// `<path> PASSED (12ms)` / `<path> FAILED (12ms)`
pub fn render_result_line(result: &ValidationResult, color: bool) -> String {
    let status = if result.is_success() {
        paint("PASSED", GREEN, color)
    } else {
        paint("FAILED", RED, color)
    };
    format!(
        "{} {} ({}ms)",
        result.file_path.display(),
        status,
        result.duration.as_millis()
    )
}

/// Failures section listing each failing file with its error output.
///
/// Empty when nothing failed.
pub fn render_failures(report: &RunReport, color: bool) -> String {
    let mut out = String::new();
    let mut failures = report.failures().peekable();
    if failures.peek().is_none() {
        return out;
    }

    out.push_str(&paint("=================== FAILURES ===================", BOLD_RED, color));
    out.push('\n');
    for result in failures {
        out.push('\n');
        out.push_str(&format!("___________ {} ___________\n", result.file_path.display()));
        let kind = result.failure.map(|k| k.as_str()).unwrap_or("Error");
        let detail = result.error_output.as_deref().unwrap_or("");
        out.push_str(&format!("{}: {}\n", kind, detail.trim_end()));
    }
    out
}

/// `=== 2 passed, 1 failed in 0.41s ===`
pub fn render_summary_line(summary: &RunSummary, color: bool) -> String {
    let line = format!(
        "=================== {} in {:.2}s ===================",
        summary.counts_line(),
        summary.duration.as_secs_f64()
    );
    let code = if summary.is_success() { BOLD_GREEN } else { BOLD_RED };
    paint(&line, code, color)
}

/// Machine-readable reporter; writes one JSON document to stdout at the end.
#[derive(Debug, Default)]
pub struct JsonReporter {
    fixture_dir: Option<PathBuf>,
}

impl Reporter for JsonReporter {
    fn on_run_start(&mut self, dir: &Path, _count: usize) {
        self.fixture_dir = Some(dir.to_path_buf());
    }

    fn on_file_start(&mut self, path: &Path) {
        tracing::debug!(file = %path.display(), "checking fixture");
    }

    fn on_file_complete(&mut self, result: &ValidationResult) {
        tracing::debug!(file = %result.file_path.display(), passed = result.is_success(), "fixture checked");
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        let doc = report_to_json(self.fixture_dir.as_deref(), report);
        let mut stdout = io::stdout().lock();
        let written = serde_json::to_writer_pretty(&mut stdout, &doc)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(stdout));
        if let Err(e) = written {
            tracing::error!("failed to write JSON report: {}", e);
        }
    }
}

pub fn result_to_json(result: &ValidationResult) -> Value {
    json!({
        "file": result.file_path.display().to_string(),
        "transform_succeeded": result.transform_succeeded,
        "validation_succeeded": result.validation_succeeded,
        "error_kind": result.failure.map(|k| k.as_str()),
        "error_output": result.error_output,
        "duration_ms": result.duration.as_millis() as u64,
    })
}

pub fn report_to_json(fixture_dir: Option<&Path>, report: &RunReport) -> Value {
    let summary = &report.summary;
    json!({
        "fixture_dir": fixture_dir.map(|d| d.display().to_string()),
        "results": report.results.iter().map(result_to_json).collect::<Vec<_>>(),
        "summary": {
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed,
            "success": summary.is_success(),
            "duration_ms": summary.duration.as_millis() as u64,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{CheckError, ToolError};

    fn sample_report() -> RunReport {
        let passed = ValidationResult::passed(PathBuf::from("libs/a.js"), Duration::from_millis(7));
        let err = CheckError::from_validation(ToolError::ExitStatus {
            program: "node".to_string(),
            code: Some(1),
            stderr: "SyntaxError: Unexpected token '}'\n".to_string(),
        });
        let failed = ValidationResult::failed(PathBuf::from("libs/b.js"), &err, Duration::from_millis(3));
        let results = vec![passed, failed];
        let summary = RunSummary::from_results(&results, Duration::from_millis(1250));
        RunReport { results, summary }
    }

    #[test]
    fn test_result_line() {
        let report = sample_report();
        insta::assert_snapshot!(render_result_line(&report.results[0], false), @"libs/a.js PASSED (7ms)");
        insta::assert_snapshot!(render_result_line(&report.results[1], false), @"libs/b.js FAILED (3ms)");
    }

    #[test]
    fn test_result_line_colored() {
        let report = sample_report();
        assert_eq!(
            render_result_line(&report.results[0], true),
            "libs/a.js \x1b[32mPASSED\x1b[0m (7ms)"
        );
    }

    #[test]
    fn test_summary_line() {
        let report = sample_report();
        insta::assert_snapshot!(
            render_summary_line(&report.summary, false),
            @"=================== 1 passed, 1 failed in 1.25s ==================="
        );
    }

    #[test]
    fn test_failures_section() {
        let report = sample_report();
        let expected = "=================== FAILURES ===================\n\
                        \n\
                        ___________ libs/b.js ___________\n\
                        ValidationError: validation failed: 'node' exited with exit code 1\n\
                        SyntaxError: Unexpected token '}'\n";
        assert_eq!(render_failures(&report, false), expected);
    }

    #[test]
    fn test_no_failures_section_when_all_pass() {
        let results = vec![ValidationResult::passed(PathBuf::from("a.js"), Duration::ZERO)];
        let summary = RunSummary::from_results(&results, Duration::ZERO);
        let report = RunReport { results, summary };
        assert_eq!(render_failures(&report, false), "");
    }

    #[test]
    fn test_json_report() {
        let report = sample_report();
        let doc = report_to_json(Some(Path::new("libs")), &report);

        assert_eq!(doc["fixture_dir"], "libs");
        assert_eq!(doc["summary"]["total"], 2);
        assert_eq!(doc["summary"]["failed"], 1);
        assert_eq!(doc["summary"]["success"], false);

        let results = doc["results"].as_array().unwrap();
        assert_eq!(results[0]["file"], "libs/a.js");
        assert_eq!(results[0]["error_kind"], Value::Null);
        assert_eq!(results[1]["error_kind"], "ValidationError");
        assert_eq!(results[1]["transform_succeeded"], true);
        assert!(results[1]["error_output"].as_str().unwrap().contains("Unexpected token"));
    }
}
