//! Per-file results and run summary

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CheckError;

/// Which step of the pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transform,
    Validation,
    Timeout,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transform => "TransformError",
            FailureKind::Validation => "ValidationError",
            FailureKind::Timeout => "TimeoutError",
        }
    }
}

/// Outcome of checking one fixture file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub file_path: PathBuf,
    pub transform_succeeded: bool,
    pub validation_succeeded: bool,
    pub error_output: Option<String>,
    pub failure: Option<FailureKind>,
    pub duration: Duration,
}

impl ValidationResult {
    pub fn passed(file_path: PathBuf, duration: Duration) -> Self {
        Self {
            file_path,
            transform_succeeded: true,
            validation_succeeded: true,
            error_output: None,
            failure: None,
            duration,
        }
    }

    /// Build a failed result; a validation-step error implies the transform succeeded.
    pub fn failed(file_path: PathBuf, error: &CheckError, duration: Duration) -> Self {
        let (transform_succeeded, failure) = match error {
            CheckError::Transform(_) => (false, FailureKind::Transform),
            CheckError::Timeout { step: "transform", .. } => (false, FailureKind::Timeout),
            CheckError::Timeout { .. } => (true, FailureKind::Timeout),
            CheckError::Validation(_) | CheckError::TempFile(_) => (true, FailureKind::Validation),
        };
        Self {
            file_path,
            transform_succeeded,
            validation_succeeded: false,
            error_output: Some(error.detail()),
            failure: Some(failure),
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.transform_succeeded && self.validation_succeeded
    }
}

/// Totals over a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn from_results(results: &[ValidationResult], duration: Duration) -> Self {
        let passed = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// `"2 passed, 1 failed"`, or `"no fixtures"` for an empty run.
    pub fn counts_line(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if parts.is_empty() {
            "no fixtures".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<ValidationResult>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::ToolError;

    fn result(name: &str, ok: bool) -> ValidationResult {
        let path = PathBuf::from(name);
        if ok {
            ValidationResult::passed(path, Duration::ZERO)
        } else {
            let err = CheckError::from_validation(ToolError::ExitStatus {
                program: "node".to_string(),
                code: Some(1),
                stderr: "SyntaxError".to_string(),
            });
            ValidationResult::failed(path, &err, Duration::ZERO)
        }
    }

    #[test]
    fn test_validation_failure_keeps_transform_success() {
        let r = result("b.js", false);
        assert!(r.transform_succeeded);
        assert!(!r.validation_succeeded);
        assert_eq!(r.failure, Some(FailureKind::Validation));
        assert!(r.error_output.as_deref().unwrap().contains("SyntaxError"));
    }

    #[test]
    fn test_transform_failure() {
        let err = CheckError::from_transform(ToolError::ExitStatus {
            program: "minify".to_string(),
            code: Some(1),
            stderr: String::new(),
        });
        let r = ValidationResult::failed(PathBuf::from("a.js"), &err, Duration::ZERO);
        assert!(!r.transform_succeeded);
        assert!(!r.validation_succeeded);
        assert_eq!(r.failure, Some(FailureKind::Transform));
    }

    #[test]
    fn test_transform_timeout() {
        let err = CheckError::from_transform(ToolError::Timeout {
            program: "minify".to_string(),
            after: Duration::from_secs(1),
        });
        let r = ValidationResult::failed(PathBuf::from("a.js"), &err, Duration::ZERO);
        assert!(!r.transform_succeeded);
        assert_eq!(r.failure, Some(FailureKind::Timeout));
    }

    #[test]
    fn test_counts_line() {
        let results = vec![result("a.js", true), result("b.js", false), result("c.js", true)];
        let summary = RunSummary::from_results(&results, Duration::ZERO);
        assert_eq!(summary.counts_line(), "2 passed, 1 failed");
        assert_eq!(RunSummary::default().counts_line(), "no fixtures");
    }

    proptest! {
        #[test]
        fn summary_counts_match_results(outcomes in proptest::collection::vec(any::<bool>(), 0..64)) {
            let results: Vec<_> = outcomes
                .iter()
                .enumerate()
                .map(|(i, ok)| result(&format!("f{i}.js"), *ok))
                .collect();
            let summary = RunSummary::from_results(&results, Duration::ZERO);
            let expected_failed = outcomes.iter().filter(|ok| !**ok).count();

            prop_assert_eq!(summary.total, outcomes.len());
            prop_assert_eq!(summary.failed, expected_failed);
            prop_assert_eq!(summary.passed + summary.failed, summary.total);
            prop_assert_eq!(summary.is_success(), expected_failed == 0);
        }
    }
}
