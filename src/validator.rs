//! Fixture validation pipeline
//!
//! Each fixture goes through two steps:
//!
//! 1. the transform tool rewrites it; its stdout is the transformed source
//! 2. the validator tool checks the transformed source, staged in a
//!    per-file temporary file
//!
//! A failure in either step marks that fixture failed and the run moves on.
//! Files are checked concurrently up to [`CheckConfig::jobs`], but results
//! come out in the order the files were given.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, Stream, StreamExt};
use tempfile::TempPath;

use crate::config::CheckConfig;
use crate::error::{CheckError, SetupError};
use crate::report::Reporter;
use crate::result::{RunReport, RunSummary, ValidationResult};
use crate::tool::{ToolInput, invoke_external_tool};

const TEMP_PREFIX: &str = "fixcheck-";

/// Runs the transform -> validate pipeline over fixture files.
#[derive(Debug, Clone)]
pub struct FixtureValidator {
    config: CheckConfig,
}

impl FixtureValidator {
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Make sure both tools can be launched before touching any fixture.
    pub fn verify_tools(&self) -> Result<(), SetupError> {
        self.config.transform.verify("transform")?;
        self.config.validator.verify("validator")?;
        if let Some(dir) = &self.config.temp_dir {
            if !dir.is_dir() {
                return Err(SetupError::InvalidConfig {
                    key: crate::config::ENV_TMPDIR,
                    value: dir.display().to_string(),
                    reason: "not a directory".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check a single fixture file.
    #[tracing::instrument(skip_all, fields(file = %path.display()))]
    pub async fn check_file(&self, path: &Path) -> ValidationResult {
        let start = Instant::now();
        tracing::debug!("checking fixture");

        match self.transform_and_validate(path).await {
            Ok(()) => ValidationResult::passed(path.to_path_buf(), start.elapsed()),
            Err(err) => {
                tracing::debug!(error = %err, "fixture failed");
                ValidationResult::failed(path.to_path_buf(), &err, start.elapsed())
            }
        }
    }

    async fn transform_and_validate(&self, path: &Path) -> Result<(), CheckError> {
        let language = self.config.language;
        let timeout = self.config.timeout;

        let transformed = invoke_external_tool(&self.config.transform, ToolInput { file: path, language }, timeout)
            .await
            .map_err(CheckError::from_transform)?;

        // Removed when dropped, whichever way this function exits.
        let staged = self.stage(path, &transformed.stdout)?;

        invoke_external_tool(&self.config.validator, ToolInput { file: &staged, language }, timeout)
            .await
            .map_err(CheckError::from_validation)?;

        staged.close()?;
        Ok(())
    }

    /// Write transformed output to a fresh temporary file.
    ///
    /// The file keeps the fixture's extension so extension-sensitive
    /// validators (e.g. `.mjs` vs `.js`) see the same kind of file.
    fn stage(&self, fixture: &Path, contents: &[u8]) -> std::io::Result<TempPath> {
        let suffix = fixture
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);
        let mut file = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(contents)?;
        file.flush()?;
        Ok(file.into_temp_path())
    }

    /// Lazily check `files`, yielding results in input order.
    ///
    /// At most `jobs` fixtures are in flight at once. Dropping the stream
    /// kills running tools and removes their temporary files.
    pub fn run(&self, files: Vec<PathBuf>) -> impl Stream<Item = ValidationResult> + '_ {
        self.run_observed(files, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_start` as each fixture's check begins.
    ///
    /// Starts happen in input order, but with `jobs > 1` several files may
    /// start before the first result is yielded.
    pub fn run_observed<'a, F>(
        &'a self,
        files: Vec<PathBuf>,
        on_start: F,
    ) -> impl Stream<Item = ValidationResult> + 'a
    where
        F: Fn(&Path) + Clone + 'a,
    {
        stream::iter(files)
            .map(move |path| {
                let on_start = on_start.clone();
                async move {
                    on_start(&path);
                    self.check_file(&path).await
                }
            })
            .buffered(self.config.jobs.max(1))
    }

    /// Check every file, telling `reporter` when each one starts and finishes.
    pub async fn run_to_completion(&self, files: Vec<PathBuf>, reporter: &mut dyn Reporter) -> RunReport {
        let start = Instant::now();
        let mut results = Vec::with_capacity(files.len());

        // Start and completion callbacks run on this task, never while the
        // other is borrowed.
        let reporter = RefCell::new(reporter);
        let stream = self.run_observed(files, |path| reporter.borrow_mut().on_file_start(path));
        futures::pin_mut!(stream);
        while let Some(result) = stream.next().await {
            reporter.borrow_mut().on_file_complete(&result);
            results.push(result);
        }

        let summary = RunSummary::from_results(&results, start.elapsed());
        RunReport { results, summary }
    }
}
