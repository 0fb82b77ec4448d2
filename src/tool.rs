//! External tool invocation
//!
//! Both pipeline steps go through [`invoke_external_tool`]: spawn a program
//! with an argument template expanded for one input file, capture its output,
//! and turn launch failures, non-zero exits and timeouts into [`ToolError`].
//!
//! ## Argument templates
//!
//! Each argument may contain `{lang}` (the source-language tag) and `{file}`
//! (the input path). If no argument mentions `{file}`, the path is appended.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{SetupError, ToolError};
use crate::fixture::SourceLanguage;

const FILE_PLACEHOLDER: &str = "{file}";
const LANG_PLACEHOLDER: &str = "{lang}";

/// A program plus its argument template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line such as `node -c {file}`.
    ///
    /// Words are split on whitespace only; quotes and escapes are not
    /// interpreted, so a program path containing spaces cannot be expressed.
    /// Point the variable at a wrapper script or a symlink instead.
    pub fn parse(role: &'static str, line: &str) -> Result<Self, SetupError> {
        let mut words = line.split_whitespace();
        let program = words.next().ok_or(SetupError::EmptyCommand { role })?;
        Ok(Self::new(program, words))
    }

    /// Arguments for one invocation.
    pub fn expand_args(&self, file: &Path, language: SourceLanguage) -> Vec<String> {
        let file = file.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(LANG_PLACEHOLDER, language.tag()).replace(FILE_PLACEHOLDER, &file))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(FILE_PLACEHOLDER)) {
            args.push(file.into_owned());
        }
        args
    }

    /// Check that the program can be launched.
    pub fn verify(&self, role: &'static str) -> Result<PathBuf, SetupError> {
        resolve_program(&self.program).ok_or_else(|| SetupError::MissingTool {
            role,
            program: self.program.clone(),
        })
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What an invocation operates on.
#[derive(Debug, Clone, Copy)]
pub struct ToolInput<'a> {
    pub file: &'a Path,
    pub language: SourceLanguage,
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run `command` on `input`, failing on launch error, non-zero exit or timeout.
///
/// The child is killed if the returned future is dropped before it exits. On
/// unix the child leads its own process group and the whole group is killed,
/// so processes the tool started itself do not outlive it.
pub async fn invoke_external_tool(
    command: &ToolCommand,
    input: ToolInput<'_>,
    timeout: Option<Duration>,
) -> Result<ToolOutput, ToolError> {
    let args = command.expand_args(input.file, input.language);
    tracing::debug!(program = %command.program, ?args, "invoking external tool");

    let mut cmd = Command::new(&command.program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|source| ToolError::Launch {
        program: command.program.clone(),
        source,
    })?;
    let mut group = ProcessGroupGuard::new(child.id());

    let output = match timeout {
        Some(after) => match tokio::time::timeout(after, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(ToolError::Timeout {
                    program: command.program.clone(),
                    after,
                });
            }
        },
        None => child.wait_with_output().await?,
    };

    group.disarm();

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    tracing::debug!(program = %command.program, code = ?output.status.code(), "external tool exited");

    if output.status.success() {
        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
        })
    } else {
        Err(ToolError::ExitStatus {
            program: command.program.clone(),
            code: output.status.code(),
            stderr,
        })
    }
}

/// Kills a tool's process group unless the tool exited on its own.
///
/// `kill_on_drop` only reaches the direct child; wrappers like `sh -c` or
/// `npx` leave their own children running without this.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        // The group id is the negated leader pid.
        let status = std::process::Command::new("kill")
            .args(["-KILL", "--", &format!("-{}", pgid)])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => tracing::debug!(pgid, "killed tool process group"),
            Ok(_) => {}
            Err(err) => tracing::warn!(pgid, error = %err, "failed to kill tool process group"),
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}

/// Locate `program` the way a shell would.
///
/// Anything with a path separator is taken as a path; a bare name is looked
/// up on `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .flat_map(|dir| executable_names(program).into_iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    if Path::new(program).extension().is_some() {
        vec![program.to_string()]
    } else {
        vec![program.to_string(), format!("{}.exe", program), format!("{}.cmd", program)]
    }
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}
