#![forbid(unsafe_code)]
//! fixcheck: fixture validation for source transform tools
//!
//! Runs each fixture file through an external transform tool (such as a
//! minifier) and checks the transformed output with an external validator
//! (such as `node -c`). Neither tool is implemented here; both are opaque
//! programs driven through [`tool::invoke_external_tool`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod report;
pub mod result;
pub mod tool;
pub mod validator;
pub mod version;

pub use config::{CheckConfig, ReportFormat};
pub use error::{CheckError, SetupError, ToolError};
pub use fixture::{SourceLanguage, discover_fixture_files};
pub use report::{ConsoleReporter, JsonReporter, Reporter};
pub use result::{FailureKind, RunReport, RunSummary, ValidationResult};
pub use tool::{ToolCommand, ToolInput, ToolOutput, invoke_external_tool};
pub use validator::FixtureValidator;
