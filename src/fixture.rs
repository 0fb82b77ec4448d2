//! Fixture discovery
//!
//! A fixture directory is a flat directory of source files. Files are selected
//! by extension for the configured [`SourceLanguage`] and returned in path
//! order so reports are deterministic.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SetupError;

/// Directory checked when no fixture directory is given.
pub const DEFAULT_FIXTURE_DIR: &str = "test-js-libs";

/// A named, versioned upstream file used to populate the fixture directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamFixture {
    pub package: &'static str,
    pub version: &'static str,
    pub path: &'static str,
}

impl UpstreamFixture {
    pub fn url(&self) -> String {
        format!("https://unpkg.com/{}@{}/{}", self.package, self.version, self.path)
    }

    /// File name the fixture is stored under locally.
    pub fn file_name(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }
}

/// Upstream libraries the default fixture directory is populated from.
///
/// Acquisition is a manual step outside this crate; the list is kept here so
/// a missing fixture can be reported with where it comes from.
pub const UPSTREAM_FIXTURES: &[UpstreamFixture] = &[
    UpstreamFixture {
        package: "react",
        version: "17.0.2",
        path: "cjs/react.development.js",
    },
    UpstreamFixture {
        package: "typescript",
        version: "5.2.2",
        path: "lib/typescript.js",
    },
];

/// Source languages the transform tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceLanguage {
    #[default]
    JavaScript,
    Css,
    Json,
    Html,
    Xml,
}

impl SourceLanguage {
    pub const ALL: [SourceLanguage; 5] = [
        SourceLanguage::JavaScript,
        SourceLanguage::Css,
        SourceLanguage::Json,
        SourceLanguage::Html,
        SourceLanguage::Xml,
    ];

    /// Tag passed to the transform tool as its language argument.
    pub fn tag(self) -> &'static str {
        match self {
            SourceLanguage::JavaScript => "js",
            SourceLanguage::Css => "css",
            SourceLanguage::Json => "json",
            SourceLanguage::Html => "html",
            SourceLanguage::Xml => "xml",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceLanguage::JavaScript => &["js", "mjs", "cjs"],
            SourceLanguage::Css => &["css"],
            SourceLanguage::Json => &["json"],
            SourceLanguage::Html => &["html", "htm"],
            SourceLanguage::Xml => &["xml", "svg"],
        }
    }

    /// Detect the language of a file from its extension.
    pub fn from_path(path: &Path) -> Option<SourceLanguage> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    fn matches(self, path: &Path) -> bool {
        Self::from_path(path) == Some(self)
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag() == s)
            .ok_or_else(|| format!("expected one of js, css, json, html, xml; got '{}'", s))
    }
}

/// List the fixture files for `language` directly inside `dir`.
///
/// Subdirectories and hidden files are ignored. The result is sorted.
///
/// An entry that cannot be read aborts discovery. Anything else with a
/// matching name is listed, even if it cannot be opened (e.g. a dangling
/// symlink), so it is reported as a failing fixture rather than skipped.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), lang = %language))]
pub fn discover_fixture_files(dir: &Path, language: SourceLanguage) -> Result<Vec<PathBuf>, SetupError> {
    if !dir.exists() {
        return Err(SetupError::MissingFixtureDir(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(SetupError::NotADirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| SetupError::ReadFixtureDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SetupError::ReadFixtureDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') || path.is_dir() {
            continue;
        }
        if language.matches(&path) {
            files.push(path);
        }
    }

    files.sort();
    tracing::debug!(count = files.len(), "discovered fixture files");
    Ok(files)
}

/// Upstream fixtures for `language` that are absent from `dir`.
pub fn missing_upstream_fixtures(dir: &Path, language: SourceLanguage) -> Vec<&'static UpstreamFixture> {
    UPSTREAM_FIXTURES
        .iter()
        .filter(|f| SourceLanguage::from_path(Path::new(f.path)) == Some(language))
        .filter(|f| !dir.join(f.file_name()).is_file())
        .collect()
}
