//! Settings file support.
//!
//! Values come from built-in defaults, then `diag-e.toml`, then command-line flags.
//!
//! ```toml
//! base_dir = "/home/me/src/project"
//! fold_case = "auto"
//! jobs = 4
//!
//! [[highlight]]
//! tag = "bounds-check"
//! pattern = "Found IsInBounds"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;

use crate::e_error::ConfigError;
use crate::e_recognizer::PathPolicy;

/// Looked up in the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "diag-e.toml";

/// When file paths are lower-cased before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FoldCase {
    /// Only on platforms with case-insensitive filesystems.
    #[default]
    Auto,
    Always,
    Never,
}

impl FoldCase {
    pub fn policy(self) -> PathPolicy {
        match self {
            FoldCase::Auto => PathPolicy::host(),
            FoldCase::Always => PathPolicy::FoldCase,
            FoldCase::Never => PathPolicy::Preserve,
        }
    }
}

/// Tags a line when one of its messages matches `pattern` (a regular expression).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HighlightRule {
    pub tag: String,
    pub pattern: String,
}

impl HighlightRule {
    pub fn new(tag: &str, pattern: &str) -> Self {
        HighlightRule {
            tag: tag.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// The rules the Go inlining/escape-analysis output is usually read with.
pub fn default_highlight_rules() -> Vec<HighlightRule> {
    vec![
        HighlightRule::new("cannot-inline", "cannot inline"),
        HighlightRule::new("inlining", "inlining call to"),
        HighlightRule::new("escapes-to-heap", "escapes to heap"),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub base_dir: Option<PathBuf>,
    pub fold_case: FoldCase,
    pub jobs: Option<usize>,
    /// Replaces the default rules when present.
    pub highlight: Option<Vec<HighlightRule>>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] in `dir` if it exists.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            log::debug!("using settings from {}", default_path.display());
            Self::load(&default_path)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn highlight_rules(&self) -> Vec<HighlightRule> {
        self.highlight
            .clone()
            .unwrap_or_else(default_highlight_rules)
    }
}
