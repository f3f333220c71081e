use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a merged-view query.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The path never appeared in the diagnostic log.
    #[error("{path:?} not found in the diagnostic index")]
    NotFound { path: String },

    /// The source file could not be read (deleted, permissions changed, ...).
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ViewError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewError::NotFound { .. })
    }
}

/// Failure loading the TOML settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid highlight pattern {pattern:?} for tag {tag:?}: {source}")]
    Pattern {
        tag: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
