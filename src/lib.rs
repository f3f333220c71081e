#![doc = include_str!("../README.md")]

// Re-export the pieces most callers need
pub mod prelude {
    pub use crate::e_error::{ConfigError, ViewError};
    pub use crate::e_index::{Annotation, AnnotationIndex, FileAnnotations, IndexOptions};
    pub use crate::e_merge::{MergedLine, MergedView};
    pub use crate::e_recognizer::PathPolicy;
    pub use log::{debug, error, info, warn};
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}

pub mod e_scanner;
pub use e_scanner::line_ranges;
pub mod e_recognizer;
pub use e_recognizer::{recognize, Diagnostic, LineKind, PathPolicy};
pub mod e_index;
pub use e_index::{AnnotationIndex, IndexOptions, IndexStats};
pub mod e_merge;
pub use e_merge::{MergedLine, MergedView};
pub mod e_error;
pub use e_error::{ConfigError, ViewError};
pub mod e_batch;
pub mod e_cli;
pub use e_cli::Cli;
pub mod e_config;
pub mod e_features;
pub mod e_render;
