//! The annotation index: every file named in a diagnostic log, with its messages.
//!
//! The index owns the raw log. Messages are kept as byte ranges into it and only
//! turned into text when a view asks for them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::e_recognizer::{recognize, LineKind, PathPolicy};
use crate::e_scanner::line_ranges;

/// One diagnostic message attached to a line of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub line: usize,
    /// Message text, as offsets into the log buffer.
    pub message: Range<usize>,
}

impl Annotation {
    fn sort_key(&self) -> (usize, usize, usize) {
        (self.line, self.message.start, self.message.end)
    }
}

/// A file referenced by the log and the annotations that point into it.
#[derive(Debug, Clone)]
pub struct FileAnnotations {
    path: String,
    abs_path: PathBuf,
    annotations: Vec<Annotation>,
}

impl FileAnnotations {
    fn new(base_dir: &Path, path: String) -> Self {
        let abs_path = resolve_path(base_dir, &path);
        FileAnnotations {
            path,
            abs_path,
            annotations: Vec::new(),
        }
    }

    /// Path as written in the log, after normalization.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Annotations sorted by line number, then by position in the log.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Settings fixed for the lifetime of an index.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Directory relative paths from the log are resolved against.
    pub base_dir: PathBuf,
    pub path_policy: PathPolicy,
}

impl IndexOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        IndexOptions {
            base_dir: base_dir.into(),
            path_policy: PathPolicy::host(),
        }
    }

    pub fn with_path_policy(mut self, path_policy: PathPolicy) -> Self {
        self.path_policy = path_policy;
        self
    }
}

/// Counters collected while the index is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Physical lines scanned.
    pub lines: usize,
    /// Lines recognized as diagnostics and indexed.
    pub diagnostics: usize,
    /// Lines that did not look like diagnostics.
    pub noise: usize,
    /// Diagnostics about compiler-generated code, skipped.
    pub autogenerated: usize,
    /// Indexed diagnostics whose line number did not parse.
    pub unnumbered: usize,
    /// Distinct files.
    pub files: usize,
}

/// Immutable index from normalized path to [`FileAnnotations`].
///
/// Built in one pass by [`AnnotationIndex::build`]; there is no way to change it
/// afterwards, so it can be shared freely between threads.
#[derive(Debug)]
pub struct AnnotationIndex {
    data: Vec<u8>,
    options: IndexOptions,
    files: BTreeMap<String, FileAnnotations>,
    stats: IndexStats,
}

impl AnnotationIndex {
    /// Scans `data` and indexes every diagnostic line in it.
    pub fn build(data: Vec<u8>, options: IndexOptions) -> Self {
        let mut files: BTreeMap<String, FileAnnotations> = BTreeMap::new();
        let mut stats = IndexStats::default();

        for line in line_ranges(&data) {
            stats.lines += 1;
            let diagnostic = match recognize(&data, line.clone(), options.path_policy) {
                LineKind::Diagnostic(diagnostic) => diagnostic,
                LineKind::Autogenerated => {
                    stats.autogenerated += 1;
                    continue;
                }
                LineKind::Noise => {
                    log::trace!("skipping {:?}", String::from_utf8_lossy(&data[line]));
                    stats.noise += 1;
                    continue;
                }
            };

            stats.diagnostics += 1;
            if diagnostic.line == 0 {
                stats.unnumbered += 1;
            }
            let annotation = Annotation {
                line: diagnostic.line,
                message: diagnostic.message,
            };
            match files.get_mut(diagnostic.path.as_ref()) {
                Some(file) => file.annotations.push(annotation),
                None => {
                    let path = diagnostic.path.into_owned();
                    let mut file = FileAnnotations::new(&options.base_dir, path.clone());
                    file.annotations.push(annotation);
                    files.insert(path, file);
                }
            }
        }

        for file in files.values_mut() {
            file.annotations.sort_by_key(Annotation::sort_key);
        }
        stats.files = files.len();

        log::debug!(
            "indexed {} diagnostics in {} files ({} lines, {} noise, {} autogenerated)",
            stats.diagnostics,
            stats.files,
            stats.lines,
            stats.noise,
            stats.autogenerated
        );

        AnnotationIndex {
            data,
            options,
            files,
            stats,
        }
    }

    /// Reads the whole log from `reader` (usually stdin) and indexes it.
    pub fn from_reader<R: Read>(mut reader: R, options: IndexOptions) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::build(data, options))
    }

    pub fn from_path(path: &Path, options: IndexOptions) -> io::Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::build(data, options))
    }

    /// Indexed files, ordered by normalized path.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &FileAnnotations> + '_ {
        self.files.values()
    }

    /// Looks up a file, normalizing `path` the same way the keys were.
    pub fn get(&self, path: &str) -> Option<&FileAnnotations> {
        let key = self.options.path_policy.normalize(Cow::Borrowed(path));
        self.files.get(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// The raw log the index was built from.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn message_bytes(&self, annotation: &Annotation) -> &[u8] {
        &self.data[annotation.message.clone()]
    }

    /// Message text; borrowed unless the log holds invalid UTF-8 there.
    pub fn message(&self, annotation: &Annotation) -> Cow<'_, str> {
        String::from_utf8_lossy(self.message_bytes(annotation))
    }
}

/// Absolute paths are kept as they are; relative ones are joined onto `base_dir`
/// with `.` dropped and `..` taking off the previous component.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let mut resolved = base_dir.to_path_buf();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}
