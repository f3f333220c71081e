//! Merging indexed annotations with the current contents of a source file.
//!
//! Annotations are attached purely by line number. If the file gained or lost lines
//! after the log was produced, messages land on whatever line now carries that
//! number.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::e_error::ViewError;
use crate::e_index::{Annotation, AnnotationIndex, FileAnnotations};
use crate::e_scanner::line_ranges;

/// One physical line of the current file and the messages logged for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedLine<'a> {
    pub number: usize,
    pub content: String,
    pub info: Vec<Cow<'a, str>>,
}

/// A source file with its annotations, line by line.
///
/// Messages borrow from the index; nothing here is kept after the view is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedView<'a> {
    pub path: &'a str,
    #[serde(rename = "absPath", serialize_with = "serialize_lossy")]
    pub abs_path: &'a Path,
    pub lines: Vec<MergedLine<'a>>,
}

/// Paths that are not valid UTF-8 are written with replacement characters.
fn serialize_lossy<S: Serializer>(path: &&Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

impl MergedView<'_> {
    /// Number of messages across all lines.
    pub fn annotation_count(&self) -> usize {
        self.lines.iter().map(|line| line.info.len()).sum()
    }
}

impl AnnotationIndex {
    /// Reads the current contents of `path` and attaches its annotations.
    ///
    /// Fails with [`ViewError::NotFound`] when the log never mentioned `path`, and with
    /// [`ViewError::Io`] when the file can no longer be read.
    pub fn merged_view(&self, path: &str) -> Result<MergedView<'_>, ViewError> {
        let file = self.get(path).ok_or_else(|| ViewError::NotFound {
            path: path.to_string(),
        })?;
        let source = fs::read(file.abs_path()).map_err(|source| ViewError::Io {
            path: file.abs_path().to_path_buf(),
            source,
        })?;
        Ok(self.merge(file, &source))
    }

    /// Attaches the annotations of `file` to the lines of `source`.
    pub fn merge<'a>(&'a self, file: &'a FileAnnotations, source: &[u8]) -> MergedView<'a> {
        MergedView {
            path: file.path(),
            abs_path: file.abs_path(),
            lines: merge_lines(source, file.annotations(), |a| self.message(a)),
        }
    }
}

/// Two-pointer walk over the source lines and the sorted annotations.
fn merge_lines<'a>(
    source: &[u8],
    annotations: &'a [Annotation],
    message: impl Fn(&'a Annotation) -> Cow<'a, str>,
) -> Vec<MergedLine<'a>> {
    let mut cursor = 0;
    line_ranges(source)
        .enumerate()
        .map(|(i, range)| {
            let number = i + 1;
            while cursor < annotations.len() && annotations[cursor].line < number {
                cursor += 1;
            }
            let mut info = Vec::new();
            while cursor < annotations.len() && annotations[cursor].line == number {
                info.push(message(&annotations[cursor]));
                cursor += 1;
            }
            MergedLine {
                number,
                content: String::from_utf8_lossy(&source[range]).into_owned(),
                info,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e_index::IndexOptions;
    use crate::e_recognizer::PathPolicy;
    use std::fs;
    use tempfile::TempDir;

    const FIVE_LINES: &str = "package a\n\nfunc foo() {}\n\nfunc bar() { foo() }\n";

    fn index_in(dir: &Path, log: &str) -> AnnotationIndex {
        AnnotationIndex::build(
            log.as_bytes().to_vec(),
            IndexOptions::new(dir).with_path_policy(PathPolicy::Preserve),
        )
    }

    #[test]
    fn test_single_annotation_lands_on_its_line() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("b.go");
        fs::write(&file, FIVE_LINES).unwrap();
        let log = format!("{}:3: cannot inline foo\n", file.display());
        let index = index_in(temp_dir.path(), &log);

        let view = index.merged_view(&file.display().to_string()).unwrap();
        assert_eq!(view.lines.len(), 5);
        assert_eq!(
            view.lines[2],
            MergedLine {
                number: 3,
                content: "func foo() {}".to_string(),
                info: vec!["cannot inline foo".into()],
            }
        );
        for line in view.lines.iter().filter(|l| l.number != 3) {
            assert!(line.info.is_empty(), "line {} has info", line.number);
        }
        assert_eq!(view.annotation_count(), 1);
    }

    #[test]
    fn test_duplicate_line_numbers_collect_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.go"), FIVE_LINES).unwrap();
        let index = index_in(
            temp_dir.path(),
            "a.go:5:14: inlining call to foo\na.go:5:6: can inline bar\na.go:1: x\n",
        );
        let view = index.merged_view("a.go").unwrap();
        assert_eq!(view.lines[0].info, vec!["x"]);
        assert_eq!(
            view.lines[4].info,
            vec!["inlining call to foo", "can inline bar"]
        );
    }

    #[test]
    fn test_relative_path_reads_from_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("pkg")).unwrap();
        fs::write(temp_dir.path().join("pkg/a.go"), "one\ntwo").unwrap();
        let index = index_in(temp_dir.path(), "./pkg/a.go:2: leaking param: p\n");
        let view = index.merged_view("./pkg/a.go").unwrap();
        assert_eq!(view.abs_path, temp_dir.path().join("pkg/a.go"));
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[1].content, "two");
        assert_eq!(view.lines[1].info, vec!["leaking param: p"]);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let index = index_in(temp_dir.path(), "a.go:1: x\n");
        let err = index.merged_view("/never/seen.go").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let index = index_in(temp_dir.path(), "gone.go:1: x\n");
        match index.merged_view("gone.go") {
            Err(ViewError::Io { path, .. }) => assert_eq!(path, temp_dir.path().join("gone.go")),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_annotations_past_the_end_and_line_zero_are_dropped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.go"), "a\nb\n").unwrap();
        let index = index_in(temp_dir.path(), "a.go:x: zero\na.go:2: two\na.go:40: far\n");
        let view = index.merged_view("a.go").unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.annotation_count(), 1);
        assert_eq!(view.lines[1].info, vec!["two"]);
    }

    #[test]
    fn test_empty_file_has_no_lines() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.go"), "").unwrap();
        let index = index_in(temp_dir.path(), "a.go:1: x\n");
        assert!(index.merged_view("a.go").unwrap().lines.is_empty());
    }

    #[test]
    fn test_repeated_views_are_identical() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.go"), FIVE_LINES).unwrap();
        let index = index_in(temp_dir.path(), "a.go:3: x\na.go:3: y\n");
        let first = index.merged_view("a.go").unwrap();
        let second = index.merged_view("a.go").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_view_follows_current_file_not_the_logged_one() {
        // Lines inserted after logging shift the code but not the messages.
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.go");
        fs::write(&file, FIVE_LINES).unwrap();
        let index = index_in(temp_dir.path(), "a.go:3: cannot inline foo\n");
        fs::write(&file, format!("// new header\n{}", FIVE_LINES)).unwrap();

        let view = index.merged_view("a.go").unwrap();
        assert_eq!(view.lines.len(), 6);
        assert_eq!(view.lines[2].content, "");
        assert_eq!(view.lines[2].info, vec!["cannot inline foo"]);
        assert!(view.lines[3].info.is_empty());
    }

    #[test]
    fn test_serialized_schema() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.go"), "x := 1\n").unwrap();
        let index = index_in(temp_dir.path(), "a.go:1: moved to heap: x\n");
        let view = index.merged_view("a.go").unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["path"], "a.go");
        assert_eq!(
            json["absPath"],
            temp_dir.path().join("a.go").display().to_string()
        );
        assert_eq!(
            json["lines"],
            serde_json::json!([
                { "number": 1, "content": "x := 1", "info": ["moved to heap: x"] }
            ])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_base_dir_still_serializes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join(OsStr::from_bytes(b"src\xff"));
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("a.go"), "p := new(T)\n").unwrap();
        let index = index_in(&base, "a.go:1: escapes to heap\n");

        let view = index.merged_view("a.go").unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json["absPath"],
            base.join("a.go").to_string_lossy().into_owned()
        );
        assert!(json["absPath"].as_str().unwrap().contains('\u{FFFD}'));
        assert_eq!(json["lines"][0]["info"][0], "escapes to heap");
    }

    #[test]
    fn test_merge_lines_without_annotations() {
        let lines = merge_lines(b"a\nb\nc", &[], |_| Cow::Borrowed(""));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.info.is_empty()));
        assert_eq!(lines[2].number, 3);
    }
}
