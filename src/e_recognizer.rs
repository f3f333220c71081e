//! Recognition of `path:line[:column]: message` diagnostic lines.
//!
//! ```text
//! C:\work\abc.go:688: cannot inline (*T).Close: function too complex
//! ./abc.go:688:12: leaking param: p
//! ```
//!
//! Anything that does not follow that shape is noise and gets skipped.

use std::borrow::Cow;
use std::ops::Range;

use crate::e_scanner::index_byte_at;

/// Path the Go toolchain reports for compiler-synthesized code.
pub const AUTOGENERATED: &str = "<autogenerated>";

/// How file paths are normalized before they are used as index keys.
///
/// The policy is picked once when the index is built and used again for every lookup,
/// so lookups agree with the keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// Paths are compared byte for byte.
    #[default]
    Preserve,
    /// Paths are lower-cased, for case-insensitive filesystems.
    FoldCase,
}

impl PathPolicy {
    /// Folds case on Windows, preserves it everywhere else.
    pub fn host() -> Self {
        if cfg!(windows) {
            PathPolicy::FoldCase
        } else {
            PathPolicy::Preserve
        }
    }

    pub fn normalize<'a>(&self, path: Cow<'a, str>) -> Cow<'a, str> {
        match self {
            PathPolicy::Preserve => path,
            PathPolicy::FoldCase => {
                if path.chars().any(char::is_uppercase) {
                    Cow::Owned(path.to_lowercase())
                } else {
                    path
                }
            }
        }
    }
}

/// A recognized diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<'a> {
    /// Normalized path, borrowed from the log when no rewriting was needed.
    pub path: Cow<'a, str>,
    /// Line number, `0` when the number could not be parsed.
    pub line: usize,
    /// Message text as absolute offsets into the log buffer.
    pub message: Range<usize>,
}

/// Outcome of classifying one physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Diagnostic(Diagnostic<'a>),
    /// Points at [`AUTOGENERATED`] code, there is no file to show.
    Autogenerated,
    Noise,
}

/// Classifies the line `data[line]`.
///
/// `line` is the range produced by [`crate::e_scanner::line_ranges`]; the returned
/// message range is expressed in the same coordinates, so it can be sliced out of
/// `data` later without copying anything now.
///
/// # Example
/// ```
/// use diag_e::e_recognizer::{recognize, LineKind, PathPolicy};
///
/// let data = b"./x.go:3:7: inlining call to f";
/// match recognize(data, 0..data.len(), PathPolicy::Preserve) {
///     LineKind::Diagnostic(d) => {
///         assert_eq!(d.path, "./x.go");
///         assert_eq!(d.line, 3);
///         assert_eq!(&data[d.message], b"inlining call to f");
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn recognize(data: &[u8], line: Range<usize>, policy: PathPolicy) -> LineKind<'_> {
    let start = line.start;
    let text = &data[line];
    if text.len() <= 2 || text[0] == b'\t' {
        return LineKind::Noise;
    }

    // Skip the first two bytes so a drive letter (`C:`) is not taken for the separator.
    let Some(path_end) = index_byte_at(text, 2, b':') else {
        return LineKind::Noise;
    };
    let Some(number_end) = index_byte_at(text, path_end + 1, b':') else {
        return LineKind::Noise;
    };
    let Some(space) = index_byte_at(text, number_end + 1, b' ') else {
        return LineKind::Noise;
    };

    let path = policy.normalize(String::from_utf8_lossy(&text[..path_end]));
    if path == AUTOGENERATED {
        return LineKind::Autogenerated;
    }

    LineKind::Diagnostic(Diagnostic {
        path,
        line: parse_line_number(&text[path_end + 1..number_end]),
        message: start + space + 1..start + text.len(),
    })
}

fn parse_line_number(digits: &[u8]) -> usize {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(line: &str) -> Option<(String, usize, String)> {
        let data = line.as_bytes();
        match recognize(data, 0..data.len(), PathPolicy::Preserve) {
            LineKind::Diagnostic(d) => Some((
                d.path.into_owned(),
                d.line,
                String::from_utf8_lossy(&data[d.message]).into_owned(),
            )),
            _ => None,
        }
    }

    #[test]
    fn test_line_without_column() {
        assert_eq!(
            diagnostic("/a/b.go:3: cannot inline foo"),
            Some(("/a/b.go".into(), 3, "cannot inline foo".into()))
        );
    }

    #[test]
    fn test_column_is_ignored() {
        assert_eq!(
            diagnostic("./abc.go:688:123: leaking param: p"),
            Some(("./abc.go".into(), 688, "leaking param: p".into()))
        );
    }

    #[test]
    fn test_drive_letter_is_not_a_separator() {
        assert_eq!(
            diagnostic(r"C:\Go\src\abc.go:688: cannot inline x"),
            Some((r"C:\Go\src\abc.go".into(), 688, "cannot inline x".into()))
        );
    }

    #[test]
    fn test_short_and_tab_lines_are_noise() {
        assert_eq!(diagnostic(""), None);
        assert_eq!(diagnostic("a:"), None);
        assert_eq!(diagnostic("ab"), None);
        assert_eq!(diagnostic("\t/a/b.go:3: cannot inline foo"), None);
    }

    #[test]
    fn test_missing_separators_are_noise() {
        assert_eq!(diagnostic("# example.com/pkg"), None);
        assert_eq!(diagnostic("/a/b.go:3 cannot inline"), None);
        assert_eq!(diagnostic("/a/b.go:3:nospace"), None);
    }

    #[test]
    fn test_empty_message_after_space() {
        assert_eq!(
            diagnostic("/a/b.go:3: "),
            Some(("/a/b.go".into(), 3, String::new()))
        );
    }

    #[test]
    fn test_bad_line_number_becomes_zero() {
        assert_eq!(
            diagnostic("/a/b.go:x3: odd"),
            Some(("/a/b.go".into(), 0, "odd".into()))
        );
        assert_eq!(
            diagnostic("/a/b.go:-3: odd"),
            Some(("/a/b.go".into(), 0, "odd".into()))
        );
    }

    #[test]
    fn test_autogenerated_is_reported_separately() {
        let data = b"<autogenerated>:1: inlining call to runtime.f";
        assert_eq!(
            recognize(data, 0..data.len(), PathPolicy::Preserve),
            LineKind::Autogenerated
        );
        let data = b"<AutoGenerated>:1: inlining call to runtime.f";
        assert_eq!(
            recognize(data, 0..data.len(), PathPolicy::FoldCase),
            LineKind::Autogenerated
        );
    }

    #[test]
    fn test_message_range_is_absolute() {
        let data = b"noise\n/a/b.go:3: hello\n";
        let line = 6..data.len() - 1;
        match recognize(data, line, PathPolicy::Preserve) {
            LineKind::Diagnostic(d) => {
                assert_eq!(d.message, 17..22);
                assert_eq!(&data[d.message], b"hello");
            }
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_case_lowercases_key() {
        let data = br"C:\Go\Src\ABC.go:1: x y";
        match recognize(data, 0..data.len(), PathPolicy::FoldCase) {
            LineKind::Diagnostic(d) => assert_eq!(d.path, r"c:\go\src\abc.go"),
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_preserve_borrows_path() {
        let data = b"/a/b.go:1: x";
        match recognize(data, 0..data.len(), PathPolicy::Preserve) {
            LineKind::Diagnostic(d) => assert!(matches!(d.path, Cow::Borrowed(_))),
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }
}
