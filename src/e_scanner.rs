use std::iter::FusedIterator;
use std::ops::Range;

/// Returns an iterator over the physical lines of `data` as byte ranges.
///
/// Each range excludes its terminating `\n`. The last line does not need a
/// terminator, and a trailing `\n` does not produce an extra empty line.
///
/// # Example
/// ```
/// use diag_e::e_scanner::line_ranges;
///
/// let data = b"first\nsecond\n\nlast";
/// let lines: Vec<_> = line_ranges(data).map(|r| &data[r]).collect();
/// assert_eq!(lines, vec![&b"first"[..], b"second", b"", b"last"]);
/// ```
pub fn line_ranges(data: &[u8]) -> LineRanges<'_> {
    LineRanges { data, pos: 0 }
}

/// Lazy, restartable (`Clone`) scanner over the lines of a byte buffer.
#[derive(Clone, Debug)]
pub struct LineRanges<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Iterator for LineRanges<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        let end = index_byte_at(self.data, start, b'\n').unwrap_or(self.data.len());
        self.pos = end + 1;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().saturating_sub(self.pos);
        if remaining == 0 {
            (0, Some(0))
        } else {
            (1, Some(remaining))
        }
    }
}

impl FusedIterator for LineRanges<'_> {}

/// Position of the first `needle` in `data` at or after `at`, as an absolute offset.
pub(crate) fn index_byte_at(data: &[u8], at: usize, needle: u8) -> Option<usize> {
    data.get(at..)?
        .iter()
        .position(|&b| b == needle)
        .map(|offset| offset + at)
}
