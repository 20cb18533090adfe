//! An addressable, line-indexable text buffer — the only document surface
//! the core depends on. Line endings are normalized to `\n` on construction,
//! matching the convention of the parser's output.

use thiserror::Error;

/// Byte offsets that are out of bounds, inverted, or off a char boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("range [{start}, {end}) is not a valid UTF-8 boundary range for this document")]
pub struct DocumentError {
    pub start: usize,
    pub end: usize,
}

/// A mutable text buffer with a maintained line-start index. Lines are
/// counted the way editors count them: one more line than there are `\n`
/// characters, so a trailing newline yields a final empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let line_starts = compute_line_starts(&text);
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the start of the 0-based `line`. Lines at or past the
    /// end of the document resolve to the end offset.
    pub fn line_start_offset(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.text.len())
    }

    /// Byte offset of the end of the 0-based `line`, excluding its `\n`.
    pub fn line_end_offset(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next_start) => next_start - 1,
            None => self.text.len(),
        }
    }

    /// Text of the byte range `[start, end)`; empty when the range is not a
    /// valid boundary range.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.text.get(start..end).unwrap_or_default()
    }

    /// Replace the byte range `[start, end)` with `replacement` and rebuild
    /// the line index. The one fallible operation of the document: offsets
    /// supplied by a caller (an active range) may be invalid.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> Result<(), DocumentError> {
        if start > end || self.text.get(start..end).is_none() {
            return Err(DocumentError { start, end });
        }
        self.text.replace_range(start..end, replacement);
        self.line_starts = compute_line_starts(&self.text);
        Ok(())
    }

    /// `(0, len)` — the default active range when the caller supplies none.
    pub fn whole_range(&self) -> (usize, usize) {
        (0, self.text.len())
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}
