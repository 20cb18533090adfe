//! The structured, format-agnostic representation of a parsed change.

/// Where a hunk's replacement should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 1-based line number in the *new* document where the change begins.
    Line(u32),
    /// The hunk carries no intrinsic location; it resolves against whatever
    /// range the caller designates as active (selection or caret).
    ActiveRange,
}

/// A single localized change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub target: Target,

    /// Number of document lines expected to be replaced. `old_count` governs
    /// range computation; `old_lines` governs content validation, and the
    /// two need not agree in length.
    pub old_count: usize,

    /// Replacement lines. May be empty (pure deletion).
    pub new_lines: Vec<String>,

    /// Lines the hunk's author believed were being replaced. Used only for
    /// validation and fuzzy matching, never for producing output text.
    pub old_lines: Vec<String>,
}

/// The output of a parse attempt: hunks in textual appearance order, plus an
/// optional whole-block replacement from the first `suggestion` fence. Both
/// may be present; each applies against its own target range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    pub hunks: Vec<Hunk>,
    pub suggestion: Option<String>,
}

impl ParsedDiff {
    /// The first-class "nothing recognized" terminal state.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty() && self.suggestion.is_none()
    }
}

/// A hunk whose recorded old content no longer matches the document.
/// Purely informational; produced by validation, never thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub hunk_index: usize,
    pub reason: String,
}
