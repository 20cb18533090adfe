//! Validates that each hunk's recorded old content still matches the
//! document and performs the actual replacement, tolerating whitespace
//! drift with decreasing strictness: loose equality first, then a relaxed
//! per-line match that reconciles indentation.

use crate::document::DocumentError;
use crate::document::TextDocument;
use crate::hunk::Failure;
use crate::hunk::Hunk;
use crate::hunk::ParsedDiff;
use crate::hunk::Target;

/// One concrete replacement, with offsets computed against the pre-mutation
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) replacement: String,
}

enum HunkMatch {
    /// Loose equality: newline-normalized, whole joined block trimmed of
    /// trailing whitespace.
    Strict,
    /// Same line count, lines equal after stripping leading whitespace.
    Relaxed,
    Mismatch,
}

/// Check every concrete-target hunk against the document. A [`Failure`] is
/// recorded exactly for the hunks the applier would skip: those matching
/// neither strictly nor relaxed. Active-range hunks are never validated
/// against document content.
pub fn validate(doc: &TextDocument, diff: &ParsedDiff) -> Vec<Failure> {
    let mut failures = Vec::new();
    for (idx, hunk) in diff.hunks.iter().enumerate() {
        let Target::Line(line) = hunk.target else {
            continue;
        };
        let (start, end) = line_range(doc, line, hunk.old_count);
        if matches!(match_hunk(doc.slice(start, end), hunk), HunkMatch::Mismatch) {
            failures.push(Failure {
                hunk_index: idx,
                reason: format!("old text does not match at +{line}"),
            });
        }
    }
    failures
}

/// Apply a parsed diff to the document. The suggestion block (if any) is
/// applied against the active range first, then each hunk in textual order.
/// With `force` all content checks are bypassed; otherwise non-matching
/// hunks are skipped silently (they are reported by [`validate`], not
/// here). `active_range` defaults to the whole document.
///
/// All edits are computed against the pre-mutation snapshot and applied in
/// descending start-offset order, so no replacement invalidates the offsets
/// of one not yet applied.
pub fn apply(
    doc: &mut TextDocument,
    diff: &ParsedDiff,
    force: bool,
    active_range: Option<(usize, usize)>,
) -> Result<(), DocumentError> {
    let active = active_range.unwrap_or_else(|| doc.whole_range());
    let mut edits = compute_edits(doc, diff, force, active)?;
    sort_for_application(&mut edits);
    for edit in &edits {
        doc.replace_range(edit.start, edit.end, &edit.replacement)?;
    }
    Ok(())
}

/// Build the edit set shared by [`apply`] and the previewer. Fails only when
/// the caller-supplied active range is not a valid boundary range.
pub(crate) fn compute_edits(
    doc: &TextDocument,
    diff: &ParsedDiff,
    force: bool,
    active: (usize, usize),
) -> Result<Vec<Edit>, DocumentError> {
    let (active_start, active_end) = active;
    if active_start > active_end || doc.text().get(active_start..active_end).is_none() {
        return Err(DocumentError {
            start: active_start,
            end: active_end,
        });
    }

    let mut edits = Vec::new();
    if let Some(suggestion) = &diff.suggestion {
        edits.push(Edit {
            start: active_start,
            end: active_end,
            replacement: suggestion.clone(),
        });
    }

    for hunk in &diff.hunks {
        match hunk.target {
            Target::ActiveRange => edits.push(Edit {
                start: active_start,
                end: active_end,
                replacement: hunk.new_lines.join("\n"),
            }),
            Target::Line(line) => {
                let (start, end) = line_range(doc, line, hunk.old_count);
                if force {
                    edits.push(Edit {
                        start,
                        end,
                        replacement: hunk.new_lines.join("\n"),
                    });
                    continue;
                }
                let doc_text = doc.slice(start, end);
                match match_hunk(doc_text, hunk) {
                    HunkMatch::Strict => edits.push(Edit {
                        start,
                        end,
                        replacement: hunk.new_lines.join("\n"),
                    }),
                    HunkMatch::Relaxed => {
                        let doc_lines: Vec<&str> = doc_text.split('\n').collect();
                        edits.push(Edit {
                            start,
                            end,
                            replacement: reindent(&doc_lines, &hunk.new_lines),
                        });
                    }
                    HunkMatch::Mismatch => {}
                }
            }
        }
    }
    // The unscoped unified scan re-finds hunks already collected from a
    // fence, so the same edit can arrive twice. It must land once: the
    // second copy would replace already-shifted text.
    let mut unique: Vec<Edit> = Vec::new();
    for edit in edits {
        if !unique.contains(&edit) {
            unique.push(edit);
        }
    }
    Ok(unique)
}

/// Descending start offset; stable, so edits sharing a start offset keep
/// their registration order (suggestion before active-range hunks).
pub(crate) fn sort_for_application(edits: &mut [Edit]) {
    edits.sort_by(|a, b| b.start.cmp(&a.start));
}

/// The document range spanning `count` lines starting at 1-based `line`,
/// clamped to document bounds. A zero count yields an empty range at the
/// start offset; a start past EOF degrades to an empty range at EOF.
fn line_range(doc: &TextDocument, line: u32, count: usize) -> (usize, usize) {
    let line_count = doc.line_count();
    let start_line = (line as usize).saturating_sub(1).min(line_count);
    let start_offset = doc.line_start_offset(start_line);
    let end_line = (start_line + count).min(line_count);
    if count == 0 || end_line <= start_line {
        return (start_offset, start_offset);
    }
    (start_offset, doc.line_end_offset(end_line - 1))
}

fn match_hunk(doc_text: &str, hunk: &Hunk) -> HunkMatch {
    if loose_equals(doc_text, &joined_old_lines(hunk)) {
        return HunkMatch::Strict;
    }
    let doc_lines: Vec<&str> = doc_text.split('\n').collect();
    let relaxed = doc_lines.len() == hunk.old_lines.len()
        && doc_lines
            .iter()
            .zip(&hunk.old_lines)
            .all(|(doc_line, old_line)| doc_line.trim_start() == old_line.trim_start());
    if relaxed {
        HunkMatch::Relaxed
    } else {
        HunkMatch::Mismatch
    }
}

/// Loose equality: line endings normalized, trailing whitespace trimmed
/// from the whole joined block (not per line — a known quirk, kept).
fn loose_equals(a: &str, b: &str) -> bool {
    a.replace("\r\n", "\n").trim_end() == b.replace("\r\n", "\n").trim_end()
}

fn joined_old_lines(hunk: &Hunk) -> String {
    let normalized: Vec<&str> = hunk
        .old_lines
        .iter()
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    normalized.join("\n")
}

/// Re-indent replacement lines with the document's original leading
/// whitespace at the same line index; surplus new lines keep their own
/// indentation.
fn reindent(doc_lines: &[&str], new_lines: &[String]) -> String {
    let reindented: Vec<String> = new_lines
        .iter()
        .enumerate()
        .map(|(idx, line)| match doc_lines.get(idx) {
            Some(doc_line) => {
                let indent_end = doc_line.len() - doc_line.trim_start().len();
                format!("{}{}", &doc_line[..indent_end], line.trim_start())
            }
            None => line.clone(),
        })
        .collect();
    reindented.join("\n")
}
