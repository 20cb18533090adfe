//! Builds a non-mutating projection of "document after patch": the same
//! edit set as the applier, replayed against a scratch copy of the text in
//! descending start-offset order so that replacing a later region never
//! invalidates the stored offsets of an earlier, not-yet-applied one.

use crate::apply::compute_edits;
use crate::apply::sort_for_application;
use crate::apply::validate;
use crate::document::DocumentError;
use crate::document::TextDocument;
use crate::hunk::Failure;
use crate::hunk::ParsedDiff;

/// The projected post-patch text plus the per-hunk validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub patched_text: String,
    pub failures: Vec<Failure>,
}

/// Compute the patched text without touching the document. Failures are
/// collected exactly as [`validate`] does (skipped entirely under `force`);
/// a hunk that fails validation contributes no edit, consistent with the
/// applier skipping it.
pub fn build_preview(
    doc: &TextDocument,
    diff: &ParsedDiff,
    force: bool,
    active_range: Option<(usize, usize)>,
) -> Result<Preview, DocumentError> {
    let active = active_range.unwrap_or_else(|| doc.whole_range());
    let failures = if force {
        Vec::new()
    } else {
        validate(doc, diff)
    };

    let mut edits = compute_edits(doc, diff, force, active)?;
    sort_for_application(&mut edits);

    let mut patched = doc.text().to_string();
    for edit in &edits {
        if patched.get(edit.start..edit.end).is_none() {
            return Err(DocumentError {
                start: edit.start,
                end: edit.end,
            });
        }
        patched.replace_range(edit.start..edit.end, &edit.replacement);
    }

    Ok(Preview {
        patched_text: patched,
        failures,
    })
}
