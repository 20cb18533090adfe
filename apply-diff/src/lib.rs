//! Tolerant parsing of diff-like clipboard text and application of the
//! result against a text document.
//!
//! Input is not one grammar but a family of loosely-specified dialects:
//! GitHub `suggestion` blocks, fenced diff blocks, unified hunks, and bare
//! `+`/`-` line lists. [`parse`] recognizes them best-effort and never
//! fails — unrecognized input is an empty [`ParsedDiff`], and the explicit
//! recovery path ([`parse_with_prompt`]) cleans markers and retries with
//! the caller's consent.
//!
//! Application is offset-safe and fuzzy: hunks whose recorded old content
//! drifted in whitespace still apply (with indentation reconciled to the
//! document), stale hunks are skipped and reported as [`Failure`] data, and
//! [`build_preview`] projects the patched text without mutating anything.

mod apply;
mod document;
mod hunk;
mod parser;
mod preview;

pub use apply::apply;
pub use apply::validate;
pub use document::DocumentError;
pub use document::TextDocument;
pub use hunk::Failure;
pub use hunk::Hunk;
pub use hunk::ParsedDiff;
pub use hunk::Target;
pub use parser::clean_markers;
pub use parser::parse;
pub use parser::parse_cleaned;
pub use parser::parse_with_prompt;
pub use preview::Preview;
pub use preview::build_preview;
