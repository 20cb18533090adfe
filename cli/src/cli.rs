use std::path::PathBuf;

use clap::Parser;

/// Apply a pasted diff, patch, or suggestion block to a file.
///
/// The diff text is read from stdin by default. Recognized dialects:
/// fenced ```diff blocks, GitHub ```suggestion blocks, unified hunks
/// (with or without fences), and bare +/- line lists.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// File the diff is applied to.
    pub file: PathBuf,

    /// Read the diff text from a file instead of stdin.
    #[arg(long = "diff-file", value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Apply hunks unconditionally, bypassing old-content validation.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Print the preview diff and any skipped hunks, then exit without
    /// writing.
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Apply without asking for confirmation. Required to apply when no
    /// terminal is available for the prompt.
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,

    /// Answer "yes" to the auto-clean retry offered when the first parse
    /// recognizes nothing.
    #[arg(long, default_value_t = false)]
    pub clean: bool,
}
