mod cli;

use std::fs;
use std::io::IsTerminal;
use std::io::Read;
use std::io::Write;

use anyhow::Context;
pub use cli::Cli;
use clipdiff_apply_diff::Preview;
use clipdiff_apply_diff::TextDocument;
use clipdiff_apply_diff::apply;
use clipdiff_apply_diff::build_preview;
use clipdiff_apply_diff::parse_with_prompt;
use similar::TextDiff;
use tracing::debug;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run_main(cli: Cli) -> anyhow::Result<()> {
    let default_level = "error";
    #[allow(clippy::unwrap_used)]
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Cli {
        file,
        diff_file,
        force,
        dry_run,
        yes,
        clean,
    } = cli;

    let raw = match &diff_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read diff text from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read diff text from stdin")?;
            buf
        }
    };
    let raw = raw.trim().to_string();
    if raw.is_empty() {
        eprintln!("No diff text supplied.");
        std::process::exit(1);
    }

    // The prompt channel is stdin, so prompting is only possible when the
    // diff came from elsewhere and stdin is a terminal.
    let interactive = diff_file.is_some() && std::io::stdin().is_terminal();

    let diff = parse_with_prompt(&raw, || {
        if clean {
            return true;
        }
        interactive
            && ask_yes_no(
                "Couldn't parse that diff. Try auto-cleaning the pasted text \
                 (strip ``` fences and leading + / - markers) and retry?",
            )
    });
    if diff.is_empty() {
        eprintln!("No recognizable diff or suggestion found.");
        std::process::exit(1);
    }
    debug!(
        hunks = diff.hunks.len(),
        suggestion = diff.suggestion.is_some(),
        "parsed diff"
    );

    let original = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut doc = TextDocument::new(original);

    let preview = build_preview(&doc, &diff, force, None)?;
    let mut stdout = std::io::stdout().lock();
    print_preview(&mut stdout, doc.text(), &preview)?;

    for failure in &preview.failures {
        eprintln!(
            "hunk {}: {} (skipped; pass --force to apply it anyway)",
            failure.hunk_index + 1,
            failure.reason
        );
    }

    if dry_run {
        return Ok(());
    }
    if preview.patched_text == doc.text() {
        writeln!(stdout, "Nothing to apply.")?;
        return Ok(());
    }

    if !yes {
        if !interactive {
            eprintln!("stdin is not a terminal; pass --yes to apply or --dry-run to preview.");
            std::process::exit(1);
        }
        if !ask_yes_no("Apply these changes?") {
            writeln!(stdout, "Aborted.")?;
            return Ok(());
        }
    }

    apply(&mut doc, &diff, force, None)?;
    fs::write(&file, doc.text())
        .with_context(|| format!("failed to write {}", file.display()))?;
    info!(file = %file.display(), "applied");
    writeln!(stdout, "Applied to {}.", file.display())?;
    Ok(())
}

fn print_preview(
    out: &mut impl Write,
    original: &str,
    preview: &Preview,
) -> std::io::Result<()> {
    let text_diff = TextDiff::from_lines(original, preview.patched_text.as_str());
    let unified = text_diff.unified_diff().context_radius(3).to_string();
    if unified.is_empty() {
        writeln!(out, "No changes.")?;
    } else {
        write!(out, "{unified}")?;
    }
    Ok(())
}

fn ask_yes_no(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
