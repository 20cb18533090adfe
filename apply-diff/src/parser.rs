//! Converts raw clipboard-ish text into a [`ParsedDiff`] via an ordered
//! chain of format recognizers: GitHub `suggestion` block, fenced diff
//! blocks, unscoped unified hunks, and a raw `+`/`-` fallback.
//!
//! Parsing never fails: unrecognized input yields an empty [`ParsedDiff`],
//! which is a representable result rather than an error. The only recovery
//! mechanism is the explicit three-tier fallback in [`parse_with_prompt`].

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::hunk::Hunk;
use crate::hunk::ParsedDiff;
use crate::hunk::Target;

fn regex(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    let re = Regex::new(pattern).expect("hard-coded pattern compiles");
    re
}

/// `@@ -<oldStart>[,<oldCount>] +<newStart>[,<newCount>] @@`
static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^@@\s+-(\d+)(?:,(\d+))?\s+\+(\d+)(?:,(\d+))?\s+@@\s*$"));

/// A line that is entirely a fence marker, e.g. ```` ```diff ```` or `~~~`.
static FENCE_LINE: LazyLock<Regex> = LazyLock::new(|| regex(r"^\s*(```+|~~~+)\s*\w*\s*$"));

/// Opening fence with an optional language tag.
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| regex(r"^\s*(```+|~~~+)\s*(\S+)?.*$"));

/// Closing fence (no tag).
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| regex(r"^\s*(```+|~~~+)\s*$"));

/// Language tags that mark a fence as diff-bearing.
static DIFF_LANG: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(diff|patch|udiff|git-diff|unidiff)\b"));

/// Opening fence of a GitHub suggestion block.
static SUGGESTION_OPEN: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)^\s*```+\s*suggestion\b.*$"));

/// Noise lines inside unified diffs that are skipped without counting
/// toward the body cap.
static UNIFIED_NOISE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(diff --git|index\s|---\s|\+{3}\s|No newline at end of file)"));

/// Safety margin added to `old_count + new_count` when consuming a unified
/// hunk body, so malformed input cannot trigger runaway consumption.
const HUNK_BODY_SLACK: usize = 200;

/// Parse raw text into a [`ParsedDiff`]. Never fails; input in which no
/// dialect is recognized yields `ParsedDiff::default()`.
pub fn parse(raw: &str) -> ParsedDiff {
    if raw.trim().is_empty() {
        return ParsedDiff::default();
    }

    let text = normalize_newlines(raw);
    let lines: Vec<&str> = text.split('\n').collect();

    // Capture the first suggestion block (if any), but keep scanning for
    // diffs too: suggestion and hunk extraction are independent concerns.
    let suggestion = extract_first_suggestion(&lines);

    let fenced = extract_fenced_diff_hunks(&lines);

    // Unified hunks anywhere in the text, fenced or not, so that diffs
    // pasted without fences still work.
    let unified = parse_unified_hunks(&lines);

    // The raw +/- fallback only runs when nothing better was found.
    let fallback = if fenced.is_empty() && unified.is_empty() {
        parse_plus_minus(&lines)
    } else {
        Vec::new()
    };

    let mut hunks = fenced;
    hunks.extend(unified);
    hunks.extend(fallback);
    ParsedDiff { hunks, suggestion }
}

/// Tier-2 cleanup: drop lines that are entirely a fence marker and strip a
/// single leading `+`, `-`, or `>` from each remaining line while keeping
/// its indentation.
pub fn clean_markers(raw: &str) -> String {
    let normalized = normalize_newlines(raw);
    let cleaned: Vec<String> = normalized
        .split('\n')
        .filter(|line| !FENCE_LINE.is_match(line.trim()))
        .map(strip_leading_marker_keeping_indent)
        .collect();
    cleaned.join("\n").trim().to_string()
}

/// Tiers 2 and 3 of the fallback chain: clean the text and re-parse; if that
/// still finds nothing, salvage a single active-range hunk from the cleaned
/// text's `+`/`-` lines.
pub fn parse_cleaned(raw: &str) -> ParsedDiff {
    let cleaned = clean_markers(raw);
    let retry = parse(&cleaned);
    if !retry.is_empty() {
        return retry;
    }

    // The salvage is more permissive than the first-pass fallback: markers
    // count after any amount of indentation.
    let lines: Vec<&str> = cleaned.split('\n').map(str::trim_start).collect();
    ParsedDiff {
        hunks: parse_plus_minus(&lines),
        suggestion: None,
    }
}

/// Full three-tier parse: strict parse, then (with the caller's consent)
/// cleaned re-parse and raw salvage. `confirm` is invoked at most once, and
/// only when the strict parse found nothing usable.
pub fn parse_with_prompt(raw: &str, confirm: impl FnOnce() -> bool) -> ParsedDiff {
    let first = parse(raw);
    if !first.is_empty() {
        return first;
    }

    if !confirm() {
        return first;
    }

    parse_cleaned(raw)
}

/// Normalize line endings to `\n` and strip a leading byte-order marker.
fn normalize_newlines(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

fn strip_leading_marker_keeping_indent(line: &str) -> String {
    match line.find(|c: char| !c.is_whitespace()) {
        Some(idx) => {
            let rest = &line[idx..];
            if rest.starts_with('+') || rest.starts_with('-') || rest.starts_with('>') {
                format!("{}{}", &line[..idx], &rest[1..])
            } else {
                line.to_string()
            }
        }
        None => line.to_string(),
    }
}

fn extract_first_suggestion(lines: &[&str]) -> Option<String> {
    let mut i = 0;
    while i < lines.len() {
        if SUGGESTION_OPEN.is_match(lines[i].trim()) {
            let mut body: Vec<&str> = Vec::new();
            i += 1;
            while i < lines.len() {
                if FENCE_CLOSE.is_match(lines[i].trim()) {
                    break;
                }
                body.push(lines[i]);
                i += 1;
            }
            let text = body.join("\n").trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
            // Only the first suggestion block is honored, even when empty.
            return None;
        }
        i += 1;
    }
    None
}

/// Collect hunks from every diff-bearing fenced block. A fence is
/// diff-bearing when its language tag is blank or contains a diff-related
/// keyword; un-terminated fences run to EOF.
fn extract_fenced_diff_hunks(lines: &[&str]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(open) = FENCE_OPEN.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let lang = open.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        let is_diff_fence = lang.is_empty() || DIFF_LANG.is_match(lang);

        // Gather the body until a matching close fence or EOF.
        let mut body: Vec<&str> = Vec::new();
        i += 1;
        while i < lines.len() {
            if FENCE_CLOSE.is_match(lines[i].trim()) {
                i += 1; // consume the close fence
                break;
            }
            body.push(lines[i]);
            i += 1;
        }

        if is_diff_fence && !body.is_empty() {
            if body.iter().any(|line| HUNK_HEADER.is_match(line)) {
                hunks.extend(parse_unified_hunks(&body));
            } else {
                hunks.extend(parse_plus_minus(&body));
            }
        }
    }
    hunks
}

/// Parse unified hunks (`@@ -a,b +c,d @@` headers with `+`/`-`/context
/// bodies) from the given lines.
fn parse_unified_hunks(lines: &[&str]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(header) = HUNK_HEADER.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let new_start: u32 = capture_count(&header, 3).unwrap_or(1) as u32;
        let old_count = capture_count(&header, 2).unwrap_or(1);
        let new_count = capture_count(&header, 4).unwrap_or(1);
        i += 1;

        let mut plus: Vec<String> = Vec::new();
        let mut minus: Vec<String> = Vec::new();
        let mut seen = 0;

        // Consume the body until the next header, a close fence, or the
        // safety cap is hit.
        while i < lines.len() && seen < old_count + new_count + HUNK_BODY_SLACK {
            let line = lines[i];
            if line.starts_with("@@") {
                break;
            }
            if FENCE_CLOSE.is_match(line.trim()) {
                break;
            }
            if UNIFIED_NOISE.is_match(line) {
                i += 1;
                continue;
            }

            if let Some(added) = line.strip_prefix('+') {
                plus.push(added.to_string());
            } else if let Some(removed) = line.strip_prefix('-') {
                minus.push(removed.to_string());
            } else {
                // Context (leading space) and stray lines are dropped, but
                // still count toward the cap.
            }
            seen += 1;
            i += 1;
        }

        hunks.push(Hunk {
            target: Target::Line(new_start),
            old_count,
            new_lines: plus,
            old_lines: minus,
        });
    }
    hunks
}

/// Raw `+`/`-` fallback: a line contributes when its marker sits at column
/// zero or after a single leading space. Emits a single active-range hunk
/// when either list is non-empty. Deeper indentation is honored only by the
/// tier-3 salvage, which trims its lines before calling this.
fn parse_plus_minus(lines: &[&str]) -> Vec<Hunk> {
    let plus: Vec<String> = lines
        .iter()
        .filter_map(|line| fallback_marker(line, '+'))
        .map(str::to_string)
        .collect();
    let minus: Vec<String> = lines
        .iter()
        .filter_map(|line| fallback_marker(line, '-'))
        .map(str::to_string)
        .collect();

    if plus.is_empty() && minus.is_empty() {
        return Vec::new();
    }
    vec![Hunk {
        target: Target::ActiveRange,
        old_count: minus.len(),
        new_lines: plus,
        old_lines: minus,
    }]
}

fn fallback_marker(line: &str, marker: char) -> Option<&str> {
    let rest = line.strip_prefix(' ').unwrap_or(line);
    rest.strip_prefix(marker)
}

fn capture_count(captures: &regex_lite::Captures<'_>, group: usize) -> Option<usize> {
    captures
        .get(group)
        .and_then(|m| m.as_str().parse::<usize>().ok())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn strs(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_is_the_terminal_state() {
        assert!(parse("").is_empty());
        assert!(parse("   \n \t ").is_empty());
        assert!(parse("nothing that looks like a diff").is_empty());
    }

    #[test]
    fn test_unified_header_coordinates() {
        let diff = parse("@@ -3,2 +7,4 @@\n-a\n-b\n+c\n+d\n+e\n+f\n");
        assert_eq!(diff.hunks.len(), 1);
        let hunk = &diff.hunks[0];
        assert_eq!(hunk.target, Target::Line(7));
        assert_eq!(hunk.old_count, 2);
        assert_eq!(hunk.new_lines, strs(&["c", "d", "e", "f"]));
        assert_eq!(hunk.old_lines, strs(&["a", "b"]));
    }

    #[test]
    fn test_unified_header_counts_default_to_one() {
        let diff = parse("@@ -2 +5 @@\n-old\n+new\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::Line(5));
        assert_eq!(diff.hunks[0].old_count, 1);
    }

    #[test]
    fn test_unified_noise_lines_are_skipped() {
        let diff = parse(
            "diff --git a/x b/x\n\
             index 000..111 100644\n\
             --- a/x\n\
             +++ b/x\n\
             @@ -1,1 +1,1 @@\n\
             -old\n\
             +new\n\
             No newline at end of file\n",
        );
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["new"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["old"]));
    }

    #[test]
    fn test_context_lines_are_dropped() {
        let diff = parse("@@ -1,3 +1,3 @@\n context\n-old\n+new\n trailing context\n");
        assert_eq!(diff.hunks[0].new_lines, strs(&["new"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["old"]));
    }

    #[test]
    fn test_multiple_unified_hunks_preserve_textual_order() {
        let diff = parse("@@ -1,1 +1,1 @@\n-a\n+A\n@@ -9,1 +9,1 @@\n-z\n+Z\n");
        assert_eq!(diff.hunks.len(), 2);
        assert_eq!(diff.hunks[0].target, Target::Line(1));
        assert_eq!(diff.hunks[1].target, Target::Line(9));
    }

    #[test]
    fn test_suggestion_block() {
        let diff = parse("```suggestion\nfoo()\n```");
        assert_eq!(diff.suggestion.as_deref(), Some("foo()"));
        assert_eq!(diff.hunks.len(), 0);
    }

    #[test]
    fn test_suggestion_is_case_insensitive_and_first_wins() {
        let diff = parse("```Suggestion\nfirst\n```\n```suggestion\nsecond\n```\n");
        assert_eq!(diff.suggestion.as_deref(), Some("first"));
    }

    #[test]
    fn test_suggestion_unterminated_fence_runs_to_eof() {
        let diff = parse("```suggestion\nfoo()\nbar()");
        assert_eq!(diff.suggestion.as_deref(), Some("foo()\nbar()"));
    }

    #[test]
    fn test_fenced_diff_with_unified_body() {
        // The unscoped unified scan re-finds the fenced hunk, so it appears
        // twice in the merged list. The identical duplicate collapses to a
        // single edit at apply time.
        let diff = parse("```diff\n@@ -2,1 +2,1 @@\n-old\n+new\n```\n");
        assert_eq!(diff.hunks.len(), 2);
        assert_eq!(diff.hunks[0], diff.hunks[1]);
        assert_eq!(diff.hunks[0].target, Target::Line(2));
    }

    #[test]
    fn test_fenced_diff_close_fence_terminates_hunk_body() {
        // The trailing "junk" line is outside the fence and must not leak
        // into the hunk body.
        let diff = parse("```diff\n@@ -2,1 +2,1 @@\n-old\n+new\n```\n+junk\n");
        assert_eq!(diff.hunks.len(), 2);
        assert_eq!(diff.hunks[0].new_lines, strs(&["new"]));
        assert_eq!(diff.hunks[1].new_lines, strs(&["new"]));
    }

    #[test]
    fn test_fenced_plus_minus_block_without_headers() {
        let diff = parse("```diff\n-old line\n+new line\n```\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::ActiveRange);
        assert_eq!(diff.hunks[0].old_count, 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["new line"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["old line"]));
    }

    #[test]
    fn test_blank_language_fence_is_diff_bearing() {
        let diff = parse("```\n+added\n```\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["added"]));
    }

    #[test]
    fn test_non_diff_language_fence_is_ignored() {
        let diff = parse("```rust\nfn main() {}\n```\n");
        assert!(diff.is_empty());
    }

    #[test]
    fn test_plus_lines_in_non_diff_fence_still_feed_the_fallback() {
        // A non-diff fence contributes no fenced hunks, but the raw +/-
        // fallback scans the whole input and still picks the line up.
        let diff = parse("```rust\n+let x = 1;\n```\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::ActiveRange);
        assert_eq!(diff.hunks[0].new_lines, strs(&["let x = 1;"]));
    }

    #[test]
    fn test_diff_keyword_matches_as_substring_token() {
        for lang in ["diff", "patch", "udiff", "git-diff", "unidiff", "DIFF"] {
            let text = format!("```{lang}\n+x\n```\n");
            let diff = parse(&text);
            assert_eq!(diff.hunks.len(), 1, "language tag {lang} should parse");
        }
    }

    #[test]
    fn test_tilde_fences_work() {
        let diff = parse("~~~diff\n@@ -1,1 +1,1 @@\n-a\n+b\n~~~\n");
        // Fenced hunk plus its unscoped duplicate.
        assert_eq!(diff.hunks.len(), 2);
        assert_eq!(diff.hunks[0].target, Target::Line(1));
    }

    #[test]
    fn test_unscoped_unified_hunks_without_fences() {
        let diff = parse("some prose\n@@ -4,1 +4,1 @@\n-x\n+y\nmore prose\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::Line(4));
    }

    #[test]
    fn test_raw_plus_minus_fallback() {
        let diff = parse("+hello\n-world");
        assert_eq!(diff.hunks.len(), 1);
        let hunk = &diff.hunks[0];
        assert_eq!(hunk.target, Target::ActiveRange);
        assert_eq!(hunk.old_count, 1);
        assert_eq!(hunk.new_lines, strs(&["hello"]));
        assert_eq!(hunk.old_lines, strs(&["world"]));
    }

    #[test]
    fn test_fallback_is_bypassed_when_unified_hunks_exist() {
        // The +/- lines belong to the unified hunk; no extra active-range
        // hunk may be synthesized from them.
        let diff = parse("@@ -1,1 +1,1 @@\n-a\n+b\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::Line(1));
    }

    #[test]
    fn test_fallback_accepts_at_most_one_leading_space() {
        let diff = parse(" +added\n -removed\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["added"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["removed"]));

        // Deeper indentation is not a fallback marker.
        assert!(parse("  +too deep").is_empty());
        assert!(parse("\t+tabbed").is_empty());
    }

    #[test]
    fn test_salvage_accepts_markers_after_any_indentation() {
        // A quoted reply: the first pass sees no markers, cleanup strips
        // the `>` layer, and the salvage trims what indentation remains
        // before looking for markers.
        let raw = "> code\n>   +added\n> context";
        assert!(parse(raw).is_empty());
        let diff = parse_with_prompt(raw, || true);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].target, Target::ActiveRange);
        assert_eq!(diff.hunks[0].new_lines, strs(&["added"]));
    }

    #[test]
    fn test_crlf_and_bom_are_normalized() {
        let diff = parse("\u{feff}@@ -1,1 +1,1 @@\r\n-a\r\n+b\r\n");
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["b"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["a"]));
    }

    #[test]
    fn test_body_cap_guards_runaway_consumption() {
        // A malformed hunk with a huge body: consumption stops after
        // old + new + slack lines instead of eating the whole input.
        let mut text = String::from("@@ -1,1 +1,1 @@\n");
        for _ in 0..500 {
            text.push_str("stray line\n");
        }
        text.push_str("+tail\n");
        let diff = parse(&text);
        assert_eq!(diff.hunks.len(), 1);
        // The +tail line lies beyond the cap and was not consumed.
        assert_eq!(diff.hunks[0].new_lines, Vec::<String>::new());
    }

    #[test]
    fn test_suggestion_and_hunks_can_coexist() {
        let diff = parse("```suggestion\nfoo()\n```\n@@ -1,1 +1,1 @@\n-a\n+b\n");
        assert_eq!(diff.suggestion.as_deref(), Some("foo()"));
        assert_eq!(diff.hunks.len(), 1);
    }

    #[test]
    fn test_clean_markers_strips_fences_and_one_marker() {
        let cleaned = clean_markers("```diff\n+    let x = 1;\n-    let x = 2;\n```");
        assert_eq!(cleaned, "let x = 1;\n    let x = 2;");
    }

    #[test]
    fn test_clean_markers_preserves_indentation() {
        let cleaned = clean_markers("  +  indented\n\t>quoted");
        assert_eq!(cleaned, "indented\n\tquoted");
    }

    #[test]
    fn test_parse_with_prompt_skips_prompt_on_success() {
        let mut asked = false;
        let diff = parse_with_prompt("@@ -1,1 +1,1 @@\n-a\n+b\n", || {
            asked = true;
            true
        });
        assert!(!asked);
        assert_eq!(diff.hunks.len(), 1);
    }

    #[test]
    fn test_parse_with_prompt_declined_returns_empty() {
        let diff = parse_with_prompt("no diff here", || false);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_parse_with_prompt_cleans_and_retries() {
        // Cleanup with nothing to salvage still ends empty: the fence
        // lines are dropped and the remaining body has no +/- markers.
        let raw = "```text\nplain body\n```";
        let diff = parse_with_prompt(raw, || true);
        assert!(diff.is_empty());

        // A quoted diff: markers are preceded by `>` so tier 1 fails, but
        // cleanup strips one marker layer and tier 2 re-parses the rest.
        let quoted = "> +added\n> -removed\n";
        let first = parse(quoted);
        assert!(first.is_empty());
        let diff = parse_with_prompt(quoted, || true);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].new_lines, strs(&["added"]));
        assert_eq!(diff.hunks[0].old_lines, strs(&["removed"]));
    }
}
