//! Normalisation of raw page text before it joins the extracted document.
//!
//! lopdf hands back whatever bytes the content stream produced: form feeds,
//! CRLF pairs, zero-width joiners, runs of blank lines. Left alone these
//! become stray paragraph breaks or unprintable glyphs in the LaTeX output.
//! Each rule below is a pure `&str → String` pass; they run in this order so
//! that line-ending normalisation happens before any line-based rule.
//!
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip control characters other than `\n` and `\t`
//! 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 4. Trim trailing whitespace per line
//! 5. Collapse 3+ consecutive newlines to one blank line
//! 6. Trim leading blank lines and all trailing whitespace

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean one page fragment. Returns an empty string for a blank page.
pub fn clean_fragment(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_control_chars(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    trim_edges(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip control characters ─────────────────────────────────────────

static RE_CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

fn remove_control_chars(input: &str) -> String {
    RE_CONTROL.replace_all(input, "").to_string()
}

// ── Rule 3: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse blank-line runs ─────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 6: Trim edges ───────────────────────────────────────────────────────

fn trim_edges(input: &str) -> String {
    input.trim_start_matches('\n').trim_end().to_string()
}
