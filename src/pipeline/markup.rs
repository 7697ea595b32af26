//! Built-in renderer from lightweight markup to a LaTeX body.
//!
//! Extracted PDF text is treated as a small Markdown dialect:
//!
//! | Markup | LaTeX |
//! |--------|-------|
//! | `# Title` … `###### Title` | `\section` … `\subparagraph` |
//! | `Title` underlined with `===` / `---` | `\section` / `\subsection` |
//! | `- item`, `* item`, `+ item` | `itemize` |
//! | `1. item`, `1) item` | `enumerate` |
//! | `> quoted` | `quote` |
//! | fenced code (```` ``` ```` or `~~~`) | `verbatim` |
//! | `---`, `***`, `___` on their own | centred rule |
//! | `**bold**`, `__bold__` | `\textbf` |
//! | `*emph*`, `_emph_` | `\emph` |
//! | `` `code` `` | `\texttt` |
//!
//! As in pandoc's Markdown, headings, lists and quotes only start after a
//! blank line (or at the top), so a line of PDF text that happens to begin
//! with `1.` inside a paragraph stays part of that paragraph. Nested lists
//! are flattened to one level.

use crate::error::ConversionError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Render `markup` into a LaTeX body (no preamble).
///
/// Blocks are separated by one blank line and the result ends with a newline;
/// empty input renders to an empty string.
pub fn render_body(markup: &str) -> Result<String, ConversionError> {
    let blocks = parse_blocks(markup, 0)?;
    if blocks.is_empty() {
        return Ok(String::new());
    }
    let mut out = blocks
        .iter()
        .map(Block::to_latex)
        .collect::<Result<Vec<_>, _>>()?
        .join("\n\n");
    out.push('\n');
    Ok(out)
}

/// Escape LaTeX special characters in plain text.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '#' => out.push_str("\\#"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            '^' => out.push_str("\\^{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '<' => out.push_str("\\textless{}"),
            '>' => out.push_str("\\textgreater{}"),
            '|' => out.push_str("\\textbar{}"),
            _ => out.push(c),
        }
    }
    out
}

// ── Blocks ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading { level: usize, text: String },
    Paragraph(Vec<String>),
    List { ordered: bool, items: Vec<String> },
    Quote(Vec<Block>),
    Code(Vec<String>),
    Rule,
}

impl Block {
    fn to_latex(&self) -> Result<String, ConversionError> {
        Ok(match self {
            Block::Heading { level, text } => {
                format!("\\{}{{{}}}", heading_command(*level), render_inline(text))
            }
            Block::Paragraph(lines) => render_inline(&lines.join("\n")),
            Block::List { ordered, items } => {
                let env = if *ordered { "enumerate" } else { "itemize" };
                let mut s = format!("\\begin{{{env}}}\n");
                for item in items {
                    s.push_str("\\item ");
                    s.push_str(&render_inline(item));
                    s.push('\n');
                }
                s.push_str(&format!("\\end{{{env}}}"));
                s
            }
            Block::Quote(inner) => {
                let body = inner
                    .iter()
                    .map(Block::to_latex)
                    .collect::<Result<Vec<_>, _>>()?
                    .join("\n\n");
                format!("\\begin{{quote}}\n{body}\n\\end{{quote}}")
            }
            Block::Code(lines) => {
                format!("\\begin{{verbatim}}\n{}\n\\end{{verbatim}}", lines.join("\n"))
            }
            Block::Rule => {
                "\\begin{center}\\rule{0.5\\linewidth}{0.5pt}\\end{center}".to_string()
            }
        })
    }
}

fn heading_command(level: usize) -> &'static str {
    match level {
        1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        4 => "paragraph",
        _ => "subparagraph",
    }
}

static RE_ATX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+][ \t]+(.*)$").unwrap());
static RE_ORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,9}[.)][ \t]+(.*)$").unwrap());
static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}>[ ]?(.*)$").unwrap());
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(```+|~~~+)").unwrap());
static RE_SETEXT_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}=+[ \t]*$").unwrap());
static RE_SETEXT_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}-+[ \t]*$").unwrap());

fn is_rule(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|&c| c == marks[0])
}

/// Accumulates lines into blocks. `line_offset` maps nested (quote) line
/// numbers back to the document for error messages.
fn parse_blocks(markup: &str, line_offset: usize) -> Result<Vec<Block>, ConversionError> {
    let lines: Vec<&str> = markup.lines().collect();
    let mut blocks = Vec::new();
    let mut open: Option<Block> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            blocks.extend(open.take());
            i += 1;
            continue;
        }

        // Fenced code may interrupt anything.
        if let Some(caps) = RE_FENCE.captures(line) {
            blocks.extend(open.take());
            let marker = caps[1].to_string();
            let start = i;
            let mut body = Vec::new();
            i += 1;
            loop {
                let Some(code_line) = lines.get(i) else {
                    return Err(ConversionError::MalformedMarkup {
                        line: line_offset + start + 1,
                        detail: format!("unterminated code fence '{marker}'"),
                    });
                };
                if code_line.trim_start().starts_with(marker.as_str()) {
                    break;
                }
                if code_line.contains("\\end{verbatim}") {
                    return Err(ConversionError::MalformedMarkup {
                        line: line_offset + i + 1,
                        detail: "code block contains \\end{verbatim}".to_string(),
                    });
                }
                body.push(code_line.to_string());
                i += 1;
            }
            blocks.push(Block::Code(body));
            i += 1;
            continue;
        }

        if let Some(Block::Paragraph(para)) = open.as_mut() {
            let setext = if RE_SETEXT_1.is_match(line) {
                Some(1)
            } else if RE_SETEXT_2.is_match(line) {
                Some(2)
            } else {
                None
            };
            match setext {
                Some(level) => {
                    let text = para.join(" ");
                    open = None;
                    blocks.push(Block::Heading { level, text });
                }
                None => para.push(line.to_string()),
            }
            i += 1;
            continue;
        }

        if let Some(Block::List { ordered, items }) = open.as_mut() {
            let same_kind = if *ordered {
                RE_ORDERED.captures(line)
            } else {
                RE_BULLET.captures(line)
            };
            if let Some(caps) = same_kind {
                items.push(caps[1].to_string());
                i += 1;
                continue;
            }
            if RE_BULLET.is_match(line) || RE_ORDERED.is_match(line) {
                // A list of the other kind starts on this line.
                blocks.extend(open.take());
                continue;
            }
            // Lazy continuation of the previous item.
            if let Some(last) = items.last_mut() {
                last.push('\n');
                last.push_str(line.trim());
            }
            i += 1;
            continue;
        }

        if let Some(caps) = RE_ATX.captures(line) {
            blocks.push(Block::Heading {
                level: caps[1].len(),
                text: caps[2].to_string(),
            });
        } else if is_rule(line) {
            blocks.push(Block::Rule);
        } else if let Some(caps) = RE_BULLET.captures(line) {
            open = Some(Block::List {
                ordered: false,
                items: vec![caps[1].to_string()],
            });
        } else if let Some(caps) = RE_ORDERED.captures(line) {
            open = Some(Block::List {
                ordered: true,
                items: vec![caps[1].to_string()],
            });
        } else if RE_QUOTE.is_match(line) {
            let start = i;
            let mut inner = Vec::new();
            while let Some(caps) = lines.get(i).and_then(|l| RE_QUOTE.captures(l)) {
                inner.push(caps[1].to_string());
                i += 1;
            }
            blocks.push(Block::Quote(parse_blocks(
                &inner.join("\n"),
                line_offset + start,
            )?));
            continue;
        } else {
            open = Some(Block::Paragraph(vec![line.to_string()]));
        }
        i += 1;
    }

    blocks.extend(open);
    Ok(blocks)
}

// ── Inline ───────────────────────────────────────────────────────────────────

static RE_CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
/// Strong alternatives come first so `**x**` is not read as `*` + `*x*` + `*`.
static RE_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\*\*([^*\s][^*]*?)\*\*",
        r"|\b__([^_\s][^_]*?)__\b",
        r"|\*([^*\s][^*]*?)\*",
        r"|\b_([^_\s][^_]*?)_\b",
    ))
    .unwrap()
});

/// Render inline markup: code spans, strong, emphasis; everything else escaped.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for caps in RE_CODE_SPAN.captures_iter(text) {
        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        out.push_str(&render_emphasis(&text[last..m.0]));
        out.push_str("\\texttt{");
        out.push_str(&escape_latex(&caps[1]));
        out.push('}');
        last = m.1;
    }
    out.push_str(&render_emphasis(&text[last..]));
    out
}

/// Single left-to-right pass over the spans of `text`.
///
/// A span's inner text cannot contain its own delimiter, so the recursion
/// into inner text is at most a few levels deep however long `text` is.
fn render_emphasis(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for caps in RE_EMPHASIS.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let strong = caps.get(1).or_else(|| caps.get(2));
        let emph = caps.get(3).or_else(|| caps.get(4));
        let (command, inner) = match (strong, emph) {
            (Some(strong), _) => ("textbf", strong.as_str()),
            (None, Some(emph)) => ("emph", emph.as_str()),
            (None, None) => continue,
        };
        out.push_str(&escape_latex(&text[last..whole.start()]));
        out.push('\\');
        out.push_str(command);
        out.push('{');
        out.push_str(&render_emphasis(inner));
        out.push('}');
        last = whole.end();
    }
    out.push_str(&escape_latex(&text[last..]));
    out
}
