//! System prompts for the LLM translation backend.
//!
//! Kept apart from [`crate::translator::llm`] so prompt wording can change
//! without touching request or error-handling code, and so tests can inspect
//! the rendered prompt directly.

/// System prompt for translating one chunk of extracted PDF text.
///
/// `{source}` and `{target}` are substituted by [`translation_prompt`].
pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You are a professional translator. Translate the text supplied by the user from {source} into {target}.

Follow these rules precisely:

1. Output ONLY the translated text. No commentary, no preamble, no quotes.
2. Preserve line breaks and blank lines exactly where they occur.
3. Preserve Markdown markers (#, -, *, 1., >, ```) at the start of lines.
4. Do not translate code, URLs, e-mail addresses or LaTeX commands.
5. The text is a fragment cut at an arbitrary point. If it starts or ends
   mid-word or mid-sentence, translate what is there and do not complete it."#;

/// Human-readable description of the source language for the prompt.
fn describe_source(source: &str) -> String {
    if source.eq_ignore_ascii_case("auto") {
        "the language it is written in (detect it)".to_string()
    } else {
        format!("the language with code '{source}'")
    }
}

/// Render the system prompt for a language pair.
pub fn translation_prompt(source: &str, target: &str) -> String {
    TRANSLATION_SYSTEM_PROMPT
        .replace("{source}", &describe_source(source))
        .replace("{target}", &format!("the language with code '{target}'"))
}
