//! Fixed-size chunking of text for the translation service.
//!
//! Chunks are cut every `max_chars` characters with no regard for word,
//! sentence or paragraph boundaries. Lengths count Unicode scalar values, so
//! a cut never lands inside a multi-byte UTF-8 sequence.

/// A contiguous slice of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// Position of this chunk, 0-indexed.
    pub index: usize,
    pub text: &'a str,
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Every chunk but the last has exactly `max_chars` characters. Empty input
/// yields no chunks. Concatenating the chunks in order gives back `text`.
///
/// # Panics
/// Panics if `max_chars` is 0. [`crate::pipeline::translate::translate_text`]
/// clamps the configured length to at least 1.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<TextChunk<'_>> {
    assert!(max_chars > 0, "chunk length must be positive");

    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);
    let mut start = 0;
    let mut count = 0;

    for (byte_idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(TextChunk {
                index: chunks.len(),
                text: &text[start..byte_idx],
            });
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(TextChunk {
            index: chunks.len(),
            text: &text[start..],
        });
    }
    chunks
}
