//! Chunked translation: split, translate each chunk, reassemble in order.
//!
//! Chunks are independent, so up to `translation_concurrency` requests run at
//! once. Completion order is arbitrary; every result carries its chunk index
//! and the output is sorted by it before concatenation.
//!
//! ## Failure policy
//!
//! The first chunk that still fails after `max_retries` retries aborts the
//! stage: the remaining in-flight requests are dropped and no partial
//! translation is returned. Each attempt is bounded by `chunk_timeout_secs`.
//! With `max_retries > 0` the wait between attempts doubles:
//! `retry_backoff_ms` → 2× → 4× …

use crate::config::ConversionConfig;
use crate::error::{Pdf2TexError, TranslationError};
use crate::output::PipelineStage;
use crate::pipeline::chunk::{split_chunks, TextChunk};
use crate::translator::Translator;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// The reassembled translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText {
    pub text: String,
    /// Number of chunks the source was split into.
    pub chunks: usize,
}

/// Translate `text` into `target` chunk by chunk.
pub async fn translate_text(
    text: &str,
    target: &str,
    translator: &Arc<dyn Translator>,
    config: &ConversionConfig,
) -> Result<TranslatedText, Pdf2TexError> {
    let chunks = split_chunks(text, config.max_chunk_length.max(1));
    let total = chunks.len();
    info!(
        "Translating {} chars in {} chunks via {} ({} → {})",
        text.chars().count(),
        total,
        translator.name(),
        config.source_language,
        target
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_translation_start(total);
    }

    let work = stream::iter(chunks.into_iter().map(|chunk| {
        let translator = Arc::clone(translator);
        async move {
            let translated = translate_chunk(translator.as_ref(), chunk, target, config).await?;
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_complete(chunk.index, total, translated.chars().count());
            }
            Ok::<_, TranslationError>((chunk.index, translated))
        }
    }))
    .buffer_unordered(config.translation_concurrency.max(1))
    .try_collect::<Vec<_>>();

    let mut results = match config.cancel.clone() {
        Some(token) => tokio::select! {
            results = work => results?,
            _ = token.cancelled() => {
                return Err(Pdf2TexError::Cancelled { stage: PipelineStage::Translating });
            }
        },
        None => work.await?,
    };

    results.sort_by_key(|(index, _)| *index);
    let text: String = results.into_iter().map(|(_, t)| t).collect();

    Ok(TranslatedText {
        text,
        chunks: total,
    })
}

/// Translate one chunk with timeout and retries.
async fn translate_chunk(
    translator: &dyn Translator,
    chunk: TextChunk<'_>,
    target: &str,
    config: &ConversionConfig,
) -> Result<String, TranslationError> {
    // Nothing to translate; services either echo or reject blank input.
    if chunk.text.trim().is_empty() {
        return Ok(chunk.text.to_string());
    }

    let timeout = Duration::from_secs(config.chunk_timeout_secs);
    let mut last_err: Option<TranslationError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(1u64 << (attempt - 1).min(16));
            warn!(
                "Chunk {}: retry {}/{} after {}ms",
                chunk.index, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = translator.translate(chunk.text, &config.source_language, target);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(translated)) => {
                debug!(
                    "Chunk {}: {} → {} chars",
                    chunk.index,
                    chunk.text.chars().count(),
                    translated.chars().count()
                );
                return Ok(translated);
            }
            Ok(Err(e)) => {
                warn!("Chunk {}: attempt {} failed — {}", chunk.index, attempt + 1, e);
                last_err = Some(TranslationError::ChunkFailed {
                    chunk: chunk.index,
                    translator: translator.name().to_string(),
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "Chunk {}: attempt {} timed out after {}s",
                    chunk.index,
                    attempt + 1,
                    config.chunk_timeout_secs
                );
                last_err = Some(TranslationError::Timeout {
                    chunk: chunk.index,
                    secs: config.chunk_timeout_secs,
                });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| TranslationError::ChunkFailed {
        chunk: chunk.index,
        translator: translator.name().to_string(),
        detail: "no attempt made".to_string(),
    }))
}
