//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the run moves through its stages and as translation chunks
//! complete.
//!
//! # Example
//!
//! ```rust
//! use pdf2tex::{ConversionConfig, ConversionProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ConversionProgressCallback for StageLogger {
//!     fn on_stage_start(&self, stage: PipelineStage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::CompilationFailure;
use crate::output::PipelineStage;
use std::sync::Arc;

/// Called by the pipeline as it runs.
///
/// Implementations must be `Send + Sync`: chunk events fire from concurrently
/// running translation tasks, in completion order rather than chunk order.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when the state machine enters `stage`.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when `stage` finished successfully.
    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once chunking is done, before any chunk is sent.
    fn on_translation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called when a chunk has been translated.
    ///
    /// # Arguments
    /// * `chunk`          — 0-indexed chunk number
    /// * `total_chunks`   — number of chunks in this run
    /// * `translated_len` — character length of the translated chunk
    fn on_chunk_complete(&self, chunk: usize, total_chunks: usize, translated_len: usize) {
        let _ = (chunk, total_chunks, translated_len);
    }

    /// Called when the LaTeX engine failed; the run continues to `Done`.
    fn on_compile_warning(&self, failure: &CompilationFailure) {
        let _ = failure;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
