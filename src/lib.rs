//! # pdf2tex
//!
//! Convert PDF documents to LaTeX source, optionally translating the text and
//! typesetting the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    per-page text via lopdf (CPU-bound, spawn_blocking)
//!  ├─ 2. Translate  optional; 4500-char chunks, concurrent, reassembled in order
//!  ├─ 3. Convert    lightweight markup → LaTeX (builtin renderer or pandoc)
//!  ├─ 4. Write      atomic write of <base>.tex
//!  └─ 5. Compile    optional; pdflatex, failure reported as a warning
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tex::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .target_language("fr")
//!         .compile(true)
//!         .build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     println!("wrote {}", output.tex_path.display());
//!     if let Some(warning) = output.compile_warning {
//!         eprintln!("no PDF: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tex` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2tex = { version = "0.1", default-features = false }
//! ```
//!
//! ## Translators
//!
//! | Backend | Key needed | Notes |
//! |---------|-----------|-------|
//! | `Google` | none | default; public endpoint, rate-limited |
//! | `Llm` | `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, … | any edgequake-llm provider |
//!
//! Implement [`Translator`] or [`LatexConverter`] to plug in your own
//! collaborator and pass it through the config builder.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod translator;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConverterBackend, TranslatorBackend,
    DEFAULT_MAX_CHUNK_LENGTH,
};
pub use convert::{convert, convert_sync, inspect};
pub use error::{
    CompilationFailure, ConversionError, DocumentOpenError, Pdf2TexError, TranslationError,
};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PipelineStage};
pub use pipeline::compile::CompileOutcome;
pub use pipeline::latex::{BuiltinConverter, LatexConverter, PandocConverter};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use translator::{GoogleTranslator, LlmTranslator, Translator};
