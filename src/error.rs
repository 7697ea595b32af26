//! Error types for the pdf2tex library.
//!
//! Two kinds of failure exist:
//!
//! * [`Pdf2TexError`] — **Fatal**: the run stops in the `Failed` state.
//!   Extraction, translation and LaTeX generation each have their own
//!   sub-enum ([`DocumentOpenError`], [`TranslationError`],
//!   [`ConversionError`]) so callers can match on the stage that failed.
//!
//! * [`CompilationFailure`] — **Non-fatal**: the LaTeX engine could not
//!   produce a PDF. The `.tex` artifact is already on disk, so the run still
//!   reaches `Done` and the failure is reported as a warning inside
//!   [`crate::output::ConversionOutput`].

use crate::output::PipelineStage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2tex library.
#[derive(Debug, Error)]
pub enum Pdf2TexError {
    /// The input could not be opened or parsed as a PDF.
    #[error(transparent)]
    DocumentOpen(#[from] DocumentOpenError),

    /// A chunk could not be translated; the whole translation stage aborts.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// The text could not be turned into LaTeX or the `.tex` file not written.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled through the configured cancellation token.
    #[error("Conversion cancelled during {stage}")]
    Cancelled { stage: PipelineStage },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2TexError {
    /// The pipeline stage in which this error moved the run to `Failed`.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Pdf2TexError::DocumentOpen(_) => PipelineStage::Extracting,
            Pdf2TexError::Translation(_) => PipelineStage::Translating,
            Pdf2TexError::Conversion(_) => PipelineStage::Converting,
            Pdf2TexError::InvalidConfig(_) => PipelineStage::Idle,
            Pdf2TexError::Cancelled { stage } => *stage,
            Pdf2TexError::Internal(_) => PipelineStage::Idle,
        }
    }
}

/// The input document is missing, unreadable, or not a parseable PDF.
#[derive(Debug, Error)]
pub enum DocumentOpenError {
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document is encrypted with a non-empty user password.
    #[error("PDF '{path}' is encrypted and cannot be opened without a password.")]
    Encrypted { path: PathBuf },
}

/// A chunk translation call failed or timed out.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The translation collaborator returned an error for this chunk.
    #[error("Translation of chunk {chunk} via '{translator}' failed: {detail}")]
    ChunkFailed {
        chunk: usize,
        translator: String,
        detail: String,
    },

    #[error("Translation of chunk {chunk} timed out after {secs}s")]
    Timeout { chunk: usize, secs: u64 },

    /// The service rejected the request with HTTP 429.
    #[error("Rate limit exceeded for translator '{translator}'")]
    RateLimited { translator: String },

    /// The service does not know the requested language pair.
    #[error("Unsupported language pair {source_lang} → {target_lang} for '{translator}'")]
    UnsupportedLanguage {
        translator: String,
        source_lang: String,
        target_lang: String,
    },

    /// The LLM backend could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Network or protocol failure talking to the translation service.
    #[error("Translation request failed: {0}")]
    Transport(String),

    /// The service answered with a body we could not interpret.
    #[error("Unexpected translation response: {0}")]
    InvalidResponse(String),
}

/// The structural converter rejected the input or the output was not written.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The lightweight markup could not be parsed.
    #[error("Malformed markup at line {line}: {detail}")]
    MalformedMarkup { line: usize, detail: String },

    /// An external converter (pandoc) failed to run or exited non-zero.
    #[error("Converter '{converter}' failed: {detail}")]
    Collaborator { converter: String, detail: String },

    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal failure of the LaTeX engine.
///
/// Stored in [`crate::output::ConversionOutput::compile_warning`]; the `.tex`
/// file remains valid and the run still ends in `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum CompilationFailure {
    /// The engine binary is not on `PATH`.
    #[error("LaTeX engine '{engine}' not found; install a TeX distribution or pass --engine")]
    EngineNotFound { engine: String },

    #[error("Failed to start LaTeX engine '{engine}': {detail}")]
    SpawnFailed { engine: String, detail: String },

    /// The engine ran but reported failure.
    #[error("LaTeX engine '{engine}' exited with {code}:\n{log_tail}")]
    NonZeroExit {
        engine: String,
        code: String,
        log_tail: String,
    },

    #[error("LaTeX engine '{engine}' timed out after {secs}s")]
    TimedOut { engine: String, secs: u64 },

    #[error("Compilation cancelled")]
    Cancelled,
}
