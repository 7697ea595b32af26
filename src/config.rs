//! Configuration types for PDF-to-LaTeX conversion.
//!
//! All run behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Collaborators (translator, converter) are
//! either named by a backend enum and constructed per run, or handed in
//! pre-built; nothing is read from process-wide state except the provider
//! environment variables consulted by the LLM backend.

use crate::error::Pdf2TexError;
use crate::pipeline::latex::LatexConverter;
use crate::progress::ProgressCallback;
use crate::translator::Translator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default maximum chunk length, in characters, sent to the translator.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 4500;

/// Configuration for one PDF-to-LaTeX run.
///
/// # Example
/// ```rust
/// use pdf2tex::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .target_language("fr")
///     .compile(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chunk_length, 4500);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Target language code. `Some` enables the translation stage.
    pub target_language: Option<String>,

    /// Source language passed to the translator. Default: `"auto"`.
    pub source_language: String,

    /// Maximum characters per translation chunk. Default: 4500.
    ///
    /// Chunks are cut at exactly this many characters, even mid-word.
    pub max_chunk_length: usize,

    /// Where to write the `.tex` file. Default: `<input base>.tex`.
    pub output_tex_path: Option<PathBuf>,

    /// Run the LaTeX engine after writing the `.tex` file. Default: false.
    pub compile: bool,

    /// Which translation service to use when no pre-built translator is set.
    pub translator_backend: TranslatorBackend,

    /// Pre-constructed translator. Takes precedence over `translator_backend`.
    pub translator: Option<Arc<dyn Translator>>,

    /// Maximum chunks in flight at once. Default: 4.
    pub translation_concurrency: usize,

    /// Per-chunk translation timeout in seconds. Default: 60.
    pub chunk_timeout_secs: u64,

    /// Retries per chunk before the translation stage aborts. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Which markup-to-LaTeX converter to use when no pre-built one is set.
    pub converter_backend: ConverterBackend,

    /// Pre-constructed converter. Takes precedence over `converter_backend`.
    pub converter: Option<Arc<dyn LatexConverter>>,

    /// Wrap the converted body in a compilable preamble. Default: true.
    pub standalone: bool,

    /// LaTeX engine binary. Default: `pdflatex`.
    pub latex_engine: String,

    /// Wall-clock limit for the LaTeX engine in seconds. Default: 120.
    pub compile_timeout_secs: u64,

    pub progress_callback: Option<ProgressCallback>,

    /// Cancels translation and compilation when triggered.
    pub cancel: Option<CancellationToken>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target_language: None,
            source_language: "auto".to_string(),
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            output_tex_path: None,
            compile: false,
            translator_backend: TranslatorBackend::default(),
            translator: None,
            translation_concurrency: 4,
            chunk_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            converter_backend: ConverterBackend::default(),
            converter: None,
            standalone: true,
            latex_engine: "pdflatex".to_string(),
            compile_timeout_secs: 120,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("target_language", &self.target_language)
            .field("source_language", &self.source_language)
            .field("max_chunk_length", &self.max_chunk_length)
            .field("output_tex_path", &self.output_tex_path)
            .field("compile", &self.compile)
            .field("translator_backend", &self.translator_backend)
            .field("translator", &self.translator.as_ref().map(|t| t.name()))
            .field("translation_concurrency", &self.translation_concurrency)
            .field("chunk_timeout_secs", &self.chunk_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("converter_backend", &self.converter_backend)
            .field("converter", &self.converter.as_ref().map(|c| c.name()))
            .field("standalone", &self.standalone)
            .field("latex_engine", &self.latex_engine)
            .field("compile_timeout_secs", &self.compile_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether the translation stage will run.
    pub fn translates(&self) -> bool {
        self.target_language.is_some()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.config.target_language = Some(lang.into());
        self
    }

    pub fn source_language(mut self, lang: impl Into<String>) -> Self {
        self.config.source_language = lang.into();
        self
    }

    pub fn max_chunk_length(mut self, n: usize) -> Self {
        self.config.max_chunk_length = n;
        self
    }

    pub fn output_tex_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_tex_path = Some(path.into());
        self
    }

    pub fn compile(mut self, v: bool) -> Self {
        self.config.compile = v;
        self
    }

    pub fn translator_backend(mut self, backend: TranslatorBackend) -> Self {
        self.config.translator_backend = backend;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn translation_concurrency(mut self, n: usize) -> Self {
        self.config.translation_concurrency = n;
        self
    }

    pub fn chunk_timeout_secs(mut self, secs: u64) -> Self {
        self.config.chunk_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn converter_backend(mut self, backend: ConverterBackend) -> Self {
        self.config.converter_backend = backend;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn LatexConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn standalone(mut self, v: bool) -> Self {
        self.config.standalone = v;
        self
    }

    pub fn latex_engine(mut self, engine: impl Into<String>) -> Self {
        self.config.latex_engine = engine.into();
        self
    }

    pub fn compile_timeout_secs(mut self, secs: u64) -> Self {
        self.config.compile_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2TexError> {
        let c = &self.config;
        if c.max_chunk_length == 0 {
            return Err(Pdf2TexError::InvalidConfig(
                "Chunk length must be ≥ 1".into(),
            ));
        }
        if c.translation_concurrency == 0 {
            return Err(Pdf2TexError::InvalidConfig(
                "Translation concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(ref lang) = c.target_language {
            if !is_language_code(lang) || lang.eq_ignore_ascii_case("auto") {
                return Err(Pdf2TexError::InvalidConfig(format!(
                    "Invalid target language '{lang}': expected a code such as 'en', 'fr' or 'zh-CN'"
                )));
            }
        }
        if !is_language_code(&c.source_language) {
            return Err(Pdf2TexError::InvalidConfig(format!(
                "Invalid source language '{}'",
                c.source_language
            )));
        }
        if c.latex_engine.trim().is_empty() {
            return Err(Pdf2TexError::InvalidConfig(
                "LaTeX engine must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

fn is_language_code(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 16
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Translation service used for the optional translation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslatorBackend {
    /// Public Google Translate endpoint, no API key required. (default)
    #[default]
    Google,
    /// Any edgequake-llm chat provider.
    ///
    /// With both fields `None` the provider is auto-detected from the
    /// environment (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …).
    Llm {
        provider: Option<String>,
        model: Option<String>,
    },
}

/// Markup-to-LaTeX converter used for the structural conversion stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConverterBackend {
    /// Native renderer, no external tools. (default)
    #[default]
    Builtin,
    /// `pandoc -f markdown -t latex`.
    Pandoc,
}
