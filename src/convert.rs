//! Pipeline orchestration: the entry points that run one conversion.
//!
//! A run moves through
//! `Idle → Extracting → [Translating] → Converting → [Compiling] → Done`.
//! Each stage finishes before the next starts. Extraction, translation and
//! conversion failures move the run to `Failed` and end it with an `Err`; a
//! compilation failure does not, because the `.tex` artifact already exists
//! by then.

use crate::config::ConversionConfig;
use crate::error::Pdf2TexError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PipelineStage};
use crate::pipeline::compile::{compile_latex, CompileOutcome};
use crate::pipeline::{extract, input, latex, translate};
use crate::translator::create_translator;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a PDF file to LaTeX.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Path to a local PDF file
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` once the `.tex` file is written, even if the
/// optional compilation failed (check `output.compile_warning`).
///
/// # Errors
/// Returns `Err(Pdf2TexError)` for fatal errors; [`Pdf2TexError::stage`]
/// names the stage that failed:
/// - File not found / not a PDF / unreadable PDF
/// - A translation chunk failed, timed out or was rate-limited
/// - Malformed markup, converter failure or unwritable output path
///
/// Before the error is returned the progress callback sees
/// `on_stage_start(PipelineStage::Failed)`.
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    let result = run_pipeline(input.as_ref(), config).await;
    if let Err(ref e) = result {
        warn!("Conversion failed during {}: {}", e.stage(), e);
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(PipelineStage::Failed);
        }
    }
    result
}

async fn run_pipeline(
    input: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", input.display());

    let mut run = Run::new(config);
    let mut stats = ConversionStats::default();

    // ── Extracting ───────────────────────────────────────────────────────
    run.enter(PipelineStage::Extracting)?;
    let pdf_path = input::validate_input(input)?;
    let (extracted, metadata) = extract::extract_text(&pdf_path).await?;
    stats.total_pages = extracted.page_count();
    stats.text_pages = extracted.text_pages();
    stats.extracted_chars = extracted.text.chars().count();
    stats.extract_duration_ms = run.leave();
    info!(
        "Extracted {} chars from {}/{} pages in {}ms",
        stats.extracted_chars, stats.text_pages, stats.total_pages, stats.extract_duration_ms
    );

    // ── Translating (optional) ───────────────────────────────────────────
    let text = match config.target_language.as_deref() {
        Some(target) => {
            run.enter(PipelineStage::Translating)?;
            let translator = create_translator(config)?;
            let translated =
                translate::translate_text(&extracted.text, target, &translator, config).await?;
            stats.chunks = translated.chunks;
            stats.translated_chars = translated.text.chars().count();
            stats.translate_duration_ms = run.leave();
            translated.text
        }
        None => extracted.text,
    };

    // ── Converting ───────────────────────────────────────────────────────
    run.enter(PipelineStage::Converting)?;
    let tex_path = input::tex_path_for(input, config.output_tex_path.as_deref());
    let converter = latex::create_converter(config);
    let latex_source = latex::render_latex(&text, converter.as_ref(), config.standalone).await?;
    latex::write_latex(&latex_source, &tex_path).await?;
    stats.latex_bytes = latex_source.len();
    stats.convert_duration_ms = run.leave();

    // ── Compiling (optional) ─────────────────────────────────────────────
    let mut pdf_path = None;
    let mut compile_warning = None;
    if config.compile {
        run.enter(PipelineStage::Compiling)?;
        let outcome = compile_latex(
            &tex_path,
            &config.latex_engine,
            config.compile_timeout_secs,
            config.cancel.as_ref(),
        )
        .await;
        match outcome {
            CompileOutcome::Success { pdf_path: p } => pdf_path = Some(p),
            CompileOutcome::Failure(failure) => {
                warn!("Keeping {} without a PDF: {}", tex_path.display(), failure);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_compile_warning(&failure);
                }
                compile_warning = Some(failure);
            }
        }
        stats.compile_duration_ms = run.leave();
    }

    run.stages.push(PipelineStage::Done);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} in {}ms",
        tex_path.display(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        tex_path,
        pdf_path,
        compile_warning,
        stages: run.stages,
        metadata,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Extract PDF metadata without converting content.
///
/// Needs no translator, converter or LaTeX installation.
pub async fn inspect(input: impl AsRef<Path>) -> Result<DocumentMetadata, Pdf2TexError> {
    let pdf_path = input::validate_input(input.as_ref())?;
    Ok(extract::read_metadata(&pdf_path).await?)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Stage bookkeeping for one run: visited stages, timing, callbacks.
struct Run<'a> {
    config: &'a ConversionConfig,
    stages: Vec<PipelineStage>,
    started: Instant,
}

impl<'a> Run<'a> {
    fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            stages: vec![PipelineStage::Idle],
            started: Instant::now(),
        }
    }

    /// Move to `stage`, unless the run was cancelled.
    fn enter(&mut self, stage: PipelineStage) -> Result<(), Pdf2TexError> {
        if self.config.is_cancelled() {
            return Err(Pdf2TexError::Cancelled { stage });
        }
        info!("Stage: {}", stage);
        self.stages.push(stage);
        self.started = Instant::now();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_start(stage);
        }
        Ok(())
    }

    /// Finish the current stage; returns its duration in milliseconds.
    fn leave(&self) -> u64 {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if let (Some(stage), Some(cb)) = (self.stages.last(), &self.config.progress_callback) {
            cb.on_stage_complete(*stage, elapsed_ms);
        }
        elapsed_ms
    }
}
