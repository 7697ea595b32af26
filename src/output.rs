//! Result types returned by a conversion run.

use crate::error::CompilationFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// States of the conversion state machine.
///
/// ```text
/// Idle → Extracting → [Translating] → Converting → [Compiling] → Done
///            └──────────────┴──────────────┴──→ Failed
/// ```
///
/// `Compiling` never leads to `Failed`: an engine failure is reported as a
/// [`CompilationFailure`] warning and the run still ends in `Done`.
///
/// `Failed` is never part of [`ConversionOutput::stages`]. A failed run
/// returns `Err`, whose [`crate::Pdf2TexError::stage`] names the stage that
/// failed, and the progress callback receives `on_stage_start(Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Idle,
    Extracting,
    Translating,
    Converting,
    Compiling,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Extracting => "Extracting",
            PipelineStage::Translating => "Translating",
            PipelineStage::Converting => "Converting",
            PipelineStage::Compiling => "Compiling",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path of the written LaTeX source.
    pub tex_path: PathBuf,
    /// Path of the compiled PDF; `None` when compilation was not requested
    /// or the engine failed.
    pub pdf_path: Option<PathBuf>,
    /// Why compilation did not produce a PDF, when it was requested.
    pub compile_warning: Option<CompilationFailure>,
    /// The states visited, in order, ending in `Done`.
    pub stages: Vec<PipelineStage>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Whether the run went through the translation stage.
    pub fn was_translated(&self) -> bool {
        self.stages.contains(&PipelineStage::Translating)
    }
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    /// Pages that yielded a non-blank text fragment.
    pub text_pages: usize,
    pub extracted_chars: usize,
    /// Number of chunks sent for translation (0 when not translated).
    pub chunks: usize,
    pub translated_chars: usize,
    /// Size of the written `.tex` file.
    pub latex_bytes: usize,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub compile_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document-level information read from the PDF trailer and Info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub page_count: usize,
    pub pdf_version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub is_encrypted: bool,
}
