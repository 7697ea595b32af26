//! Integration tests for the full PDF → LaTeX pipeline.
//!
//! Fixture PDFs are generated at test time with lopdf, so no files or
//! network access are needed. Translators and converters are stubbed through
//! the public traits; the LaTeX engine tests use a missing binary and, on
//! unix, `false`.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf2tex::pipeline::latex::render_latex;
use pdf2tex::{
    convert, convert_sync, inspect, BuiltinConverter, CompilationFailure, ConversionConfig,
    ConversionError, ConversionProgressCallback, DocumentOpenError, LatexConverter, Pdf2TexError,
    PipelineStage, TranslationError, Translator,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Write a PDF with one Courier text line per page; `""` makes a blank page.
fn write_pdf(path: &Path, pages: &[&str], title: Option<&str>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 14.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }
    doc.save(path).unwrap();
}

fn fixture(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.join(name);
    write_pdf(&path, pages, None);
    path
}

/// Route library logs through the test harness; `RUST_LOG=pdf2tex=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Stubs ────────────────────────────────────────────────────────────────────

/// Records the markup it receives and returns it unchanged.
#[derive(Default)]
struct CapturingConverter {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl LatexConverter for CapturingConverter {
    fn name(&self) -> &str {
        "capture"
    }

    async fn to_latex(&self, markup: &str) -> Result<String, ConversionError> {
        self.seen.lock().unwrap().push(markup.to_string());
        Ok(markup.to_string())
    }
}

impl CapturingConverter {
    fn only_input(&self) -> String {
        let seen = self.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "converter called {} times", seen.len());
        seen[0].clone()
    }
}

struct UpperTranslator;

#[async_trait]
impl Translator for UpperTranslator {
    fn name(&self) -> &str {
        "upper"
    }

    async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, TranslationError> {
        Ok(text.to_uppercase())
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslationError> {
        Err(TranslationError::RateLimited {
            translator: "failing".into(),
        })
    }
}

struct SlowTranslator;

#[async_trait]
impl Translator for SlowTranslator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, TranslationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(text.to_string())
    }
}

#[derive(Default)]
struct StageRecorder {
    started: Mutex<Vec<PipelineStage>>,
    completed: Mutex<Vec<PipelineStage>>,
    warnings: Mutex<Vec<CompilationFailure>>,
}

impl ConversionProgressCallback for StageRecorder {
    fn on_stage_start(&self, stage: PipelineStage) {
        self.started.lock().unwrap().push(stage);
    }

    fn on_stage_complete(&self, stage: PipelineStage, _elapsed_ms: u64) {
        self.completed.lock().unwrap().push(stage);
    }

    fn on_compile_warning(&self, failure: &CompilationFailure) {
        self.warnings.lock().unwrap().push(failure.clone());
    }
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_page_pdf_becomes_tex_without_translation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world", "Second page"]);

    let config = ConversionConfig::default();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(output.tex_path, dir.path().join("paper.tex"));
    assert_eq!(output.pdf_path, None);
    assert!(output.compile_warning.is_none());
    assert_eq!(
        output.stages,
        vec![
            PipelineStage::Idle,
            PipelineStage::Extracting,
            PipelineStage::Converting,
            PipelineStage::Done,
        ]
    );

    let expected = render_latex("Hello world\n\nSecond page\n\n", &BuiltinConverter, true)
        .await
        .unwrap();
    let written = std::fs::read_to_string(&output.tex_path).unwrap();
    assert_eq!(written, expected);
    assert!(written.contains("Hello world\n\nSecond page\n"));

    assert_eq!(output.stats.total_pages, 2);
    assert_eq!(output.stats.text_pages, 2);
    assert_eq!(output.stats.latex_bytes, written.len());
    assert!(!output.was_translated());
}

#[tokio::test]
async fn pages_are_joined_in_order_and_untranslated() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "three.pdf", &["Page one", "Page two", "Page three"]);
    let converter = Arc::new(CapturingConverter::default());

    let config = ConversionConfig::builder()
        .converter(converter.clone())
        .standalone(false)
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(converter.only_input(), "Page one\n\nPage two\n\nPage three\n\n");
    assert_eq!(
        std::fs::read_to_string(&output.tex_path).unwrap(),
        "Page one\n\nPage two\n\nPage three\n\n"
    );
}

#[tokio::test]
async fn latex_special_characters_are_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "cost.pdf", &["Cost: 50% & more_than $5"]);

    let config = ConversionConfig::builder().standalone(false).build().unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output.tex_path).unwrap(),
        "Cost: 50\\% \\& more\\_than \\$5\n"
    );
}

#[tokio::test]
async fn pdf_without_text_still_reaches_converting() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "scanned.pdf", &["", ""]);
    let converter = Arc::new(CapturingConverter::default());

    let config = ConversionConfig::builder()
        .converter(converter.clone())
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(converter.only_input(), "");
    assert!(output.stages.contains(&PipelineStage::Converting));
    assert_eq!(output.stats.total_pages, 2);
    assert_eq!(output.stats.text_pages, 0);
    assert!(output.tex_path.exists());
}

#[tokio::test]
async fn blank_pages_between_text_pages_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "gaps.pdf", &["First", "", "Third"]);
    let converter = Arc::new(CapturingConverter::default());

    let config = ConversionConfig::builder()
        .converter(converter.clone())
        .build()
        .unwrap();
    convert(&pdf, &config).await.unwrap();

    assert_eq!(converter.only_input(), "First\n\nThird\n\n");
}

// ── Translation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn translated_text_reaches_the_converter() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world", "Second page"]);
    let converter = Arc::new(CapturingConverter::default());

    let config = ConversionConfig::builder()
        .target_language("fr")
        .translator(Arc::new(UpperTranslator))
        .converter(converter.clone())
        .max_chunk_length(7)
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(converter.only_input(), "HELLO WORLD\n\nSECOND PAGE\n\n");
    assert_eq!(
        output.stages,
        vec![
            PipelineStage::Idle,
            PipelineStage::Extracting,
            PipelineStage::Translating,
            PipelineStage::Converting,
            PipelineStage::Done,
        ]
    );
    assert!(output.was_translated());
    // 26 chars in chunks of 7.
    assert_eq!(output.stats.chunks, 4);
    assert_eq!(output.stats.translated_chars, 26);
}

#[tokio::test]
async fn failed_chunk_fails_the_run_without_writing_tex() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let recorder = Arc::new(StageRecorder::default());

    let config = ConversionConfig::builder()
        .target_language("de")
        .translator(Arc::new(FailingTranslator))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let err = convert(&pdf, &config).await.unwrap_err();

    assert_eq!(
        *recorder.started.lock().unwrap(),
        vec![
            PipelineStage::Extracting,
            PipelineStage::Translating,
            PipelineStage::Failed
        ]
    );
    assert_eq!(
        *recorder.completed.lock().unwrap(),
        vec![PipelineStage::Extracting]
    );

    assert_eq!(err.stage(), PipelineStage::Translating);
    match err {
        Pdf2TexError::Translation(TranslationError::ChunkFailed { chunk, translator, .. }) => {
            assert_eq!(chunk, 0);
            assert_eq!(translator, "failing");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!dir.path().join("paper.tex").exists());
}

#[tokio::test]
async fn slow_chunk_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);

    let config = ConversionConfig::builder()
        .target_language("es")
        .translator(Arc::new(SlowTranslator))
        .chunk_timeout_secs(1)
        .build()
        .unwrap();
    let err = convert(&pdf, &config).await.unwrap_err();

    assert!(
        matches!(
            err,
            Pdf2TexError::Translation(TranslationError::Timeout { chunk: 0, secs: 1 })
        ),
        "got {err:?}"
    );
    assert!(!dir.path().join("paper.tex").exists());
}

#[tokio::test]
async fn cancelling_during_translation_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let token = CancellationToken::new();

    let config = ConversionConfig::builder()
        .target_language("es")
        .translator(Arc::new(SlowTranslator))
        .cancel_token(token.clone())
        .build()
        .unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });
    let err = convert(&pdf, &config).await.unwrap_err();
    canceller.await.unwrap();

    assert!(
        matches!(
            err,
            Pdf2TexError::Cancelled {
                stage: PipelineStage::Translating
            }
        ),
        "got {err:?}"
    );
}

// ── Compilation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_engine_still_ends_done_with_warning() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let recorder = Arc::new(StageRecorder::default());

    let config = ConversionConfig::builder()
        .compile(true)
        .latex_engine("pdf2tex-missing-engine")
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert!(output.tex_path.exists());
    assert_eq!(output.pdf_path, None);
    assert_eq!(
        output.compile_warning,
        Some(CompilationFailure::EngineNotFound {
            engine: "pdf2tex-missing-engine".into()
        })
    );
    assert_eq!(
        &output.stages[output.stages.len() - 2..],
        &[PipelineStage::Compiling, PipelineStage::Done]
    );
    assert_eq!(recorder.warnings.lock().unwrap().len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn engine_exiting_non_zero_still_ends_done() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);

    let config = ConversionConfig::builder()
        .compile(true)
        .latex_engine("false")
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(output.tex_path, dir.path().join("paper.tex"));
    assert!(output.tex_path.exists());
    assert_eq!(output.pdf_path, None);
    assert!(
        matches!(
            output.compile_warning,
            Some(CompilationFailure::NonZeroExit { .. })
        ),
        "got {:?}",
        output.compile_warning
    );
    assert_eq!(output.stages.last(), Some(&PipelineStage::Done));
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_callback_sees_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let recorder = Arc::new(StageRecorder::default());

    let config = ConversionConfig::builder()
        .target_language("it")
        .translator(Arc::new(UpperTranslator))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    convert(&pdf, &config).await.unwrap();

    let expected = vec![
        PipelineStage::Extracting,
        PipelineStage::Translating,
        PipelineStage::Converting,
    ];
    assert_eq!(*recorder.started.lock().unwrap(), expected);
    assert_eq!(*recorder.completed.lock().unwrap(), expected);
}

// ── Output paths ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn explicit_output_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let target = dir.path().join("build/latex/main.tex");

    let config = ConversionConfig::builder()
        .output_tex_path(&target)
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(output.tex_path, target);
    assert!(target.exists());
    assert!(!dir.path().join("paper.tex").exists());
}

#[tokio::test]
async fn rerun_overwrites_previous_tex() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    std::fs::write(dir.path().join("paper.tex"), "stale").unwrap();

    let output = convert(&pdf, &ConversionConfig::default()).await.unwrap();

    let written = std::fs::read_to_string(output.tex_path).unwrap();
    assert!(written.contains("Hello world"));
    assert!(!written.contains("stale"));
}

// ── Input errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert(dir.path().join("absent.pdf"), &ConversionConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), PipelineStage::Extracting);
    assert!(matches!(
        err,
        Pdf2TexError::DocumentOpen(DocumentOpenError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn non_pdf_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some text").unwrap();

    let err = convert(&path, &ConversionConfig::default())
        .await
        .unwrap_err();
    match err {
        Pdf2TexError::DocumentOpen(DocumentOpenError::NotAPdf { magic, .. }) => {
            assert_eq!(&magic, b"just");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!dir.path().join("notes.tex").exists());
}

#[tokio::test]
async fn truncated_pdf_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, "%PDF-1.4\nthis is not a pdf body").unwrap();

    let err = convert(&path, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            Pdf2TexError::DocumentOpen(DocumentOpenError::CorruptPdf { .. })
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn cancelled_before_start_fails_in_extracting() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);
    let token = CancellationToken::new();
    token.cancel();

    let config = ConversionConfig::builder()
        .cancel_token(token)
        .build()
        .unwrap();
    let err = convert(&pdf, &config).await.unwrap_err();
    assert!(matches!(
        err,
        Pdf2TexError::Cancelled {
            stage: PipelineStage::Extracting
        }
    ));
}

// ── Inspect / sync ───────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_reads_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titled.pdf");
    write_pdf(&path, &["a", "b", "c"], Some("A Titled Paper"));

    let meta = inspect(&path).await.unwrap();
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.pdf_version, "1.5");
    assert_eq!(meta.title.as_deref(), Some("A Titled Paper"));
    assert!(!meta.is_encrypted);
}

#[test]
fn convert_sync_runs_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fixture(dir.path(), "paper.pdf", &["Hello world"]);

    let output = convert_sync(&pdf, &ConversionConfig::default()).unwrap();
    assert!(output.tex_path.exists());
    assert_eq!(output.stats.total_pages, 1);
}
