//! CLI binary for pdf2tex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2tex::{
    convert, inspect, CompilationFailure, ConversionConfig, ConversionProgressCallback,
    ConverterBackend, PipelineStage, ProgressCallback, TranslatorBackend,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner per stage, switching to a chunk counter
/// while translating. Chunks complete out of order, so the bar only counts.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn chunk_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: PipelineStage) {
        let msg = match stage {
            PipelineStage::Extracting => "reading PDF text…",
            PipelineStage::Translating => "contacting translator…",
            PipelineStage::Converting => "generating LaTeX…",
            PipelineStage::Compiling => "running LaTeX engine…",
            _ => "",
        };
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        if stage == PipelineStage::Compiling {
            self.bar.finish_and_clear();
        }
    }

    fn on_translation_start(&self, total_chunks: usize) {
        self.bar.set_length(total_chunks as u64);
        self.bar.set_position(0);
        self.bar.set_style(Self::chunk_style());
        self.bar.reset_eta();
    }

    fn on_chunk_complete(&self, _chunk: usize, _total_chunks: usize, _translated_len: usize) {
        self.bar.inc(1);
    }

    fn on_compile_warning(&self, failure: &CompilationFailure) {
        let first_line = failure.to_string();
        let first_line = first_line.lines().next().unwrap_or_default();
        self.bar
            .println(format!("  {} {}", yellow("⚠"), yellow(first_line)));
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to paper.tex beside the input
  pdf2tex paper.pdf

  # Translate to French and typeset
  pdf2tex paper.pdf -t fr --compile

  # Explicit output path, bare LaTeX fragment
  pdf2tex paper.pdf -o build/body.tex --fragment

  # Translate with an LLM instead of Google Translate
  pdf2tex paper.pdf -t de --translator llm --provider openai --model gpt-4.1-mini

  # Use pandoc for the markup conversion, xelatex for typesetting
  pdf2tex paper.pdf --converter pandoc --compile --engine xelatex

  # Inspect PDF metadata only
  pdf2tex --inspect-only paper.pdf

  # JSON run report
  pdf2tex --json paper.pdf > report.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (--translator llm)
  ANTHROPIC_API_KEY       Anthropic API key (--translator llm)
  GEMINI_API_KEY          Google Gemini API key (--translator llm)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Tracing filter, e.g. pdf2tex=debug

EXIT STATUS:
  0 when the .tex file was written, even if --compile failed (a warning is
  printed). Non-zero when extraction, translation or conversion failed.
"#;

/// Convert PDF files to LaTeX, optionally translating and typesetting them.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tex",
    version,
    about = "Convert PDF files to LaTeX, with optional translation and compilation",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write LaTeX to this file instead of <input>.tex.
    #[arg(short, long, env = "PDF2TEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Translate the text into this language (e.g. fr, de, zh-CN).
    #[arg(short = 't', long = "target-language", env = "PDF2TEX_TARGET_LANGUAGE")]
    target_language: Option<String>,

    /// Source language, or `auto` to detect.
    #[arg(long, env = "PDF2TEX_SOURCE_LANGUAGE", default_value = "auto")]
    source_language: String,

    /// Translation service.
    #[arg(long, env = "PDF2TEX_TRANSLATOR", value_enum, default_value = "google")]
    translator: TranslatorArg,

    /// LLM provider for --translator llm: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID for --translator llm (default: gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Maximum characters per translation request.
    #[arg(long, env = "PDF2TEX_CHUNK_SIZE", default_value_t = pdf2tex::DEFAULT_MAX_CHUNK_LENGTH)]
    chunk_size: usize,

    /// Number of concurrent translation requests.
    #[arg(short, long, env = "PDF2TEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-chunk translation timeout in seconds.
    #[arg(long, env = "PDF2TEX_CHUNK_TIMEOUT", default_value_t = 60)]
    chunk_timeout: u64,

    /// Retries per chunk before translation aborts.
    #[arg(long, env = "PDF2TEX_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Markup-to-LaTeX converter.
    #[arg(long, env = "PDF2TEX_CONVERTER", value_enum, default_value = "builtin")]
    converter: ConverterArg,

    /// Write only the LaTeX body, without preamble and document environment.
    #[arg(long, env = "PDF2TEX_FRAGMENT")]
    fragment: bool,

    /// Typeset the .tex file into a PDF.
    #[arg(long, env = "PDF2TEX_COMPILE")]
    compile: bool,

    /// LaTeX engine used by --compile.
    #[arg(long, env = "PDF2TEX_ENGINE", default_value = "pdflatex")]
    engine: String,

    /// LaTeX engine timeout in seconds.
    #[arg(long, env = "PDF2TEX_COMPILE_TIMEOUT", default_value_t = 120)]
    compile_timeout: u64,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON report (ConversionOutput) instead of a summary.
    #[arg(long, env = "PDF2TEX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2TEX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TranslatorArg {
    Google,
    Llm,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ConverterArg {
    Builtin,
    Pandoc,
}

impl From<ConverterArg> for ConverterBackend {
    fn from(v: ConverterArg) -> Self {
        match v {
            ConverterArg::Builtin => ConverterBackend::Builtin,
            ConverterArg::Pandoc => ConverterBackend::Pandoc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!("Encrypted:    {}", meta.is_encrypted);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    // Ctrl-C stops translation or a running LaTeX engine cleanly.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let config = build_config(&cli, progress_cb, cancel)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;
    drop(config);

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(ref warning) = output.compile_warning {
        // Printed even with --quiet: the user asked for a PDF and got none.
        eprintln!("{} {}", yellow("⚠"), yellow(&warning.to_string()));
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            output.stats.total_pages,
            output.stats.total_duration_ms,
            bold(&output.tex_path.display().to_string()),
        );
        if output.was_translated() {
            eprintln!(
                "   {} chunks, {} → {} chars",
                dim(&output.stats.chunks.to_string()),
                dim(&output.stats.extracted_chars.to_string()),
                dim(&output.stats.translated_chars.to_string()),
            );
        }
        if let Some(ref pdf) = output.pdf_path {
            eprintln!("   {} {}", cyan("PDF"), bold(&pdf.display().to_string()));
        }
        if output.stats.text_pages == 0 {
            eprintln!(
                "   {}",
                yellow("no extractable text; the PDF may contain only scanned images")
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
) -> Result<ConversionConfig> {
    let translator_backend = match cli.translator {
        TranslatorArg::Google => TranslatorBackend::Google,
        TranslatorArg::Llm => TranslatorBackend::Llm {
            provider: cli.provider.clone(),
            model: cli.model.clone(),
        },
    };

    let mut builder = ConversionConfig::builder()
        .source_language(cli.source_language.clone())
        .max_chunk_length(cli.chunk_size)
        .translator_backend(translator_backend)
        .translation_concurrency(cli.concurrency)
        .chunk_timeout_secs(cli.chunk_timeout)
        .max_retries(cli.max_retries)
        .converter_backend(cli.converter.clone().into())
        .standalone(!cli.fragment)
        .compile(cli.compile)
        .latex_engine(cli.engine.clone())
        .compile_timeout_secs(cli.compile_timeout)
        .cancel_token(cancel);

    if let Some(ref lang) = cli.target_language {
        builder = builder.target_language(lang.clone());
    }
    if let Some(ref out) = cli.output {
        builder = builder.output_tex_path(out.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
