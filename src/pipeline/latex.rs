//! Structural conversion: lightweight markup → LaTeX → `.tex` file.
//!
//! The conversion itself sits behind the [`LatexConverter`] trait so a run can
//! use the native renderer, pandoc, or a caller-supplied implementation.

use crate::config::{ConversionConfig, ConverterBackend};
use crate::error::ConversionError;
use crate::pipeline::markup;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Turns lightweight markup into a LaTeX body.
#[async_trait]
pub trait LatexConverter: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Convert `markup` into LaTeX without a preamble.
    async fn to_latex(&self, markup: &str) -> Result<String, ConversionError>;
}

/// Native renderer, see [`crate::pipeline::markup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConverter;

#[async_trait]
impl LatexConverter for BuiltinConverter {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn to_latex(&self, markup: &str) -> Result<String, ConversionError> {
        markup::render_body(markup)
    }
}

/// Runs `pandoc -f markdown -t latex` with the markup on stdin.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    binary: String,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self {
            binary: "pandoc".to_string(),
        }
    }
}

impl PandocConverter {
    /// Use a specific pandoc executable instead of `pandoc` from `PATH`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn failure(&self, detail: impl Into<String>) -> ConversionError {
        ConversionError::Collaborator {
            converter: self.binary.clone(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl LatexConverter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn to_latex(&self, markup: &str) -> Result<String, ConversionError> {
        let mut child = Command::new(&self.binary)
            .args(["-f", "markdown", "-t", "latex", "--wrap=preserve"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    self.failure(format!("'{}' not found on PATH; install pandoc", self.binary))
                }
                _ => self.failure(format!("failed to start: {e}")),
            })?;

        // pandoc reads all of stdin before writing, so a sequential write
        // cannot deadlock on a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin not captured"))?;
        stdin
            .write_all(markup.as_bytes())
            .await
            .map_err(|e| self.failure(format!("writing stdin: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.failure(format!("waiting for exit: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(|e| self.failure(format!("non-UTF-8 output: {e}")))
    }
}

/// The converter a run will use: pre-built if set, otherwise from the backend.
pub fn create_converter(config: &ConversionConfig) -> Arc<dyn LatexConverter> {
    if let Some(ref converter) = config.converter {
        return Arc::clone(converter);
    }
    match config.converter_backend {
        ConverterBackend::Builtin => Arc::new(BuiltinConverter),
        ConverterBackend::Pandoc => Arc::new(PandocConverter::default()),
    }
}

const PREAMBLE: &str = r"\documentclass{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{lmodern}
\usepackage{hyperref}
\providecommand{\tightlist}{\setlength{\itemsep}{0pt}\setlength{\parskip}{0pt}}
";

/// Wrap a LaTeX body in a minimal preamble that pdflatex can compile.
pub fn standalone_document(body: &str) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + body.len() + 48);
    doc.push_str(PREAMBLE);
    doc.push_str("\n\\begin{document}\n\n");
    doc.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("\n\\end{document}\n");
    doc
}

/// Convert `markup` with `converter`, optionally wrapping it as a full document.
pub async fn render_latex(
    markup: &str,
    converter: &dyn LatexConverter,
    standalone: bool,
) -> Result<String, ConversionError> {
    debug!(
        "Converting {} chars of markup via {}",
        markup.chars().count(),
        converter.name()
    );
    let body = converter.to_latex(markup).await?;
    Ok(if standalone {
        standalone_document(&body)
    } else {
        body
    })
}

/// Write `latex` to `tex_path` as UTF-8, replacing any existing file.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated `.tex` behind.
pub async fn write_latex(latex: &str, tex_path: &Path) -> Result<(), ConversionError> {
    let write_err = |e: std::io::Error| ConversionError::OutputWriteFailed {
        path: tex_path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = tex_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tex_path.with_extension("tex.tmp");
    tokio::fs::write(&tmp_path, latex.as_bytes())
        .await
        .map_err(write_err)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, tex_path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(write_err(e));
    }

    info!("Wrote {} bytes to {}", latex.len(), tex_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_fragment_has_no_preamble() {
        let out = render_latex("Hello & goodbye", &BuiltinConverter, false)
            .await
            .unwrap();
        assert_eq!(out, "Hello \\& goodbye\n");
    }

    #[tokio::test]
    async fn standalone_wraps_body() {
        let out = render_latex("Hello", &BuiltinConverter, true).await.unwrap();
        assert!(out.starts_with("\\documentclass{article}\n"));
        assert!(out.contains("\\begin{document}\n\nHello\n\n\\end{document}\n"));
    }

    #[test]
    fn builtin_converter_from_sync_code() {
        let body = tokio_test::block_on(BuiltinConverter.to_latex("# Title")).unwrap();
        assert_eq!(body, "\\section{Title}\n");
    }

    #[test]
    fn empty_body_is_still_a_document() {
        let doc = standalone_document("");
        assert!(doc.ends_with("\\begin{document}\n\n\n\\end{document}\n"));
    }

    #[tokio::test]
    async fn missing_pandoc_is_collaborator_error() {
        let converter = PandocConverter::with_binary("pdf2tex-no-such-pandoc");
        let err = converter.to_latex("text").await.unwrap_err();
        match err {
            ConversionError::Collaborator { converter, detail } => {
                assert_eq!(converter, "pdf2tex-no-such-pandoc");
                assert!(detail.contains("not found"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn prebuilt_converter_wins_over_backend() {
        struct Named;
        #[async_trait]
        impl LatexConverter for Named {
            fn name(&self) -> &str {
                "named"
            }
            async fn to_latex(&self, markup: &str) -> Result<String, ConversionError> {
                Ok(markup.to_string())
            }
        }
        let config = ConversionConfig::builder()
            .converter_backend(ConverterBackend::Pandoc)
            .converter(Arc::new(Named))
            .build()
            .unwrap();
        assert_eq!(create_converter(&config).name(), "named");

        let config = ConversionConfig::builder()
            .converter_backend(ConverterBackend::Pandoc)
            .build()
            .unwrap();
        assert_eq!(create_converter(&config).name(), "pandoc");
    }

    #[tokio::test]
    async fn write_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/doc.tex");
        write_latex("first", &path).await.unwrap();
        write_latex("second", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tex.tmp").exists());
    }

    #[tokio::test]
    async fn unwritable_target_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_latex("x", &blocker.join("doc.tex")).await.unwrap_err();
        assert!(matches!(err, ConversionError::OutputWriteFailed { .. }));
    }
}
