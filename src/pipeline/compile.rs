//! Typesetting: run the LaTeX engine on the written `.tex` file.
//!
//! Compilation never fails the run. Every failure mode is folded into
//! [`CompileOutcome::Failure`] and the `.tex` artifact stays on disk.
//! Auxiliary files (`.aux`, `.log`, …) are left beside the source.

use crate::error::CompilationFailure;
use crate::pipeline::input::pdf_path_for;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lines of engine output kept in [`CompilationFailure::NonZeroExit`].
const LOG_TAIL_LINES: usize = 20;

/// Result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The engine exited 0. The PDF's existence is not checked.
    Success { pdf_path: PathBuf },
    Failure(CompilationFailure),
}

/// Run `<engine> -interaction=nonstopmode -halt-on-error <file>.tex` in the
/// directory that holds `tex_path`.
pub async fn compile_latex(
    tex_path: &Path,
    engine: &str,
    timeout_secs: u64,
    cancel: Option<&CancellationToken>,
) -> CompileOutcome {
    let workdir = match tex_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = tex_path.file_name().unwrap_or(tex_path.as_os_str());

    info!("Compiling {} with {}", tex_path.display(), engine);
    let child = Command::new(engine)
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg(file_name)
        .current_dir(&workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return failure(CompilationFailure::EngineNotFound {
                engine: engine.to_string(),
            });
        }
        Err(e) => {
            return failure(CompilationFailure::SpawnFailed {
                engine: engine.to_string(),
                detail: e.to_string(),
            });
        }
    };

    // Dropping the wait future on timeout or cancel kills the child.
    let run = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output());
    let result = match cancel {
        Some(token) => tokio::select! {
            r = run => r,
            _ = token.cancelled() => return failure(CompilationFailure::Cancelled),
        },
        None => run.await,
    };

    let output = match result {
        Err(_) => {
            return failure(CompilationFailure::TimedOut {
                engine: engine.to_string(),
                secs: timeout_secs,
            });
        }
        Ok(Err(e)) => {
            return failure(CompilationFailure::SpawnFailed {
                engine: engine.to_string(),
                detail: e.to_string(),
            });
        }
        Ok(Ok(output)) => output,
    };

    if output.status.success() {
        let pdf_path = pdf_path_for(tex_path);
        debug!("{} exited 0, expecting {}", engine, pdf_path.display());
        return CompileOutcome::Success { pdf_path };
    }

    let code = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    log.push_str(&String::from_utf8_lossy(&output.stderr));

    failure(CompilationFailure::NonZeroExit {
        engine: engine.to_string(),
        code,
        log_tail: log_tail(&log, LOG_TAIL_LINES),
    })
}

fn failure(f: CompilationFailure) -> CompileOutcome {
    warn!("Compilation failed: {}", f);
    CompileOutcome::Failure(f)
}

/// Last `n` non-blank lines of `log`.
fn log_tail(log: &str, n: usize) -> String {
    let lines: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
