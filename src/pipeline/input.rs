//! Input validation and artifact path derivation.
//!
//! The input is checked before lopdf sees it so callers get a precise
//! [`DocumentOpenError`] (missing, unreadable, not a PDF) instead of a
//! generic parse failure. Output paths are derived from the input path alone,
//! so two runs on the same document always write to the same place.

use crate::error::DocumentOpenError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` names a readable file starting with `%PDF`.
pub fn validate_input(path: &Path) -> Result<PathBuf, DocumentOpenError> {
    if !path.is_file() {
        return Err(DocumentOpenError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let mut read = 0;
            while read < magic.len() {
                match f.read(&mut magic[read..]) {
                    Ok(0) => break,
                    Ok(n) => read += n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                        return Err(DocumentOpenError::PermissionDenied {
                            path: path.to_path_buf(),
                        })
                    }
                    Err(e) => {
                        return Err(DocumentOpenError::CorruptPdf {
                            path: path.to_path_buf(),
                            detail: e.to_string(),
                        })
                    }
                }
            }
            if &magic != b"%PDF" {
                return Err(DocumentOpenError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocumentOpenError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(DocumentOpenError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// `<base>.tex` beside the input, unless an explicit path was given.
pub fn tex_path_for(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => input.with_extension("tex"),
    }
}

/// The PDF a LaTeX engine writes for `tex_path`: same base name, `.pdf`.
pub fn pdf_path_for(tex_path: &Path) -> PathBuf {
    tex_path.with_extension("pdf")
}
