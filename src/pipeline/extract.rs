//! Text extraction: PDF pages → one plain-text document.
//!
//! lopdf parses the whole file up front and decodes each page's content
//! stream on demand. Both steps are CPU-bound and synchronous, so they run on
//! tokio's blocking pool.
//!
//! Pages without a text layer (scanned images, blank pages) yield an empty
//! fragment. That is a silent degradation, not an error: a fully scanned PDF
//! produces an empty [`ExtractedText`] and the pipeline carries on.

use crate::error::DocumentOpenError;
use crate::output::DocumentMetadata;
use crate::pipeline::clean::clean_fragment;
use lopdf::{Dictionary, Document, Object};
use std::path::Path;
use tracing::{debug, warn};

/// Appended after every non-blank page fragment.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// The text of a whole document, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Fragments joined as `fragment + "\n\n"` for every non-blank page.
    pub text: String,
    /// Cleaned per-page fragments, one per page, blank pages included.
    pub fragments: Vec<String>,
}

impl ExtractedText {
    /// Assemble the document text from per-page fragments.
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        let mut text = String::with_capacity(fragments.iter().map(|f| f.len() + 2).sum());
        for fragment in fragments.iter().filter(|f| !f.is_empty()) {
            text.push_str(fragment);
            text.push_str(PARAGRAPH_SEPARATOR);
        }
        Self { text, fragments }
    }

    pub fn page_count(&self) -> usize {
        self.fragments.len()
    }

    /// Pages that contributed text.
    pub fn text_pages(&self) -> usize {
        self.fragments.iter().filter(|f| !f.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Open `path` and extract every page's text, plus document metadata.
pub async fn extract_text(
    path: &Path,
) -> Result<(ExtractedText, DocumentMetadata), DocumentOpenError> {
    let path = path.to_path_buf();
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || {
        let (doc, metadata) = load_document(&task_path)?;
        let extracted = extract_pages(&doc);
        Ok((extracted, metadata))
    })
    .await
    .map_err(|e| DocumentOpenError::CorruptPdf {
        path,
        detail: format!("extraction task failed: {e}"),
    })?
}

/// Read document metadata without extracting any text.
pub async fn read_metadata(path: &Path) -> Result<DocumentMetadata, DocumentOpenError> {
    let path = path.to_path_buf();
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || load_document(&task_path).map(|(_, meta)| meta))
        .await
        .map_err(|e| DocumentOpenError::CorruptPdf {
            path,
            detail: format!("metadata task failed: {e}"),
        })?
}

fn load_document(path: &Path) -> Result<(Document, DocumentMetadata), DocumentOpenError> {
    let mut doc = Document::load(path).map_err(|e| DocumentOpenError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let is_encrypted = doc.is_encrypted();
    if is_encrypted {
        // Many PDFs are "encrypted" only to set permission flags, with an
        // empty user password.
        if doc.decrypt("").is_err() {
            return Err(DocumentOpenError::Encrypted {
                path: path.to_path_buf(),
            });
        }
        debug!("Decrypted {} with empty password", path.display());
    }

    let metadata = document_metadata(&doc, is_encrypted);
    Ok((doc, metadata))
}

/// Extract and clean every page in page order.
fn extract_pages(doc: &Document) -> ExtractedText {
    let pages = doc.get_pages();
    let mut fragments = Vec::with_capacity(pages.len());

    for page_num in pages.keys() {
        let raw = match doc.extract_text(&[*page_num]) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Page {}: text extraction failed, treating as blank: {}", page_num, e);
                String::new()
            }
        };
        let fragment = clean_fragment(&raw);
        debug!("Page {}: {} chars", page_num, fragment.chars().count());
        fragments.push(fragment);
    }

    let extracted = ExtractedText::from_fragments(fragments);
    if extracted.is_empty() && extracted.page_count() > 0 {
        warn!(
            "No extractable text in {} pages; the PDF is probably scanned images",
            extracted.page_count()
        );
    }
    extracted
}

fn document_metadata(doc: &Document, is_encrypted: bool) -> DocumentMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| doc.dereference(obj).ok())
        .and_then(|(_, obj)| obj.as_dict().ok());

    let field = |key: &[u8]| info.and_then(|dict| info_string(dict, key));

    DocumentMetadata {
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        is_encrypted,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok().and_then(|o: &Object| o.as_str().ok())?;
    let s = decode_pdf_string(bytes);
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise UTF-8 / Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_join_with_trailing_separator() {
        let t = ExtractedText::from_fragments(vec!["Hello world".into(), "Second page".into()]);
        assert_eq!(t.text, "Hello world\n\nSecond page\n\n");
        assert_eq!(t.page_count(), 2);
        assert_eq!(t.text_pages(), 2);
    }

    #[test]
    fn blank_pages_contribute_nothing() {
        let t = ExtractedText::from_fragments(vec!["".into(), "only".into(), "".into()]);
        assert_eq!(t.text, "only\n\n");
        assert_eq!(t.page_count(), 3);
        assert_eq!(t.text_pages(), 1);
    }

    #[test]
    fn all_blank_is_empty() {
        let t = ExtractedText::from_fragments(vec!["".into(), "".into()]);
        assert!(t.is_empty());
    }

    #[test]
    fn utf16_info_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'C', 0x00, 0xE9];
        assert_eq!(decode_pdf_string(&bytes), "Cé");
    }

    #[test]
    fn latin1_info_string() {
        assert_eq!(decode_pdf_string(&[b'c', 0xE9]), "cé");
    }
}
