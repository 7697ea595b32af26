//! Pipeline stages for PDF-to-LaTeX conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own; [`crate::convert`] sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ translate? ──▶ latex ──▶ compile?
//! (path)    (lopdf)     (chunked)      (markup)  (pdflatex)
//! ```
//!
//! 1. [`input`]     — check the path and `%PDF` magic, derive output paths
//! 2. [`extract`]   — per-page text via lopdf in `spawn_blocking`, cleaned by
//!    [`clean`] and joined with blank lines
//! 3. [`translate`] — fixed-size [`chunk`]s through a
//!    [`crate::translator::Translator`], reassembled in order
//! 4. [`latex`]     — [`markup`] (or pandoc) to LaTeX, atomic `.tex` write
//! 5. [`compile`]   — LaTeX engine as a child process; failures are values

pub mod chunk;
pub mod clean;
pub mod compile;
pub mod extract;
pub mod input;
pub mod latex;
pub mod markup;
pub mod translate;
