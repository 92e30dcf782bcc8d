//! Pipeline stages for PDF text and image extraction.
//!
//! Each submodule implements one step, so each can be tested on its own and
//! the PDF or OCR backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ normalize ──▶ images/ocr ──▶ assemble ──▶ chunk
//! (globs)   (pdfium)   (regex)       (png, tesseract)  (page text)  (tiktoken)
//! ```
//!
//! 1. [`input`]     — resolve paths and glob patterns, check `%PDF` magic
//! 2. [`document`]  — the backend traits every later stage reads through
//! 3. [`render`]    — pdfium implementation of those traits
//! 4. [`normalize`] — ordered regex cleanup of extracted text
//! 5. [`images`]    — colour conversion, PNG output, error artifacts
//! 6. [`ocr`]       — best-effort recognition of images and whole pages
//! 7. [`assemble`]  — page separator, image references, body selection
//! 8. [`chunk`]     — token-bounded split and file output

pub mod assemble;
pub mod chunk;
pub mod document;
pub mod images;
pub mod input;
pub mod normalize;
pub mod ocr;
pub mod render;
