//! # pdf2chunks
//!
//! Extract text and embedded images from PDF documents and write the text as
//! token-bounded chunks, ready to feed to a language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve paths / globs, check the %PDF magic
//!  ├─ 2. Open       pdfium document handle (closed when the file is done)
//!  ├─ 3. Per page   native text ─▶ regex cleanup
//!  │                embedded images ─▶ RGB ─▶ PNG (or an _ERROR.txt artifact)
//!  │                optional tesseract OCR of images and text-poor pages
//!  ├─ 4. Assemble   "--- Page n ---", [IMAGE: …] refs, body text
//!  └─ 5. Chunk      greedy line packing under a tiktoken budget ─▶ .txt files
//! ```
//!
//! Output for `report.pdf` lands in `report_extracted/`:
//! `report.txt` (or `report_part_1.txt`, `report_part_2.txt`, …) and
//! `extracted_images/page_{p}_image_{i}.png`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2chunks::{ExtractionConfig, Extractor, NoopProgressCallback};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().max_tokens(8_000).build()?;
//!     let extractor = Extractor::new(config)?;
//!     let report = extractor.process_pdf(Path::new("report.pdf"), None, &NoopProgressCallback)?;
//!     eprintln!("{} files, {} tokens", report.text_files.len(), report.total_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2chunks` and `pdf2chunks-form` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2chunks = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! - The pdfium shared library, found via `PDFIUM_LIB_PATH`, next to the
//!   executable, or system-wide.
//! - For OCR, the `tesseract` executable with the wanted language packs.
//!   Without it, OCR is skipped with a warning.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{collect_inputs, run_batch};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, OcrSettings, TokenizerEncoding};
pub use error::{ExtractError, ImageError, OcrError, PageError};
pub use extract::{ExtractedDocument, Extractor};
pub use output::{BatchSummary, FileFailure, FileReport, PageReport};
pub use pipeline::chunk::{TiktokenCounter, TokenCounter};
pub use pipeline::document::{ColorSpace, DocumentHandle, PdfBackend, RawImage};
pub use pipeline::normalize::clean_extracted_text;
pub use pipeline::ocr::{OcrEngine, OcrOutcome, TesseractCli};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback};
pub use session::{spawn_session, spawn_session_with, ExtractionRequest, FormError, FormState, SessionEvent};
