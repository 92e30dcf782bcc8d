//! Error types for the pdf2chunks library.
//!
//! Four error types mirror the four failure granularities of the pipeline:
//!
//! * [`ExtractError`] — **Fatal** for one file (missing input, unreadable
//!   PDF, output directory not writable) or for the whole run (no input
//!   matched, pdfium cannot be bound). Returned as `Err(ExtractError)`.
//!
//! * [`PageError`] — a page could not be read (text layer, image list or
//!   rasterisation). Logged; the page continues with what is available.
//!
//! * [`ImageError`] — a single embedded image could not be decoded,
//!   converted or saved. Recorded next to the image as an `_ERROR.txt`
//!   artifact and stored in [`crate::pipeline::images::ImageStatus`].
//!
//! * [`OcrError`] — recognition failed. Folded into
//!   [`crate::pipeline::ocr::OcrOutcome::Failed`] and never raised.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the pdf2chunks library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// None of the input patterns resolved to an existing PDF file.
    #[error("No PDF files found for: {}", patterns.join(", "))]
    NoInputFiles { patterns: Vec<String> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be opened.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory tree.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write an output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The tokenizer ranks could not be loaded.
    #[error("Failed to load tokenizer '{encoding}': {detail}")]
    TokenizerUnavailable { encoding: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install libpdfium system-wide, or place it next to the executable.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A page-level read failure. The page is still assembled from whatever
/// could be read.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page could not be loaded at all.
    #[error("Page {page}: could not be loaded: {detail}")]
    LoadFailed { page: usize, detail: String },

    /// The native text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextFailed { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },
}

/// A failure for one embedded image.
///
/// The `Display` text is what ends up inside the `_ERROR.txt` artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Pixel data could not be obtained from the document.
    #[error("ERROR: Failed to process image - {detail}")]
    Process { detail: String },

    /// The colour space could not be converted to RGB.
    #[error("ERROR: Failed to convert image with colorspace {color_space} - {detail}")]
    Conversion { color_space: String, detail: String },

    /// The PNG could not be written.
    #[error("ERROR: Failed to save image - {detail}")]
    Save { detail: String },
}

/// OCR failures. Never surfaced to callers of the pipeline; see
/// [`crate::pipeline::ocr::OcrOutcome`].
#[derive(Debug, Error)]
pub enum OcrError {
    /// The recognizer binary could not be started.
    #[error("OCR engine '{engine}' is not available: {detail}")]
    Unavailable { engine: String, detail: String },

    /// The recognizer ran but reported a failure.
    #[error("OCR engine '{engine}' failed: {detail}")]
    EngineFailed { engine: String, detail: String },

    /// The image could not be handed to the recognizer.
    #[error("Could not prepare image for OCR: {0}")]
    Input(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_files_lists_patterns() {
        let e = ExtractError::NoInputFiles {
            patterns: vec!["a.pdf".into(), "docs/*.pdf".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("a.pdf, docs/*.pdf"), "got: {msg}");
    }

    #[test]
    fn image_conversion_display_is_artifact_text() {
        let e = ImageError::Conversion {
            color_space: "DeviceN".into(),
            detail: "unsupported".into(),
        };
        assert_eq!(
            e.to_string(),
            "ERROR: Failed to convert image with colorspace DeviceN - unsupported"
        );
    }

    #[test]
    fn image_save_display() {
        let e = ImageError::Save {
            detail: "disk full".into(),
        };
        assert_eq!(e.to_string(), "ERROR: Failed to save image - disk full");
    }

    #[test]
    fn page_error_display_mentions_page() {
        let e = PageError::RenderFailed {
            page: 4,
            detail: "bitmap".into(),
        };
        assert!(e.to_string().starts_with("Page 4:"));
    }

    #[test]
    fn ocr_error_display_names_engine() {
        let e = OcrError::EngineFailed {
            engine: "tesseract".into(),
            detail: "exit status 1".into(),
        };
        assert!(e.to_string().contains("tesseract"));
        assert!(e.to_string().contains("exit status 1"));
    }
}
