//! OCR: best-effort text recognition for images and scanned pages.
//!
//! Recognition is delegated to an [`OcrEngine`]; the production engine is the
//! `tesseract` executable. [`OcrAdapter`] is what the pipeline calls: it
//! passes the configured language through, cleans the result with the same
//! rules as native text, and turns every failure into
//! [`OcrOutcome::Failed`] so a bad page never stops the document.

use crate::error::OcrError;
use crate::pipeline::document::DocumentHandle;
use crate::pipeline::normalize::clean_extracted_text;
use image::{DynamicImage, ImageFormat};
use std::process::Command;
use tracing::{debug, warn};

/// A text recognizer.
pub trait OcrEngine {
    /// Short engine name for logs and errors.
    fn name(&self) -> &str;

    /// Recognise text in `image` using `language` (`+`-joined codes).
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// Result of one recognition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// Cleaned recognised text; may be empty when the image holds no text.
    Recognized(String),
    /// Recognition failed; the reason was logged.
    Failed { reason: String },
}

impl OcrOutcome {
    /// Recognised text, empty for failures.
    pub fn text(&self) -> &str {
        match self {
            OcrOutcome::Recognized(text) => text,
            OcrOutcome::Failed { .. } => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OcrOutcome::Failed { .. })
    }
}

/// Pipeline-facing OCR: engine + language + cleanup + failure folding.
pub struct OcrAdapter {
    engine: Box<dyn OcrEngine>,
    language: String,
}

impl OcrAdapter {
    pub fn new(engine: Box<dyn OcrEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Recognise text in an arbitrary image.
    pub fn recognize_image(&self, image: &DynamicImage) -> OcrOutcome {
        match self.engine.recognize(image, &self.language) {
            Ok(text) => OcrOutcome::Recognized(clean_extracted_text(&text)),
            Err(e) => {
                warn!("OCR failed: {}", e);
                OcrOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Rasterise `page` at `scale` and recognise the whole rendering.
    pub fn recognize_page(
        &self,
        document: &dyn DocumentHandle,
        page: usize,
        scale: f32,
    ) -> OcrOutcome {
        match document.render_page(page, scale) {
            Ok(image) => {
                let outcome = self.recognize_image(&image);
                debug!(
                    "Page {}: OCR yielded {} chars",
                    page,
                    outcome.text().chars().count()
                );
                outcome
            }
            Err(e) => {
                warn!("OCR skipped: {}", e);
                OcrOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ── Tesseract ────────────────────────────────────────────────────────────────

/// [`OcrEngine`] backed by the `tesseract` command-line program.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
        }
    }
}

impl TesseractCli {
    /// Use a specific executable instead of `tesseract` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the executable can be started.
    pub fn is_available(&self) -> bool {
        let ok = Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false);
        if !ok {
            debug!("{} not found - install tesseract-ocr for OCR support", self.program);
        }
        ok
    }

    /// Installed language packs, as reported by `tesseract --list-langs`.
    pub fn available_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.program)
            .arg("--list-langs")
            .output()
            .map_err(|e| OcrError::Unavailable {
                engine: self.program.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                engine: self.program.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Older versions print the list on stderr.
        let listing = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(parse_language_list(&String::from_utf8_lossy(&listing)))
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("pdf2chunks-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Input(e.to_string()))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Input(e.to_string()))?;

        let output = Command::new(&self.program)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output()
            .map_err(|e| OcrError::Unavailable {
                engine: self.program.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                engine: self.program.clone(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `--list-langs` output: a header line followed by one code per line.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeOcr, FakePage};
    use image::GrayImage;

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::new(4, 4))
    }

    #[test]
    fn recognized_text_is_cleaned() {
        let adapter = OcrAdapter::new(Box::new(FakeOcr::always("  Scanned  text .more\n\n\n\nend ")), "eng");
        assert_eq!(
            adapter.recognize_image(&blank()),
            OcrOutcome::Recognized("Scanned text. More\n\nend".into())
        );
    }

    #[test]
    fn engine_failure_becomes_failed_outcome() {
        let adapter = OcrAdapter::new(Box::new(FakeOcr::failing()), "eng");
        let outcome = adapter.recognize_image(&blank());
        assert!(outcome.is_failed());
        assert_eq!(outcome.text(), "");
    }

    #[test]
    fn language_is_passed_through() {
        let engine = FakeOcr::echo_language();
        let adapter = OcrAdapter::new(Box::new(engine), "eng+vie");
        assert_eq!(adapter.recognize_image(&blank()).text(), "lang eng+vie");
    }

    #[test]
    fn page_render_failure_is_folded() {
        let doc = FakeDocument::new(vec![FakePage::text("").unrenderable()]);
        let adapter = OcrAdapter::new(Box::new(FakeOcr::always("never")), "eng");
        let outcome = adapter.recognize_page(&doc, 1, 2.0);
        assert!(outcome.is_failed());
    }

    #[test]
    fn page_ocr_uses_rendering() {
        let doc = FakeDocument::new(vec![FakePage::text("")]);
        let adapter = OcrAdapter::new(Box::new(FakeOcr::always("Page scan")), "eng");
        assert_eq!(adapter.recognize_page(&doc, 1, 2.0).text(), "Page scan");
    }

    #[test]
    fn missing_tesseract_binary_is_unavailable() {
        let engine = TesseractCli::with_program("pdf2chunks-no-such-ocr-binary");
        assert!(!engine.is_available());
        assert!(matches!(
            engine.recognize(&blank(), "eng"),
            Err(OcrError::Unavailable { .. })
        ));
    }

    #[test]
    fn parse_language_listing() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\nvie\n";
        assert_eq!(parse_language_list(listing), vec!["eng", "osd", "vie"]);
    }
}
