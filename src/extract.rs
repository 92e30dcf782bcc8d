//! Per-document extraction: open, walk the pages, assemble, chunk, write.
//!
//! [`Extractor`] owns the three collaborators (PDF backend, optional OCR,
//! token counter) and is reused across every file of a batch. A document is
//! processed strictly in page order. Failures below the document level never
//! escape: unreadable pages become empty blocks, bad images become error
//! artifacts, OCR failures fall back to native text.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{FileReport, PageReport};
use crate::pipeline::assemble::{assemble_page, BodySource};
use crate::pipeline::chunk::{split_into_chunks, write_chunks, TiktokenCounter, TokenCounter};
use crate::pipeline::document::{DocumentHandle, PdfBackend};
use crate::pipeline::images::{extract_page_images, ExtractedImage, ImageStatus};
use crate::pipeline::input::{default_output_dir, pdf_stem, validate_pdf};
use crate::pipeline::normalize::clean_extracted_text;
use crate::pipeline::ocr::{OcrAdapter, OcrEngine, TesseractCli};
use crate::pipeline::render::PdfiumBackend;
use crate::progress::ExtractionProgressCallback;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the image folder inside each output directory.
pub const IMAGES_DIR_NAME: &str = "extracted_images";

/// Everything pulled out of one PDF, before chunking.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Concatenated page blocks.
    pub text: String,
    /// Every image slot in page order, saved or failed.
    pub images: Vec<ExtractedImage>,
    pub pages: Vec<PageReport>,
}

/// Runs the extraction pipeline with a fixed set of collaborators.
pub struct Extractor {
    config: ExtractionConfig,
    backend: Box<dyn PdfBackend>,
    ocr: Option<OcrAdapter>,
    tokenizer: Box<dyn TokenCounter>,
}

impl Extractor {
    /// Bind pdfium, load the tokenizer and, when OCR is enabled, probe
    /// `tesseract`. A missing OCR engine disables OCR with a warning.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        let backend = PdfiumBackend::bind(config.pdfium_library_path.as_deref())?;
        let tokenizer = TiktokenCounter::new(config.encoding)?;
        debug!("Tokenizer: {}", tokenizer.encoding().as_str());

        let ocr_engine: Option<Box<dyn OcrEngine>> = if config.ocr.enabled {
            let tesseract = TesseractCli::default();
            if tesseract.is_available() {
                Some(Box::new(tesseract))
            } else {
                warn!("OCR requested but tesseract is not installed; continuing without OCR");
                None
            }
        } else {
            None
        };

        Ok(Self::from_parts(
            config,
            Box::new(backend),
            ocr_engine,
            Box::new(tokenizer),
        ))
    }

    /// Assemble an extractor from explicit collaborators. `ocr_engine` is
    /// ignored unless `config.ocr.enabled` is set.
    pub fn from_parts(
        config: ExtractionConfig,
        backend: Box<dyn PdfBackend>,
        ocr_engine: Option<Box<dyn OcrEngine>>,
        tokenizer: Box<dyn TokenCounter>,
    ) -> Self {
        let ocr = if config.ocr.enabled {
            ocr_engine.map(|engine| OcrAdapter::new(engine, config.ocr.language.clone()))
        } else {
            None
        };
        if let Some(adapter) = &ocr {
            info!(
                "OCR enabled: {} ({})",
                adapter.engine_name(),
                adapter.language()
            );
        }

        Self {
            config,
            backend,
            ocr,
            tokenizer,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Whether OCR will actually run.
    pub fn ocr_active(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract text and images of `pdf`, writing images under
    /// `{output_dir}/extracted_images/`.
    pub fn extract_document(
        &self,
        pdf: &Path,
        output_dir: &Path,
        progress: &dyn ExtractionProgressCallback,
    ) -> Result<ExtractedDocument, ExtractError> {
        validate_pdf(pdf)?;

        let images_dir = output_dir.join(IMAGES_DIR_NAME);
        std::fs::create_dir_all(&images_dir).map_err(|source| ExtractError::OutputDirFailed {
            path: images_dir.clone(),
            source,
        })?;

        let document = self.backend.open(pdf, self.config.password.as_deref())?;
        let total_pages = document.page_count();
        info!("{}: {} pages", pdf.display(), total_pages);
        progress.on_document_open(pdf, total_pages);

        let mut extracted = ExtractedDocument {
            text: String::new(),
            images: Vec::new(),
            pages: Vec::with_capacity(total_pages),
        };

        for page in 1..=total_pages {
            let (text, images, report) = self.process_page(document.as_ref(), page, &images_dir);
            for image in &images {
                if let ImageStatus::Failed(e) = &image.status {
                    progress.on_image_error(page, &image.file_name, &e.to_string());
                }
            }
            extracted.text.push_str(&text);
            extracted.images.extend(images);
            extracted.pages.push(report);
            progress.on_page_complete(page, total_pages);
        }

        document.close();
        Ok(extracted)
    }

    fn process_page(
        &self,
        document: &dyn DocumentHandle,
        page: usize,
        images_dir: &Path,
    ) -> (String, Vec<ExtractedImage>, PageReport) {
        let mut error = None;
        let native = match document.page_text(page) {
            Ok(raw) => clean_extracted_text(&raw),
            Err(e) => {
                warn!("{}", e);
                error = Some(e.to_string());
                String::new()
            }
        };
        let native_chars = native.chars().count();

        let images = extract_page_images(document, page, images_dir, self.ocr.as_ref());

        let settings = &self.config.ocr;
        let page_ocr = match &self.ocr {
            Some(adapter) if settings.needs_page_ocr(native_chars) => {
                if settings.is_mostly_images(native_chars) {
                    debug!("Page {} appears to be mostly images, applying OCR", page);
                } else {
                    debug!("Page {} has little text ({} chars), applying OCR", page, native_chars);
                }
                Some(adapter.recognize_page(document, page, settings.page_render_scale))
            }
            _ => None,
        };

        let assembled = assemble_page(page, &images, &native, page_ocr.as_ref());
        if assembled.body_source == BodySource::Ocr {
            debug!("Page {}: OCR text replaces native text", page);
        }

        let images_saved = images.iter().filter(|i| i.is_saved()).count();
        let report = PageReport {
            page,
            native_chars,
            images_saved,
            image_errors: images.len() - images_saved,
            page_ocr: page_ocr.is_some(),
            body_source: assembled.body_source,
            error,
        };
        (assembled.text, images, report)
    }

    /// Full per-file pipeline. `output_dir` defaults to
    /// `{root or parent}/{stem}_extracted`.
    pub fn process_pdf(
        &self,
        pdf: &Path,
        output_dir: Option<&Path>,
        progress: &dyn ExtractionProgressCallback,
    ) -> Result<FileReport, ExtractError> {
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_output_dir(pdf, self.config.output_root.as_deref()),
        };
        info!("Processing: {}", pdf.display());

        let extracted = self.extract_document(pdf, &output_dir, progress)?;

        let chunks = split_into_chunks(
            &extracted.text,
            self.config.max_tokens,
            self.tokenizer.as_ref(),
        );
        let text_files = write_chunks(
            &chunks,
            &pdf_stem(pdf),
            &output_dir,
            self.tokenizer.as_ref(),
        )?;
        let total_tokens = self.tokenizer.count(&extracted.text);

        let images_saved = extracted.images.iter().filter(|i| i.is_saved()).count();
        let report = FileReport {
            pdf: pdf.to_path_buf(),
            output_dir,
            text_files,
            images_saved,
            image_errors: extracted.images.len() - images_saved,
            total_tokens,
            pages: extracted.pages,
        };

        info!(
            "Done: {} text file(s), {} image(s), {} tokens",
            report.text_files.len(),
            report.images_saved,
            report.total_tokens
        );
        progress.on_file_complete(&report);
        Ok(report)
    }
}
