//! In-memory collaborators for unit tests.

use crate::error::{ExtractError, ImageError, OcrError, PageError};
use crate::pipeline::chunk::TokenCounter;
use crate::pipeline::document::{DocumentHandle, PdfBackend, RawImage};
use crate::pipeline::ocr::OcrEngine;
use image::{DynamicImage, GrayImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One scripted page.
#[derive(Clone, Debug)]
pub(crate) struct FakePage {
    text: Result<String, String>,
    images: Option<Vec<Result<RawImage, String>>>,
    renderable: bool,
}

impl FakePage {
    pub(crate) fn text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            images: Some(Vec::new()),
            renderable: true,
        }
    }

    pub(crate) fn with_image(mut self, image: Result<RawImage, String>) -> Self {
        self.images.get_or_insert_with(Vec::new).push(image);
        self
    }

    pub(crate) fn unrenderable(mut self) -> Self {
        self.renderable = false;
        self
    }

    /// Text layer and object list both unreadable.
    pub(crate) fn broken() -> Self {
        Self {
            text: Err("damaged content stream".into()),
            images: None,
            renderable: false,
        }
    }
}

pub(crate) struct FakeDocument {
    pages: Vec<FakePage>,
    closed: Option<Arc<AtomicUsize>>,
}

impl FakeDocument {
    pub(crate) fn new(pages: Vec<FakePage>) -> Self {
        Self { pages, closed: None }
    }

    fn page(&self, page: usize) -> Result<&FakePage, PageError> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(PageError::LoadFailed {
                page,
                detail: "out of range".into(),
            })
    }
}

impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String, PageError> {
        self.page(page)?
            .text
            .clone()
            .map_err(|detail| PageError::TextFailed { page, detail })
    }

    fn page_images(&self, page: usize) -> Result<Vec<Result<RawImage, ImageError>>, PageError> {
        let images = self.page(page)?.images.clone().ok_or(PageError::LoadFailed {
            page,
            detail: "object list unreadable".into(),
        })?;
        Ok(images
            .into_iter()
            .map(|image| image.map_err(|detail| ImageError::Process { detail }))
            .collect())
    }

    fn render_page(&self, page: usize, _scale: f32) -> Result<DynamicImage, PageError> {
        if self.page(page)?.renderable {
            Ok(DynamicImage::ImageLuma8(GrayImage::new(8, 8)))
        } else {
            Err(PageError::RenderFailed {
                page,
                detail: "no renderer".into(),
            })
        }
    }

    fn close(self: Box<Self>) {
        if let Some(closed) = &self.closed {
            closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Serves scripted documents by path; unknown paths fail to open.
#[derive(Default)]
pub(crate) struct FakeBackend {
    documents: HashMap<PathBuf, Vec<FakePage>>,
    pub(crate) closed: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub(crate) fn with_document(mut self, path: &Path, pages: Vec<FakePage>) -> Self {
        self.documents.insert(path.to_path_buf(), pages);
        self
    }
}

impl PdfBackend for FakeBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        _password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentHandle + 'a>, ExtractError> {
        let pages = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| ExtractError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "no scripted document".into(),
            })?;
        Ok(Box::new(FakeDocument {
            pages,
            closed: Some(Arc::clone(&self.closed)),
        }))
    }
}

enum FakeOcrMode {
    Always(String),
    Failing,
    EchoLanguage,
}

pub(crate) struct FakeOcr {
    mode: FakeOcrMode,
}

impl FakeOcr {
    pub(crate) fn always(text: &str) -> Self {
        Self {
            mode: FakeOcrMode::Always(text.to_string()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            mode: FakeOcrMode::Failing,
        }
    }

    pub(crate) fn echo_language() -> Self {
        Self {
            mode: FakeOcrMode::EchoLanguage,
        }
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    fn recognize(&self, _image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        match &self.mode {
            FakeOcrMode::Always(text) => Ok(text.clone()),
            FakeOcrMode::Failing => Err(OcrError::EngineFailed {
                engine: "fake".into(),
                detail: "scripted failure".into(),
            }),
            FakeOcrMode::EchoLanguage => Ok(format!("lang {language}")),
        }
    }
}

/// One token per whitespace-separated word plus one per newline.
pub(crate) struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count() + text.matches('\n').count()
    }
}
