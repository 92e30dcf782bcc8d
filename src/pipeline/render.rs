//! pdfium-backed document access: text, embedded images, rasterisation.
//!
//! pdfium decodes image XObjects itself (all filters, all colour spaces) and
//! hands back a `DynamicImage`; [`RawImage::from_decoded`] turns that into the
//! pipeline's pixel model and keeps the colour space the PDF declared, so a
//! CMYK source still counts as converted.
//!
//! Page text is returned as pdfium produces it (CRLF line breaks); cleanup
//! is the normaliser's job. Everything here is blocking and single-threaded:
//! the `thread_safe` feature of `pdfium-render` serialises calls, which is all
//! the one-document-at-a-time pipeline needs.

use crate::error::{ExtractError, ImageError, PageError};
use crate::pipeline::document::{ColorSpace, DocumentHandle, PdfBackend, RawImage};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// [`PdfBackend`] over a bound pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to pdfium.
    ///
    /// `library_path` may name the library file itself or the directory that
    /// contains it. Without it, the current directory is tried first, then
    /// the system library search path.
    pub fn bind(library_path: Option<&Path>) -> Result<Self, ExtractError> {
        let bindings = match library_path {
            Some(path) if path.is_dir() => {
                Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(path))
            }
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;

        debug!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentHandle + 'a>, ExtractError> {
        let document = self.pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ExtractError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    ExtractError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                ExtractError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        info!(
            "PDF loaded: {} ({} pages)",
            path.display(),
            document.pages().len()
        );

        Ok(Box::new(PdfiumDocument {
            path: path.to_path_buf(),
            document,
        }))
    }
}

struct PdfiumDocument<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn load_page(&self, page: usize) -> Result<PdfPage<'a>, PageError> {
        let index = page
            .checked_sub(1)
            .and_then(|i| i.try_into().ok())
            .ok_or_else(|| PageError::LoadFailed {
                page,
                detail: "page number out of range".into(),
            })?;

        self.document
            .pages()
            .get(index)
            .map_err(|e| PageError::LoadFailed {
                page,
                detail: format!("{:?}", e),
            })
    }
}

impl DocumentHandle for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, page: usize) -> Result<String, PageError> {
        let pdf_page = self.load_page(page)?;
        let text = pdf_page.text().map_err(|e| PageError::TextFailed {
            page,
            detail: format!("{:?}", e),
        })?;
        Ok(text.all())
    }

    fn page_images(&self, page: usize) -> Result<Vec<Result<RawImage, ImageError>>, PageError> {
        let pdf_page = self.load_page(page)?;

        let images: Vec<Result<RawImage, ImageError>> = pdf_page
            .objects()
            .iter()
            .filter_map(|object| object.as_image_object().map(decode_image))
            .collect();

        debug!("Page {}: {} image object(s)", page, images.len());
        Ok(images)
    }

    fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage, PageError> {
        let pdf_page = self.load_page(page)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let bitmap = pdf_page
            .render_with_config(&render_config)
            .map_err(|e| PageError::RenderFailed {
                page,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn close(self: Box<Self>) {
        debug!("Closing {}", self.path.display());
    }
}

fn decode_image(image: &PdfPageImageObject<'_>) -> Result<RawImage, ImageError> {
    let source = image.color_space().ok().and_then(map_color_space);
    match image.get_raw_image() {
        Ok(decoded) => Ok(RawImage::from_decoded(&decoded, source)),
        Err(e) => Err(decode_failure(source.as_ref(), format!("{:?}", e))),
    }
}

/// Colour space pdfium reports for an image object. `None` when unknown.
fn map_color_space(space: PdfColorSpace) -> Option<ColorSpace> {
    let other = |name: &str| Some(ColorSpace::Other(name.to_string()));
    match space {
        PdfColorSpace::Unknown => None,
        PdfColorSpace::DeviceGray | PdfColorSpace::CalibratedCIEGray => Some(ColorSpace::Gray),
        PdfColorSpace::DeviceRGB | PdfColorSpace::CalibratedCIERGB => Some(ColorSpace::Rgb),
        PdfColorSpace::DeviceCMYK => Some(ColorSpace::Cmyk),
        PdfColorSpace::CalibratedCIELab => other("Lab"),
        PdfColorSpace::CalibratedICCProfile => other("ICCBased"),
        PdfColorSpace::Separation => other("Separation"),
        PdfColorSpace::DeviceN => other("DeviceN"),
        PdfColorSpace::Indexed => other("Indexed"),
        PdfColorSpace::Pattern => other("Pattern"),
    }
}

/// A failed decode of a non-gray, non-RGB source is a colour conversion
/// failure; anything else could not be read at all.
fn decode_failure(source: Option<&ColorSpace>, detail: String) -> ImageError {
    match source {
        Some(space @ (ColorSpace::Cmyk | ColorSpace::Other(_))) => ImageError::Conversion {
            color_space: space.to_string(),
            detail,
        },
        _ => ImageError::Process { detail },
    }
}
