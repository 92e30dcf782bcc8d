//! Document access seam: what the pipeline needs from a PDF library.
//!
//! The pipeline never talks to pdfium directly. It sees a [`PdfBackend`]
//! that opens files into [`DocumentHandle`]s, and every page-level read goes
//! through the handle. [`crate::pipeline::render::PdfiumBackend`] is the
//! production implementation; tests plug in in-memory documents.

use crate::error::{ExtractError, ImageError, PageError};
use image::DynamicImage;
use std::fmt;
use std::path::Path;

/// Opens PDF files.
pub trait PdfBackend {
    /// Open `path`, optionally with a user password.
    ///
    /// The returned handle borrows the backend (and the password) and must
    /// not outlive either.
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentHandle + 'a>, ExtractError>;
}

/// An open document. Pages are 1-indexed.
pub trait DocumentHandle {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Native text layer of a page, unprocessed.
    fn page_text(&self, page: usize) -> Result<String, PageError>;

    /// Embedded raster images of a page, in content-stream order.
    ///
    /// The outer error means the page's objects could not be listed at all;
    /// an inner `Err` marks one image whose pixels could not be read.
    fn page_images(&self, page: usize) -> Result<Vec<Result<RawImage, ImageError>>, PageError>;

    /// Rasterise a page at `scale` times its natural size.
    fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage, PageError>;

    /// Release the document. Dropping the handle has the same effect; this
    /// exists so the end of a document's lifetime is visible at call sites.
    fn close(self: Box<Self>);
}

/// Colour space of an embedded image as reported by the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Anything else (DeviceN, Lab, ICC-based without a known base, …).
    Other(String),
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpace::Gray => f.write_str("DeviceGray"),
            ColorSpace::Rgb => f.write_str("DeviceRGB"),
            ColorSpace::Cmyk => f.write_str("DeviceCMYK"),
            ColorSpace::Other(name) => f.write_str(name),
        }
    }
}

/// Pixel data of one embedded image: 8-bit interleaved samples.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Layout of `samples`.
    pub color_space: ColorSpace,
    /// Colour space declared in the PDF, when the decoder already turned it
    /// into `color_space`.
    pub decoded_from: Option<ColorSpace>,
    /// Samples per pixel, alpha included.
    pub channels: u8,
    pub has_alpha: bool,
    pub samples: Vec<u8>,
}

impl RawImage {
    /// Samples per pixel excluding alpha.
    pub fn color_channels(&self) -> u8 {
        self.channels.saturating_sub(u8::from(self.has_alpha))
    }

    /// Whether the buffer can be written to PNG without conversion: exactly
    /// grayscale with one colour channel, or exactly RGB with three.
    pub fn is_png_compatible(&self) -> bool {
        matches!(
            (&self.color_space, self.color_channels()),
            (ColorSpace::Gray, 1) | (ColorSpace::Rgb, 3)
        )
    }

    /// Wrap an already-decoded image. Luma variants map to gray, everything
    /// else is expanded to 8-bit RGB(A).
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(buf) => Self {
                width,
                height,
                color_space: ColorSpace::Gray,
                decoded_from: None,
                channels: 1,
                has_alpha: false,
                samples: buf.as_raw().clone(),
            },
            DynamicImage::ImageLumaA8(buf) => Self {
                width,
                height,
                color_space: ColorSpace::Gray,
                decoded_from: None,
                channels: 2,
                has_alpha: true,
                samples: buf.as_raw().clone(),
            },
            DynamicImage::ImageRgb8(buf) => Self {
                width,
                height,
                color_space: ColorSpace::Rgb,
                decoded_from: None,
                channels: 3,
                has_alpha: false,
                samples: buf.as_raw().clone(),
            },
            other if other.color().has_alpha() => Self {
                width,
                height,
                color_space: ColorSpace::Rgb,
                decoded_from: None,
                channels: 4,
                has_alpha: true,
                samples: other.to_rgba8().into_raw(),
            },
            other => Self {
                width,
                height,
                color_space: ColorSpace::Rgb,
                decoded_from: None,
                channels: 3,
                has_alpha: false,
                samples: other.to_rgb8().into_raw(),
            },
        }
    }

    /// Wrap an image the PDF library decoded from `source`. The source is
    /// kept only when it differs from the decoded layout.
    pub fn from_decoded(image: &DynamicImage, source: Option<ColorSpace>) -> Self {
        let mut raw = Self::from_dynamic(image);
        raw.decoded_from = source.filter(|space| *space != raw.color_space);
        raw
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_space", &self.color_space)
            .field("decoded_from", &self.decoded_from)
            .field("channels", &self.channels)
            .field("has_alpha", &self.has_alpha)
            .field("samples", &format_args!("<{} bytes>", self.samples.len()))
            .finish()
    }
}
