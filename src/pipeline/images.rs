//! Embedded-image extraction: colour normalisation, PNG output, error artifacts.
//!
//! PNG can only hold gray or RGB samples, so anything else (CMYK above all)
//! is converted to RGB before saving. A failure at any step for one image
//! leaves a `page_{p}_image_{i}_ERROR.txt` file with the reason where the PNG
//! would have been, and the page moves on to the next image.

use crate::error::ImageError;
use crate::pipeline::document::{ColorSpace, DocumentHandle, RawImage};
use crate::pipeline::ocr::{OcrAdapter, OcrOutcome};
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::path::Path;
use tracing::{debug, warn};

/// One image slot on a page: either a saved PNG or an error artifact.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-indexed page number.
    pub page: usize,
    /// 1-indexed position of the image within the page.
    pub index: usize,
    /// File name (not path) of the PNG or of the `_ERROR.txt` artifact.
    pub file_name: String,
    pub status: ImageStatus,
    /// OCR result, present only when OCR ran on this image.
    pub ocr: Option<OcrOutcome>,
}

impl ExtractedImage {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, ImageStatus::Saved { .. })
    }

    /// Recognised text, empty when OCR did not run or failed.
    pub fn ocr_text(&self) -> &str {
        self.ocr.as_ref().map(OcrOutcome::text).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// PNG written; `converted` is true when the colour space was changed.
    Saved { converted: bool },
    /// Error artifact written instead of the PNG.
    Failed(ImageError),
}

/// `page_{page}_image_{index}.png`
pub fn image_file_name(page: usize, index: usize) -> String {
    format!("page_{page}_image_{index}.png")
}

/// `page_{page}_image_{index}_ERROR.txt`
pub fn error_file_name(page: usize, index: usize) -> String {
    format!("page_{page}_image_{index}_ERROR.txt")
}

/// Extract every embedded image of `page` into `images_dir`.
///
/// Never fails: enumeration problems yield an empty list (logged), and each
/// per-image problem yields an error artifact entry.
pub fn extract_page_images(
    document: &dyn DocumentHandle,
    page: usize,
    images_dir: &Path,
    ocr: Option<&OcrAdapter>,
) -> Vec<ExtractedImage> {
    let sources = match document.page_images(page) {
        Ok(sources) => sources,
        Err(e) => {
            warn!("{}", e);
            return Vec::new();
        }
    };

    sources
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            match source {
                Ok(raw) => save_image(&raw, page, index, images_dir, ocr),
                Err(e) => {
                    warn!("Image {} on page {}: {}", index, page, e);
                    record_failure(page, index, images_dir, e)
                }
            }
        })
        .collect()
}

/// Normalise, save and optionally recognise one image.
pub fn save_image(
    raw: &RawImage,
    page: usize,
    index: usize,
    images_dir: &Path,
    ocr: Option<&OcrAdapter>,
) -> ExtractedImage {
    let file_name = image_file_name(page, index);

    let needs_conversion = !raw.is_png_compatible();
    let image = if needs_conversion {
        match convert_to_rgb(raw) {
            Ok(img) => {
                debug!("Converted image to RGB: {}", file_name);
                img
            }
            Err(e) => {
                warn!("Could not convert image {}: {}", file_name, e);
                return record_failure(page, index, images_dir, e);
            }
        }
    } else {
        match to_dynamic(raw) {
            Some(img) => img,
            None => {
                let e = ImageError::Process {
                    detail: format!(
                        "pixel buffer of {} bytes does not match {}x{}x{}",
                        raw.samples.len(),
                        raw.width,
                        raw.height,
                        raw.channels
                    ),
                };
                warn!("Could not process image {}: {}", file_name, e);
                return record_failure(page, index, images_dir, e);
            }
        }
    };

    if let Some(source) = &raw.decoded_from {
        debug!("{} decoded from {} to {}", file_name, source, raw.color_space);
    }
    let converted = needs_conversion || raw.decoded_from.is_some();

    let path = images_dir.join(&file_name);
    if let Err(e) = image.save_with_format(&path, ImageFormat::Png) {
        warn!("Could not save image {}: {}", file_name, e);
        return record_failure(
            page,
            index,
            images_dir,
            ImageError::Save {
                detail: e.to_string(),
            },
        );
    }
    debug!("Saved {}", path.display());

    let ocr = ocr.map(|adapter| adapter.recognize_image(&image));

    ExtractedImage {
        page,
        index,
        file_name,
        status: ImageStatus::Saved { converted },
        ocr,
    }
}

/// Write the `_ERROR.txt` artifact and build the failed entry.
fn record_failure(page: usize, index: usize, images_dir: &Path, error: ImageError) -> ExtractedImage {
    let file_name = error_file_name(page, index);
    let path = images_dir.join(&file_name);
    if let Err(io) = std::fs::write(&path, error.to_string()) {
        warn!("Could not write {}: {}", path.display(), io);
    }

    ExtractedImage {
        page,
        index,
        file_name,
        status: ImageStatus::Failed(error),
        ocr: None,
    }
}

/// Wrap a PNG-compatible buffer without touching its samples.
fn to_dynamic(raw: &RawImage) -> Option<DynamicImage> {
    let (w, h, samples) = (raw.width, raw.height, raw.samples.clone());
    match (&raw.color_space, raw.has_alpha) {
        (ColorSpace::Gray, false) => GrayImage::from_raw(w, h, samples).map(DynamicImage::ImageLuma8),
        (ColorSpace::Gray, true) => {
            GrayAlphaImage::from_raw(w, h, samples).map(DynamicImage::ImageLumaA8)
        }
        (ColorSpace::Rgb, false) => RgbImage::from_raw(w, h, samples).map(DynamicImage::ImageRgb8),
        (ColorSpace::Rgb, true) => RgbaImage::from_raw(w, h, samples).map(DynamicImage::ImageRgba8),
        _ => None,
    }
}

/// Convert any supported colour space to 8-bit RGB, keeping alpha if present.
pub fn convert_to_rgb(raw: &RawImage) -> Result<DynamicImage, ImageError> {
    let conversion_error = |detail: String| ImageError::Conversion {
        color_space: raw.color_space.to_string(),
        detail,
    };

    let channels = raw.channels as usize;
    let color_channels = raw.color_channels() as usize;
    if channels == 0 || color_channels == 0 {
        return Err(conversion_error("image has no colour channels".into()));
    }

    let pixels = raw.width as usize * raw.height as usize;
    if raw.samples.len() != pixels * channels {
        return Err(conversion_error(format!(
            "pixel buffer of {} bytes does not match {}x{}x{}",
            raw.samples.len(),
            raw.width,
            raw.height,
            channels
        )));
    }

    let to_rgb: fn(&[u8]) -> [u8; 3] = match (&raw.color_space, color_channels) {
        (ColorSpace::Gray, _) => |px| [px[0], px[0], px[0]],
        (ColorSpace::Rgb, n) if n >= 3 => |px| [px[0], px[1], px[2]],
        (ColorSpace::Cmyk, 4) => cmyk_to_rgb,
        (cs, n) => {
            return Err(conversion_error(format!(
                "no RGB conversion for {cs} with {n} colour channel(s)"
            )))
        }
    };

    let mut out = Vec::with_capacity(pixels * if raw.has_alpha { 4 } else { 3 });
    for px in raw.samples.chunks_exact(channels) {
        out.extend_from_slice(&to_rgb(&px[..color_channels]));
        if raw.has_alpha {
            out.push(px[channels - 1]);
        }
    }

    let image = if raw.has_alpha {
        RgbaImage::from_raw(raw.width, raw.height, out).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(raw.width, raw.height, out).map(DynamicImage::ImageRgb8)
    };
    image.ok_or_else(|| conversion_error("converted buffer has the wrong size".into()))
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u16;
    let channel = |v: u8| ((255 - v as u16) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeOcr, FakePage};
    use tempfile::TempDir;

    fn raw(color_space: ColorSpace, channels: u8, has_alpha: bool, samples: Vec<u8>) -> RawImage {
        RawImage {
            width: 2,
            height: 1,
            color_space,
            decoded_from: None,
            channels,
            has_alpha,
            samples,
        }
    }

    #[test]
    fn file_names_are_one_indexed() {
        assert_eq!(image_file_name(1, 1), "page_1_image_1.png");
        assert_eq!(error_file_name(3, 12), "page_3_image_12_ERROR.txt");
    }

    #[test]
    fn rgb_saved_as_is() {
        let dir = TempDir::new().unwrap();
        let img = raw(ColorSpace::Rgb, 3, false, vec![255, 0, 0, 0, 255, 0]);
        let entry = save_image(&img, 1, 1, dir.path(), None);
        assert_eq!(entry.status, ImageStatus::Saved { converted: false });
        assert_eq!(entry.file_name, "page_1_image_1.png");
        assert!(dir.path().join("page_1_image_1.png").exists());
    }

    #[test]
    fn cmyk_converted_before_saving() {
        let dir = TempDir::new().unwrap();
        // pure cyan, then pure black
        let img = raw(ColorSpace::Cmyk, 4, false, vec![255, 0, 0, 0, 0, 0, 0, 255]);
        let entry = save_image(&img, 2, 1, dir.path(), None);
        assert_eq!(entry.status, ImageStatus::Saved { converted: true });

        let saved = image::open(dir.path().join("page_2_image_1.png")).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0).0, [0, 255, 255]);
        assert_eq!(saved.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn cmyk_source_decoded_upstream_counts_as_converted() {
        let dir = TempDir::new().unwrap();
        let mut img = raw(ColorSpace::Rgb, 3, false, vec![0, 255, 255, 0, 0, 0]);
        img.decoded_from = Some(ColorSpace::Cmyk);
        let entry = save_image(&img, 1, 1, dir.path(), None);
        assert_eq!(entry.status, ImageStatus::Saved { converted: true });

        let saved = image::open(dir.path().join("page_1_image_1.png")).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0).0, [0, 255, 255]);
    }

    #[test]
    fn unsupported_color_space_writes_error_artifact() {
        let dir = TempDir::new().unwrap();
        let img = raw(ColorSpace::Other("DeviceN".into()), 2, false, vec![0; 4]);
        let entry = save_image(&img, 1, 2, dir.path(), None);

        assert_eq!(entry.file_name, "page_1_image_2_ERROR.txt");
        assert!(matches!(entry.status, ImageStatus::Failed(ImageError::Conversion { .. })));
        let body = std::fs::read_to_string(dir.path().join("page_1_image_2_ERROR.txt")).unwrap();
        assert!(body.starts_with("ERROR: Failed to convert image with colorspace DeviceN"));
        assert!(!dir.path().join("page_1_image_2.png").exists());
    }

    #[test]
    fn truncated_buffer_fails_conversion() {
        let img = raw(ColorSpace::Cmyk, 4, false, vec![0; 5]);
        assert!(matches!(
            convert_to_rgb(&img),
            Err(ImageError::Conversion { .. })
        ));
    }

    #[test]
    fn gray_with_alpha_is_png_compatible() {
        let dir = TempDir::new().unwrap();
        let img = raw(ColorSpace::Gray, 2, true, vec![10, 255, 20, 128]);
        let entry = save_image(&img, 1, 1, dir.path(), None);
        assert_eq!(entry.status, ImageStatus::Saved { converted: false });
    }

    #[test]
    fn missing_images_dir_is_save_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let img = raw(ColorSpace::Gray, 1, false, vec![0, 0]);
        let entry = save_image(&img, 1, 1, &missing, None);
        assert!(matches!(entry.status, ImageStatus::Failed(ImageError::Save { .. })));
    }

    #[test]
    fn one_bad_image_does_not_stop_the_page() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDocument::new(vec![FakePage::text("body")
            .with_image(Err("stream decode failed".into()))
            .with_image(Ok(raw(ColorSpace::Other("Lab".into()), 3, false, vec![0; 6])))
            .with_image(Ok(raw(ColorSpace::Gray, 1, false, vec![0, 255])))]);

        let images = extract_page_images(&doc, 1, dir.path(), None);
        let names: Vec<_> = images.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "page_1_image_1_ERROR.txt",
                "page_1_image_2_ERROR.txt",
                "page_1_image_3.png"
            ]
        );
        let first = std::fs::read_to_string(dir.path().join("page_1_image_1_ERROR.txt")).unwrap();
        assert_eq!(first, "ERROR: Failed to process image - stream decode failed");
    }

    #[test]
    fn ocr_attached_to_saved_images_only() {
        let dir = TempDir::new().unwrap();
        let adapter = OcrAdapter::new(Box::new(FakeOcr::always("Figure one")), "eng");
        let doc = FakeDocument::new(vec![FakePage::text("")
            .with_image(Ok(raw(ColorSpace::Gray, 1, false, vec![0, 255])))
            .with_image(Err("broken".into()))]);

        let images = extract_page_images(&doc, 1, dir.path(), Some(&adapter));
        assert_eq!(images[0].ocr_text(), "Figure one");
        assert!(images[1].ocr.is_none());
    }
}
