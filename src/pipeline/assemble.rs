//! Page assembly: separator, image references, and the body text.
//!
//! Layout of one page block:
//!
//! ```text
//! --- Page 3 ---
//! [IMAGE: page_3_image_1.png]
//! [OCR from page_3_image_1.png]:
//! <recognised text>
//!
//! <body>
//!
//! ```
//!
//! The body is the native text, unless full-page OCR produced strictly more
//! (trimmed) characters, in which case the OCR text replaces it. OCR text
//! that does not win is appended under an `[OCR Text]:` label.

use crate::pipeline::images::ExtractedImage;
use crate::pipeline::ocr::OcrOutcome;
use serde::{Deserialize, Serialize};

/// Where a page's body text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySource {
    Native,
    Ocr,
    NativeWithOcr,
}

/// One assembled page block.
#[derive(Debug, Clone)]
pub struct AssembledPage {
    pub page: usize,
    pub text: String,
    pub body_source: BodySource,
}

/// `--- Page {n} ---`
pub fn page_separator(page: usize) -> String {
    format!("--- Page {page} ---")
}

/// Build the text block for one page.
///
/// `native_text` must already be normalized. `page_ocr` is the full-page
/// OCR result when OCR ran for this page.
pub fn assemble_page(
    page: usize,
    images: &[ExtractedImage],
    native_text: &str,
    page_ocr: Option<&OcrOutcome>,
) -> AssembledPage {
    let mut text = page_separator(page);
    text.push('\n');

    if !images.is_empty() {
        for image in images {
            text.push_str(&format!("[IMAGE: {}]\n", image.file_name));
            let ocr_text = image.ocr_text();
            if !ocr_text.is_empty() {
                text.push_str(&format!("[OCR from {}]:\n{}\n", image.file_name, ocr_text));
            }
        }
        text.push('\n');
    }

    let (body, body_source) = choose_body(native_text, page_ocr.map(OcrOutcome::text).unwrap_or(""));
    text.push_str(&body);
    text.push_str("\n\n");

    AssembledPage {
        page,
        text,
        body_source,
    }
}

/// OCR wins only when strictly longer by trimmed character count.
fn choose_body(native: &str, ocr: &str) -> (String, BodySource) {
    let ocr = ocr.trim();
    if ocr.is_empty() {
        return (native.to_string(), BodySource::Native);
    }

    if ocr.chars().count() > native.trim().chars().count() {
        (ocr.to_string(), BodySource::Ocr)
    } else {
        (
            format!("{native}\n\n[OCR Text]:\n{ocr}"),
            BodySource::NativeWithOcr,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use crate::pipeline::images::ImageStatus;

    fn saved(page: usize, index: usize, ocr: Option<&str>) -> ExtractedImage {
        ExtractedImage {
            page,
            index,
            file_name: format!("page_{page}_image_{index}.png"),
            status: ImageStatus::Saved { converted: false },
            ocr: ocr.map(|t| OcrOutcome::Recognized(t.to_string())),
        }
    }

    #[test]
    fn no_images_no_ocr() {
        let page = assemble_page(1, &[], "Native body", None);
        assert_eq!(page.text, "--- Page 1 ---\nNative body\n\n");
        assert_eq!(page.body_source, BodySource::Native);
        assert!(!page.text.contains("[IMAGE:"));
    }

    #[test]
    fn image_refs_precede_body() {
        let images = vec![saved(2, 1, None), saved(2, 2, Some("Chart label"))];
        let page = assemble_page(2, &images, "Body", None);
        assert_eq!(
            page.text,
            "--- Page 2 ---\n\
             [IMAGE: page_2_image_1.png]\n\
             [IMAGE: page_2_image_2.png]\n\
             [OCR from page_2_image_2.png]:\nChart label\n\
             \n\
             Body\n\n"
        );
    }

    #[test]
    fn error_artifacts_are_referenced_too() {
        let failed = ExtractedImage {
            page: 1,
            index: 1,
            file_name: "page_1_image_1_ERROR.txt".into(),
            status: ImageStatus::Failed(ImageError::Save { detail: "x".into() }),
            ocr: None,
        };
        let page = assemble_page(1, &[failed], "", None);
        assert!(page.text.contains("[IMAGE: page_1_image_1_ERROR.txt]"));
    }

    #[test]
    fn longer_ocr_replaces_native() {
        let ocr = OcrOutcome::Recognized("A much longer scanned paragraph".into());
        let page = assemble_page(1, &[], "short", Some(&ocr));
        assert_eq!(page.body_source, BodySource::Ocr);
        assert_eq!(page.text, "--- Page 1 ---\nA much longer scanned paragraph\n\n");
    }

    #[test]
    fn equal_length_ocr_is_appended() {
        let ocr = OcrOutcome::Recognized("abcde".into());
        let page = assemble_page(1, &[], "vwxyz", Some(&ocr));
        assert_eq!(page.body_source, BodySource::NativeWithOcr);
        assert_eq!(page.text, "--- Page 1 ---\nvwxyz\n\n[OCR Text]:\nabcde\n\n");
    }

    #[test]
    fn failed_or_empty_ocr_keeps_native() {
        let failed = OcrOutcome::Failed { reason: "boom".into() };
        let page = assemble_page(1, &[], "native", Some(&failed));
        assert_eq!(page.body_source, BodySource::Native);

        let empty = OcrOutcome::Recognized(String::new());
        let page = assemble_page(1, &[], "native", Some(&empty));
        assert_eq!(page.body_source, BodySource::Native);
    }

    #[test]
    fn ocr_wins_over_empty_native() {
        let ocr = OcrOutcome::Recognized("x".into());
        let page = assemble_page(5, &[], "", Some(&ocr));
        assert_eq!(page.body_source, BodySource::Ocr);
    }
}
