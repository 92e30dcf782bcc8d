//! Reports produced by extraction: per page, per file, per batch.
//!
//! All of these are serialisable so the CLI can print them with `--json`.
//! They are never written into the output directories.

use crate::pipeline::assemble::BodySource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page: usize,
    /// Trimmed character count of the normalized native text.
    pub native_chars: usize,
    pub images_saved: usize,
    pub image_errors: usize,
    /// True when full-page OCR ran for this page.
    pub page_ocr: bool,
    pub body_source: BodySource,
    /// Page read failure, if any. The page still appears in the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of processing one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub pdf: PathBuf,
    pub output_dir: PathBuf,
    pub text_files: Vec<PathBuf>,
    /// PNGs written to `extracted_images/`.
    pub images_saved: usize,
    /// `_ERROR.txt` artifacts written in place of images.
    pub image_errors: usize,
    /// Token count of the whole assembled document, counted once before
    /// chunking (chunk trimming means the parts can sum to slightly less).
    pub total_tokens: usize,
    pub pages: Vec<PageReport>,
}

impl FileReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A file the batch could not process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub pdf: PathBuf,
    pub error: String,
}

/// Totals over a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files_matched: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub text_files: usize,
    pub images_saved: usize,
    pub image_errors: usize,
    pub total_tokens: usize,
    pub reports: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl BatchSummary {
    /// Fold one successful file into the totals.
    pub fn record_success(&mut self, report: FileReport) {
        self.files_processed += 1;
        self.text_files += report.text_files.len();
        self.images_saved += report.images_saved;
        self.image_errors += report.image_errors;
        self.total_tokens += report.total_tokens;
        self.reports.push(report);
    }

    pub fn record_failure(&mut self, pdf: PathBuf, error: String) {
        self.files_failed += 1;
        self.failures.push(FileFailure { pdf, error });
    }

    /// True when every matched file was processed.
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, files: usize, images: usize, tokens: usize) -> FileReport {
        FileReport {
            pdf: PathBuf::from(format!("{name}.pdf")),
            output_dir: PathBuf::from(format!("{name}_extracted")),
            text_files: (1..=files)
                .map(|i| PathBuf::from(format!("{name}_part_{i}.txt")))
                .collect(),
            images_saved: images,
            image_errors: 1,
            total_tokens: tokens,
            pages: Vec::new(),
        }
    }

    #[test]
    fn summary_accumulates() {
        let mut summary = BatchSummary {
            files_matched: 3,
            ..Default::default()
        };
        summary.record_success(report("a", 2, 3, 100));
        summary.record_success(report("b", 1, 0, 50));
        summary.record_failure(PathBuf::from("c.pdf"), "boom".into());

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.text_files, 3);
        assert_eq!(summary.images_saved, 3);
        assert_eq!(summary.image_errors, 2);
        assert_eq!(summary.total_tokens, 150);
        assert!(!summary.is_clean());
    }

    #[test]
    fn json_shape() {
        let mut summary = BatchSummary::default();
        summary.record_success(report("a", 1, 0, 7));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_tokens"], 7);
        assert_eq!(json["reports"][0]["text_files"][0], "a_part_1.txt");
    }
}
