//! Progress-callback trait for batch, file and page events.
//!
//! Pass a `&dyn ExtractionProgressCallback` to
//! [`crate::extract::Extractor::process_pdf`] or [`crate::batch::run_batch`].
//! The CLI renders events as an `indicatif` progress bar; the front-end
//! session forwards them over a channel to the interface thread.
//!
//! # Example
//!
//! ```rust
//! use pdf2chunks::ExtractionProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_complete(&self, page: usize, total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {}/{}", page, total_pages);
//!     }
//! }
//!
//! let counter = PageCounter { pages: AtomicUsize::new(0) };
//! counter.on_page_complete(1, 3);
//! assert_eq!(counter.pages.load(Ordering::SeqCst), 1);
//! ```

use crate::output::{BatchSummary, FileReport};
use std::path::Path;

/// Called by the extractor and the batch driver as work progresses.
///
/// All methods default to no-ops so implementors only override what they
/// care about. Events arrive in order from a single thread.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once with the number of matched files.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called for each input pattern that matched nothing.
    fn on_unmatched_input(&self, pattern: &str, reason: &str) {
        let _ = (pattern, reason);
    }

    /// Called before a file is opened.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    fn on_file_start(&self, pdf: &Path, index: usize, total_files: usize) {
        let _ = (pdf, index, total_files);
    }

    /// Called once the page count of the open document is known.
    fn on_document_open(&self, pdf: &Path, total_pages: usize) {
        let _ = (pdf, total_pages);
    }

    /// Called after each page is assembled.
    fn on_page_complete(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called for every error artifact written in place of an image.
    fn on_image_error(&self, page: usize, file_name: &str, error: &str) {
        let _ = (page, file_name, error);
    }

    /// Called after the text files of a PDF are written.
    fn on_file_complete(&self, report: &FileReport) {
        let _ = report;
    }

    /// Called when a file could not be processed; the batch continues.
    fn on_file_error(&self, pdf: &Path, error: &str) {
        let _ = (pdf, error);
    }

    /// Called once after all files have been attempted.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TrackingCallback {
        files: Arc<AtomicUsize>,
        pages: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_file_start(&self, _pdf: &Path, _index: usize, _total: usize) {
            self.files.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total_pages: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _pdf: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_unmatched_input("*.pdf", "no PDF files match this pattern");
        cb.on_file_start(Path::new("a.pdf"), 1, 2);
        cb.on_document_open(Path::new("a.pdf"), 3);
        cb.on_page_complete(1, 3);
        cb.on_image_error(1, "page_1_image_1_ERROR.txt", "bad");
        cb.on_file_error(Path::new("b.pdf"), "missing");
        cb.on_batch_complete(&BatchSummary::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            files: Arc::new(AtomicUsize::new(0)),
            pages: Arc::new(AtomicUsize::new(0)),
            errors: Arc::new(AtomicUsize::new(0)),
        };
        let pdf = PathBuf::from("a.pdf");

        tracker.on_file_start(&pdf, 1, 1);
        tracker.on_page_complete(1, 2);
        tracker.on_page_complete(2, 2);
        tracker.on_file_error(&pdf, "corrupt");

        assert_eq!(tracker.files.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dyn_callback_works() {
        let cb: Arc<dyn ExtractionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_page_complete(1, 10);
    }
}
