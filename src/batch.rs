//! Batch driver: one PDF at a time, failures isolated per file.

use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::output::BatchSummary;
use crate::pipeline::input::{default_output_dir, resolve_inputs};
use crate::progress::ExtractionProgressCallback;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Resolve `patterns` and report each unmatched one through `progress`.
///
/// Fails with [`ExtractError::NoInputFiles`] only when nothing matched at all.
pub fn collect_inputs<S: AsRef<str>>(
    patterns: &[S],
    progress: &dyn ExtractionProgressCallback,
) -> Result<Vec<PathBuf>, ExtractError> {
    let resolved = resolve_inputs(patterns);
    for miss in &resolved.unmatched {
        warn!("{}: {}", miss.pattern, miss.reason);
        progress.on_unmatched_input(&miss.pattern, &miss.reason);
    }

    if resolved.files.is_empty() {
        return Err(ExtractError::NoInputFiles {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        });
    }
    Ok(resolved.files)
}

/// Process every file in order. A file that fails is recorded in
/// [`BatchSummary::failures`] and the batch moves on.
///
/// Each file's output goes to `{output_root or parent}/{stem}_extracted`.
pub fn run_batch(
    extractor: &Extractor,
    files: &[PathBuf],
    output_root: Option<&Path>,
    progress: &dyn ExtractionProgressCallback,
) -> BatchSummary {
    let total = files.len();
    let mut summary = BatchSummary {
        files_matched: total,
        ..Default::default()
    };
    progress.on_batch_start(total);
    info!("Processing {} PDF file(s)", total);

    for (i, pdf) in files.iter().enumerate() {
        progress.on_file_start(pdf, i + 1, total);
        let output_dir = default_output_dir(pdf, output_root);

        match extractor.process_pdf(pdf, Some(&output_dir), progress) {
            Ok(report) => summary.record_success(report),
            Err(e) => {
                error!("Error processing {}: {}", pdf.display(), e);
                let message = e.to_string();
                progress.on_file_error(pdf, &message);
                summary.record_failure(pdf.clone(), message);
            }
        }
    }

    info!(
        "Batch complete: {}/{} file(s), {} text file(s), {} image(s), {} tokens",
        summary.files_processed,
        summary.files_matched,
        summary.text_files,
        summary.images_saved,
        summary.total_tokens
    );
    progress.on_batch_complete(&summary);
    summary
}
