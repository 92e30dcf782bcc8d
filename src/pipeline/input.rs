//! Input resolution: turn user-supplied paths and glob patterns into PDFs.
//!
//! Patterns containing `*`, `?` or `[` are expanded with `glob`; anything
//! else is taken as a literal path. Only existing regular files with a
//! `.pdf` extension (any case) are kept. Literal paths that do not qualify
//! are reported back so the caller can print an error for each, while the
//! rest of the batch still runs.

use crate::error::ExtractError;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The outcome of resolving a list of input patterns.
#[derive(Debug, Default)]
pub struct ResolvedInputs {
    /// Matched PDF files, deduplicated, in pattern order.
    pub files: Vec<PathBuf>,
    /// Patterns that produced nothing, with the reason.
    pub unmatched: Vec<UnmatchedInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedInput {
    pub pattern: String,
    pub reason: String,
}

/// Whether `pattern` should be glob-expanded.
pub fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Whether `path` has a `.pdf` extension, case-insensitively.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Resolve every pattern. Never fails; see [`ResolvedInputs::unmatched`].
pub fn resolve_inputs<S: AsRef<str>>(patterns: &[S]) -> ResolvedInputs {
    let mut resolved = ResolvedInputs::default();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let before = resolved.files.len();

        if is_glob_pattern(pattern) {
            match glob::glob(pattern) {
                Ok(paths) => {
                    for path in paths.filter_map(Result::ok) {
                        if path.is_file() && has_pdf_extension(&path) && seen.insert(path.clone()) {
                            resolved.files.push(path);
                        }
                    }
                    if resolved.files.len() == before {
                        resolved.unmatched.push(UnmatchedInput {
                            pattern: pattern.to_string(),
                            reason: "no PDF files match this pattern".into(),
                        });
                    }
                }
                Err(e) => resolved.unmatched.push(UnmatchedInput {
                    pattern: pattern.to_string(),
                    reason: format!("invalid pattern: {e}"),
                }),
            }
        } else {
            let path = PathBuf::from(pattern);
            let reason = if !path.exists() {
                Some("file not found")
            } else if !path.is_file() {
                Some("not a regular file")
            } else if !has_pdf_extension(&path) {
                Some("not a .pdf file")
            } else {
                None
            };
            match reason {
                Some(reason) => resolved.unmatched.push(UnmatchedInput {
                    pattern: pattern.to_string(),
                    reason: reason.to_string(),
                }),
                None => {
                    if seen.insert(path.clone()) {
                        resolved.files.push(path);
                    }
                }
            }
        }
    }

    debug!(
        "Resolved {} PDF file(s), {} unmatched pattern(s)",
        resolved.files.len(),
        resolved.unmatched.len()
    );
    resolved
}

/// `{root or parent}/{stem}_extracted`
pub fn default_output_dir(pdf_path: &Path, output_root: Option<&Path>) -> PathBuf {
    let stem = pdf_stem(pdf_path);
    let parent = match output_root {
        Some(root) => root.to_path_buf(),
        None => pdf_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    parent.join(format!("{stem}_extracted"))
}

/// File stem used for output names; `document` when the path has none.
pub fn pdf_stem(pdf_path: &Path) -> String {
    pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Validate a local PDF: exists, readable, starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(f) => {
            // Files shorter than the magic are zero-padded and fail the check.
            let mut head = Vec::with_capacity(4);
            let _ = f.take(4).read_to_end(&mut head);
            let mut magic = [0u8; 4];
            magic[..head.len()].copy_from_slice(&head);
            if &magic != b"%PDF" {
                return Err(ExtractError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}
