//! End-to-end tests against the real pdfium library.
//!
//! These tests use real PDF files in `./test_cases/` and need a pdfium shared
//! library. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/lib cargo test --test e2e -- --nocapture
//!
//! OCR tests additionally need `tesseract` on PATH.

use pdf2chunks::{
    run_batch, ExtractionConfig, Extractor, NoopProgressCallback, TesseractCli, TokenCounter,
    TiktokenCounter, TokenizerEncoding,
};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_tracing();
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn config(max_tokens: usize) -> ExtractionConfig {
    let mut builder = ExtractionConfig::builder().max_tokens(max_tokens);
    if let Ok(lib) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_library_path(lib);
    }
    builder.build().unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_extract_text_pdf() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample_text.pdf"));
    let out = TempDir::new().unwrap();

    let extractor = Extractor::new(config(45_000)).expect("pdfium should bind");
    let report = extractor
        .process_pdf(&pdf, Some(out.path()), &NoopProgressCallback)
        .expect("extraction should succeed");

    assert!(report.page_count() > 0);
    assert!(!report.text_files.is_empty());
    let first = std::fs::read_to_string(&report.text_files[0]).unwrap();
    assert!(first.starts_with("--- Page 1 ---"));
    for page in 1..=report.page_count() {
        let separator = format!("--- Page {page} ---");
        assert!(
            report
                .text_files
                .iter()
                .any(|f| std::fs::read_to_string(f).unwrap().contains(&separator)),
            "missing {separator}"
        );
    }
    println!("{:#?}", report.pages);
}

#[test]
fn test_small_budget_respects_limit() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample_text.pdf"));
    let out = TempDir::new().unwrap();
    let budget = 500;

    let extractor = Extractor::new(config(budget)).expect("pdfium should bind");
    let report = extractor
        .process_pdf(&pdf, Some(out.path()), &NoopProgressCallback)
        .unwrap();

    // Chunk budgets are per-line estimates; allow slack for BPE merges
    // across line boundaries, but oversized single lines are legal.
    let counter = TiktokenCounter::new(TokenizerEncoding::Cl100kBase).unwrap();
    for file in &report.text_files {
        let body = std::fs::read_to_string(file).unwrap();
        let longest_line = body.lines().map(|l| counter.count(l)).max().unwrap_or(0);
        let tokens = counter.count(&body);
        assert!(
            tokens <= budget + budget / 10 || longest_line > budget,
            "{} has {} tokens",
            file.display(),
            tokens
        );
    }
}

#[test]
fn test_images_are_extracted() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("with_images.pdf"));
    let out = TempDir::new().unwrap();

    let extractor = Extractor::new(config(45_000)).expect("pdfium should bind");
    let report = extractor
        .process_pdf(&pdf, Some(out.path()), &NoopProgressCallback)
        .unwrap();

    assert!(report.images_saved + report.image_errors > 0);
    let text = std::fs::read_to_string(&report.text_files[0]).unwrap();
    assert!(text.contains("[IMAGE: page_"));
    assert!(out.path().join("extracted_images").is_dir());
}

#[test]
fn test_ocr_on_scanned_pdf() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("scanned.pdf"));
    if !TesseractCli::default().is_available() {
        println!("SKIP — tesseract not installed");
        return;
    }
    let out = TempDir::new().unwrap();

    let mut cfg = config(45_000);
    cfg.ocr.enabled = true;
    let extractor = Extractor::new(cfg).expect("pdfium should bind");
    assert!(extractor.ocr_active());

    let report = extractor
        .process_pdf(&pdf, Some(out.path()), &NoopProgressCallback)
        .unwrap();
    assert!(report.pages.iter().any(|p| p.page_ocr));
}

#[test]
fn test_batch_over_test_cases() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    init_tracing();
    let pattern = format!("{}/*.pdf", test_cases_dir().display());
    let resolved = pdf2chunks::pipeline::input::resolve_inputs(&[pattern]);
    if resolved.files.is_empty() {
        println!("SKIP — no PDFs in test_cases/");
        return;
    }
    let out = TempDir::new().unwrap();

    let extractor = Extractor::new(config(45_000)).expect("pdfium should bind");
    let summary = run_batch(&extractor, &resolved.files, Some(out.path()), &NoopProgressCallback);

    assert_eq!(summary.files_matched, resolved.files.len());
    assert_eq!(summary.files_processed + summary.files_failed, summary.files_matched);
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();
}
