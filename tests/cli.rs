//! Command-line behaviour that does not need pdfium.
//!
//! Inputs are resolved before the PDF engine is bound, so argument errors and
//! "nothing matched" exits can be checked on any machine.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("pdf2chunks").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_core_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-tokens"))
        .stdout(predicate::str::contains("--ocr-language"))
        .stdout(predicate::str::contains("--output-dir"));
}

#[test]
fn no_arguments_prints_help_and_fails() {
    cmd().assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn unmatched_glob_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    cmd()
        .arg(&pattern)
        .arg("--no-progress")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn missing_and_non_pdf_literals_are_reported() {
    let dir = TempDir::new().unwrap();
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "not a pdf").unwrap();
    let missing = dir.path().join("missing.pdf");

    cmd()
        .arg(&missing)
        .arg(&txt)
        .arg("--no-progress")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("file not found"))
        .stderr(predicate::str::contains("not a .pdf file"));
}

#[test]
fn zero_max_tokens_is_rejected() {
    cmd()
        .args(["--max-tokens", "0", "doc.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max-tokens"));
}

#[test]
fn malformed_ocr_language_is_rejected() {
    cmd()
        .args(["--ocr-language", "eng+", "doc.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid OCR language"));
}

#[test]
fn unknown_encoding_is_rejected() {
    cmd()
        .args(["--encoding", "p50k", "doc.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cl100k_base"));
}
