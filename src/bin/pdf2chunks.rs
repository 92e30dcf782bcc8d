//! CLI binary for pdf2chunks.
//!
//! A thin shim over the library crate: resolves inputs, maps flags to
//! `ExtractionConfig`, runs the batch and prints the summary.

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2chunks::config::{validate_language, COMMON_OCR_LANGUAGES, DEFAULT_MAX_TOKENS};
use pdf2chunks::{
    collect_inputs, run_batch, BatchSummary, ExtractionConfig, ExtractionProgressCallback,
    Extractor, FileReport, TesseractCli, TokenizerEncoding,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar per file (pages), and a log line per file.
/// Without a bar, the same lines go straight to stderr.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
    quiet: bool,
    file_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new(show_bar: bool, quiet: bool) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS);
            bar.set_style(spinner_style);
            bar.set_prefix("Preparing");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Self {
            bar,
            quiet,
            file_started: Mutex::new(None),
        }
    }

    fn line(&self, text: String) {
        match &self.bar {
            Some(bar) => bar.println(text),
            None if !self.quiet => eprintln!("{text}"),
            None => {}
        }
    }

    /// Errors are shown even in quiet mode.
    fn error_line(&self, text: String) {
        match &self.bar {
            Some(bar) => bar.println(text),
            None => eprintln!("{text}"),
        }
    }

    fn elapsed(&self) -> String {
        let secs = self
            .file_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.line(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_files} PDF file(s)…"))
        ));
    }

    fn on_unmatched_input(&self, pattern: &str, reason: &str) {
        self.error_line(format!("{} {}  {}", red("✗"), pattern, red(reason)));
    }

    fn on_file_start(&self, pdf: &Path, index: usize, total_files: usize) {
        if let Ok(mut started) = self.file_started.lock() {
            *started = Some(Instant::now());
        }
        if let Some(bar) = &self.bar {
            bar.set_prefix(format!("[{index}/{total_files}]"));
            bar.set_message(format!("Opening {}…", file_name(pdf)));
        }
    }

    fn on_document_open(&self, pdf: &Path, total_pages: usize) {
        if let Some(bar) = &self.bar {
            let progress_style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);
            bar.set_style(progress_style);
            bar.set_length(total_pages as u64);
            bar.set_position(0);
            bar.set_message(file_name(pdf));
        }
    }

    fn on_page_complete(&self, page: usize, _total_pages: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(page as u64);
        }
    }

    fn on_image_error(&self, page: usize, file_name: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.line(format!(
            "    {} page {:>3}  {}  {}",
            cyan("⚠"),
            page,
            file_name,
            dim(&msg)
        ));
    }

    fn on_file_complete(&self, report: &FileReport) {
        self.line(format!(
            "  {} {}  {} text file(s), {} image(s), {}  {}",
            green("✓"),
            file_name(&report.pdf),
            report.text_files.len(),
            report.images_saved,
            dim(&format!("{} tokens", report.total_tokens)),
            self.elapsed(),
        ));
    }

    fn on_file_error(&self, pdf: &Path, error: &str) {
        self.error_line(format!(
            "  {} {}  {}  {}",
            red("✗"),
            file_name(pdf),
            red(error),
            self.elapsed(),
        ));
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn file_name(pdf: &Path) -> String {
    pdf.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf.display().to_string())
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One file, output beside it in report_extracted/
  pdf2chunks report.pdf

  # Several files and a glob, all output under ./out
  pdf2chunks a.pdf "scans/*.pdf" -o out

  # Smaller chunks for a small-context model
  pdf2chunks --max-tokens 8000 book.pdf

  # OCR scanned pages in English and Vietnamese
  pdf2chunks --ocr --ocr-language eng+vie scan.pdf

  # Machine-readable summary
  pdf2chunks --json docs/*.pdf > summary.json

OUTPUT LAYOUT (for report.pdf):
  report_extracted/
    report.txt                      single chunk, or
    report_part_1.txt, _part_2 …    one file per chunk
    extracted_images/
      page_1_image_1.png            embedded images, 1-indexed
      page_2_image_1_ERROR.txt      reason an image could not be saved

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH           Path to libpdfium (file or directory)
  PDF2CHUNKS_OUTPUT_DIR     Default for --output-dir
  PDF2CHUNKS_MAX_TOKENS     Default for --max-tokens
  PDF2CHUNKS_OCR_LANGUAGE   Default for --ocr-language
  RUST_LOG                  Override log filtering (e.g. pdf2chunks=debug)

SETUP:
  pdfium:     download a build from github.com/bblanchon/pdfium-binaries and
              point PDFIUM_LIB_PATH at it, or install it system-wide.
  tesseract:  only needed for --ocr (apt install tesseract-ocr tesseract-ocr-vie).
              Check installed languages with --list-ocr-languages.
"#;

/// Extract text and images from PDFs into token-bounded text files.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2chunks",
    version,
    about = "Extract text and images from PDFs into token-bounded text files",
    long_about = "Extract the text layer and embedded images of PDF documents. Image references \
are interleaved with the page text, scanned pages can be OCR'd with tesseract, and the result \
is split into text files that each stay under a token budget.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files or glob patterns (e.g. "docs/*.pdf").
    #[arg(required_unless_present = "list_ocr_languages")]
    paths: Vec<String>,

    /// Root directory for the `{name}_extracted` folders (default: beside each PDF).
    #[arg(short, long, env = "PDF2CHUNKS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum tokens per output text file.
    #[arg(short = 't', long, env = "PDF2CHUNKS_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS,
          value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    max_tokens: usize,

    /// Run OCR on images and on pages with little or no text.
    #[arg(long, env = "PDF2CHUNKS_OCR")]
    ocr: bool,

    /// OCR language code(s), `+`-joined (eng, vie, fra, deu, spa, eng+vie, …).
    #[arg(short = 'l', long, env = "PDF2CHUNKS_OCR_LANGUAGE", default_value = "eng",
          value_parser = parse_language)]
    ocr_language: String,

    /// Tokenizer used to count tokens.
    #[arg(long, env = "PDF2CHUNKS_ENCODING", value_enum, default_value = "cl100k_base")]
    encoding: EncodingArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2CHUNKS_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium library or its directory.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// List the OCR languages installed for tesseract and exit.
    #[arg(long)]
    list_ocr_languages: bool,

    /// Print the batch summary as JSON on stdout.
    #[arg(long, env = "PDF2CHUNKS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2CHUNKS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2CHUNKS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2CHUNKS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EncodingArg {
    #[value(name = "cl100k_base")]
    Cl100kBase,
    #[value(name = "o200k_base")]
    O200kBase,
}

impl From<EncodingArg> for TokenizerEncoding {
    fn from(v: EncodingArg) -> Self {
        match v {
            EncodingArg::Cl100kBase => TokenizerEncoding::Cl100kBase,
            EncodingArg::O200kBase => TokenizerEncoding::O200kBase,
        }
    }
}

fn parse_language(s: &str) -> Result<String, String> {
    validate_language(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // While the progress bar is active only warnings and errors are logged;
    // the bar and the per-file lines carry the rest.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress || cli.json {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list_ocr_languages {
        return list_ocr_languages(cli.json);
    }

    // ── Resolve inputs before touching pdfium ────────────────────────────
    let progress = CliProgressCallback::new(show_progress, cli.quiet || cli.json);
    let files = collect_inputs(&cli.paths, &progress)?;

    // ── Build config and extractor ───────────────────────────────────────
    let config = build_config(&cli)?;
    let extractor = Extractor::new(config).context("Failed to initialise extractor")?;
    if cli.ocr && !extractor.ocr_active() && !cli.quiet {
        eprintln!(
            "{} OCR requested but tesseract was not found; continuing without OCR",
            cyan("⚠")
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = run_batch(&extractor, &files, cli.output_dir.as_deref(), &progress);

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .encoding(cli.encoding.clone().into())
        .ocr(cli.ocr)
        .ocr_language(cli.ocr_language.clone());

    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_root(dir.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &BatchSummary) {
    let mark = if summary.files_failed == 0 {
        green("✔")
    } else if summary.files_processed == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };

    println!();
    println!("{} {}", mark, bold("Summary"));
    println!(
        "   Files processed: {}/{}",
        summary.files_processed, summary.files_matched
    );
    println!("   Text files:      {}", summary.text_files);
    if summary.image_errors > 0 {
        println!(
            "   Images:          {}  {}",
            summary.images_saved,
            red(&format!("({} failed)", summary.image_errors))
        );
    } else {
        println!("   Images:          {}", summary.images_saved);
    }
    println!("   Total tokens:    {}", summary.total_tokens);

    for failure in &summary.failures {
        println!("   {} {}: {}", red("✗"), failure.pdf.display(), failure.error);
    }
}

fn list_ocr_languages(json: bool) -> Result<()> {
    let tesseract = TesseractCli::default();
    let installed = tesseract
        .available_languages()
        .context("Could not query tesseract (is tesseract-ocr installed?)")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&installed)?);
        return Ok(());
    }

    println!("{}", bold("Installed OCR languages:"));
    for lang in &installed {
        println!("  {lang}");
    }

    let missing: Vec<&str> = COMMON_OCR_LANGUAGES
        .iter()
        .copied()
        .filter(|code| !code.split('+').all(|part| installed.iter().any(|l| l == part)))
        .collect();
    if !missing.is_empty() {
        println!();
        println!(
            "{} {}",
            dim("Common languages not available:"),
            missing.join(", ")
        );
    }
    Ok(())
}
