//! Interactive extraction form.
//!
//! A terminal rendition of the extraction form: pick files and an output
//! directory, set the token budget and OCR options, then start. The batch
//! runs on a background worker while this thread keeps the progress bar
//! and the log moving.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2chunks::config::COMMON_OCR_LANGUAGES;
use pdf2chunks::pipeline::input::resolve_inputs;
use pdf2chunks::{ExtractionConfig, FormState};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}

/// Interactive PDF text and image extraction.
#[derive(Parser, Debug)]
#[command(name = "pdf2chunks-form", version, about = "Interactive PDF text and image extraction")]
struct Cli {
    /// PDF files to preselect.
    paths: Vec<String>,

    /// Path to the pdfium library or its directory.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut base = ExtractionConfig::default();
    base.pdfium_library_path = cli.pdfium_lib.clone();
    let mut form = FormState::new(base);
    if !cli.paths.is_empty() {
        add_files(&mut form, &cli.paths);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        render(&form);
        let Some(choice) = prompt(&mut input, "Choose")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                if let Some(line) = prompt(&mut input, "PDF files or patterns (space separated)")? {
                    let patterns: Vec<String> =
                        line.split_whitespace().map(str::to_string).collect();
                    add_files(&mut form, &patterns);
                }
            }
            "2" => {
                if let Some(dir) = prompt(&mut input, "Output directory")? {
                    if !dir.is_empty() {
                        form.set_output_dir(dir);
                    }
                }
            }
            "3" => {
                if let Some(value) = prompt(&mut input, "Max tokens per file")? {
                    match value.parse::<usize>() {
                        Ok(n) => {
                            if let Err(e) = form.set_max_tokens(n) {
                                eprintln!("{}", red(&e.to_string()));
                            }
                        }
                        Err(_) => eprintln!("{}", red("Max tokens must be a positive integer")),
                    }
                }
            }
            "4" => form.set_ocr(!form.ocr_enabled()),
            "5" => {
                for (i, lang) in COMMON_OCR_LANGUAGES.iter().enumerate() {
                    println!("  {}) {}", i + 1, lang);
                }
                if let Some(value) = prompt(&mut input, "OCR language (number or code)")? {
                    let code = value
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| COMMON_OCR_LANGUAGES.get(i).copied())
                        .map(str::to_string)
                        .unwrap_or(value);
                    if let Err(e) = form.set_ocr_language(&code) {
                        eprintln!("{}", red(&e.to_string()));
                    }
                }
            }
            "6" => run(&mut form)?,
            "7" => form.clear_files(),
            "q" | "Q" => return Ok(()),
            _ => eprintln!("{}", red("Unknown choice")),
        }
    }
}

fn add_files(form: &mut FormState, patterns: &[String]) {
    let resolved = resolve_inputs(patterns);
    for miss in &resolved.unmatched {
        eprintln!("{} {}: {}", red("✗"), miss.pattern, miss.reason);
    }
    form.add_files(resolved.files);
}

fn render(form: &FormState) {
    println!();
    println!("{}", bold("PDF Text & Image Extractor"));
    if form.files().is_empty() {
        println!("  Files:       {}", dim("(none)"));
    } else {
        println!("  Files:       {} selected", form.files().len());
        for file in form.files() {
            println!("               {}", dim(&file.display().to_string()));
        }
    }
    println!(
        "  Output dir:  {}",
        form.output_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| dim("(not set)"))
    );
    println!("  Max tokens:  {}", form.max_tokens());
    println!(
        "  OCR:         {} ({})",
        if form.ocr_enabled() { "on" } else { "off" },
        form.ocr_language()
    );
    println!();
    println!(
        "  1) Add files  2) Output dir  3) Max tokens  4) Toggle OCR  5) OCR language  \
         6) Start extraction  7) Clear files  q) Quit"
    );
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Start the run and keep the terminal updated until the worker is done.
fn run(form: &mut FormState) -> Result<()> {
    if let Err(e) = form.start() {
        eprintln!("{}", red(&e.to_string()));
        return Ok(());
    }

    let bar = ProgressBar::new(1000);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:42.green/238}] {percent:>3}%  {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut shown = 0;
    loop {
        form.poll();
        for line in &form.log()[shown..] {
            bar.println(line);
        }
        shown = form.log().len();
        bar.set_position((form.progress() * 1000.0).round() as u64);

        if !form.is_running() {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    bar.finish_and_clear();

    if let Some(summary) = form.last_summary() {
        println!(
            "{} {}/{} file(s), {} text file(s), {} image(s), {} tokens",
            bold("Done:"),
            summary.files_processed,
            summary.files_matched,
            summary.text_files,
            summary.images_saved,
            summary.total_tokens
        );
    }
    Ok(())
}
