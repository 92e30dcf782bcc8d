//! Interactive front-end support: a background extraction session and the
//! form state that drives it.
//!
//! The whole batch runs on one dedicated worker thread. The worker never
//! touches interface state; it sends [`SessionEvent`]s over a channel and the
//! interface thread drains them with [`FormState::poll`] (or
//! [`SessionHandle::try_events`]). There is no cancellation: once started, a
//! run goes to completion, and the form refuses to start a second one until
//! it has seen `Finished` or `Aborted`.

use crate::batch::run_batch;
use crate::config::{validate_language, ExtractionConfig, DEFAULT_MAX_TOKENS, DEFAULT_OCR_LANGUAGE};
use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::output::{BatchSummary, FileReport};
use crate::progress::ExtractionProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// Everything the worker needs, captured when the run starts.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub files: Vec<PathBuf>,
    pub output_root: PathBuf,
    pub config: ExtractionConfig,
}

/// Messages from the worker to the interface thread.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A line for the log pane.
    Log(String),
    /// Overall progress in `0.0..=1.0`.
    Progress(f32),
    FileCompleted(FileReport),
    FileFailed { pdf: PathBuf, error: String },
    /// The batch ran to the end (some files may have failed).
    Finished(BatchSummary),
    /// The run could not start, e.g. pdfium failed to bind.
    Aborted(String),
}

/// Interface-side end of a running session.
pub struct SessionHandle {
    events: Receiver<SessionEvent>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Drain whatever the worker has sent so far, without blocking.
    /// The second value is true once the worker has hung up.
    pub fn try_events(&self) -> (Vec<SessionEvent>, bool) {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return (events, false),
                Err(TryRecvError::Disconnected) => return (events, true),
            }
        }
    }

    /// Block until the worker exits and return every remaining event.
    pub fn wait(mut self) -> Vec<SessionEvent> {
        let events: Vec<_> = self.events.iter().collect();
        self.join();
        events
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("extraction worker panicked");
            }
        }
    }
}

/// Start a session with the production extractor.
pub fn spawn_session(request: ExtractionRequest) -> Result<SessionHandle, ExtractError> {
    spawn_session_with(request, Extractor::new)
}

/// Start a session whose extractor is built by `factory` on the worker
/// thread.
pub fn spawn_session_with<F>(
    request: ExtractionRequest,
    factory: F,
) -> Result<SessionHandle, ExtractError>
where
    F: FnOnce(ExtractionConfig) -> Result<Extractor, ExtractError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let worker = thread::Builder::new()
        .name("pdf2chunks-worker".into())
        .spawn(move || run_session(request, factory, tx))
        .map_err(|e| ExtractError::Internal(format!("could not start worker thread: {e}")))?;

    Ok(SessionHandle {
        events: rx,
        worker: Some(worker),
    })
}

fn run_session<F>(request: ExtractionRequest, factory: F, tx: Sender<SessionEvent>)
where
    F: FnOnce(ExtractionConfig) -> Result<Extractor, ExtractError>,
{
    let ExtractionRequest {
        files,
        output_root,
        mut config,
    } = request;
    config.output_root = Some(output_root.clone());

    let extractor = match factory(config) {
        Ok(extractor) => extractor,
        Err(e) => {
            let _ = tx.send(SessionEvent::Aborted(e.to_string()));
            return;
        }
    };
    if extractor.config().ocr.enabled && !extractor.ocr_active() {
        let _ = tx.send(SessionEvent::Log(
            "OCR requested but tesseract is not installed; continuing without OCR".into(),
        ));
    }

    let progress = ChannelProgress::new(tx.clone());
    let summary = run_batch(&extractor, &files, Some(&output_root), &progress);
    let _ = tx.send(SessionEvent::Finished(summary));
    debug!("extraction worker finished");
}

/// Forwards progress callbacks into the session channel.
struct ChannelProgress {
    tx: Sender<SessionEvent>,
    /// (current file, total files), 1-indexed.
    position: Mutex<(usize, usize)>,
}

impl ChannelProgress {
    fn new(tx: Sender<SessionEvent>) -> Self {
        Self {
            tx,
            position: Mutex::new((0, 0)),
        }
    }

    fn send(&self, event: SessionEvent) {
        // A closed receiver means the interface is gone; the run just ends
        // quietly.
        let _ = self.tx.send(event);
    }

    fn log(&self, line: String) {
        self.send(SessionEvent::Log(line));
    }

    fn fraction(&self, within_file: f32) -> Option<f32> {
        let (current, total) = *self.position.lock().ok()?;
        if total == 0 {
            return None;
        }
        let done = current.saturating_sub(1) as f32 + within_file.clamp(0.0, 1.0);
        Some((done / total as f32).clamp(0.0, 1.0))
    }
}

fn display_name(pdf: &Path) -> String {
    pdf.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf.display().to_string())
}

impl ExtractionProgressCallback for ChannelProgress {
    fn on_batch_start(&self, total_files: usize) {
        if let Ok(mut position) = self.position.lock() {
            *position = (0, total_files);
        }
        self.send(SessionEvent::Progress(0.0));
    }

    fn on_file_start(&self, pdf: &Path, index: usize, total_files: usize) {
        if let Ok(mut position) = self.position.lock() {
            *position = (index, total_files);
        }
        self.log(format!("Processing: {}", display_name(pdf)));
    }

    fn on_page_complete(&self, page: usize, total_pages: usize) {
        if total_pages > 0 {
            if let Some(f) = self.fraction(page as f32 / total_pages as f32) {
                self.send(SessionEvent::Progress(f));
            }
        }
    }

    fn on_image_error(&self, page: usize, file_name: &str, error: &str) {
        self.log(format!("Page {page}: {file_name}: {error}"));
    }

    fn on_file_complete(&self, report: &FileReport) {
        self.log(format!(
            "Completed: {} ({} text file(s), {} image(s), {} tokens)",
            display_name(&report.pdf),
            report.text_files.len(),
            report.images_saved,
            report.total_tokens
        ));
        if let Some(f) = self.fraction(1.0) {
            self.send(SessionEvent::Progress(f));
        }
        self.send(SessionEvent::FileCompleted(report.clone()));
    }

    fn on_file_error(&self, pdf: &Path, error: &str) {
        self.log(format!("Error processing {}: {}", display_name(pdf), error));
        if let Some(f) = self.fraction(1.0) {
            self.send(SessionEvent::Progress(f));
        }
        self.send(SessionEvent::FileFailed {
            pdf: pdf.to_path_buf(),
            error: error.to_string(),
        });
    }
}

// ── Form state ───────────────────────────────────────────────────────────

/// Why the form refused an action.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please select at least one PDF file")]
    NoFiles,

    #[error("Please select an output directory")]
    NoOutputDirectory,

    #[error("An extraction is already running")]
    AlreadyRunning,

    #[error("Max tokens must be at least 1")]
    InvalidMaxTokens,

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// State behind the extraction form: inputs, progress, log, run flag.
pub struct FormState {
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    max_tokens: usize,
    ocr_enabled: bool,
    ocr_language: String,
    progress: f32,
    log: Vec<String>,
    session: Option<SessionHandle>,
    last_summary: Option<BatchSummary>,
    base_config: ExtractionConfig,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl FormState {
    /// `base_config` supplies everything the form does not edit (pdfium
    /// path, encoding, password).
    pub fn new(base_config: ExtractionConfig) -> Self {
        Self {
            files: Vec::new(),
            output_dir: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            ocr_enabled: false,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            progress: 0.0,
            log: Vec::new(),
            session: None,
            last_summary: None,
            base_config,
        }
    }

    /// Add files to the selection. The output directory defaults to the
    /// first file's directory.
    pub fn add_files<I: IntoIterator<Item = PathBuf>>(&mut self, files: I) {
        for file in files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
        if self.output_dir.is_none() {
            self.output_dir = self
                .files
                .first()
                .and_then(|f| f.parent())
                .map(Path::to_path_buf);
        }
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = Some(dir.into());
    }

    pub fn set_max_tokens(&mut self, max_tokens: usize) -> Result<(), FormError> {
        if max_tokens == 0 {
            return Err(FormError::InvalidMaxTokens);
        }
        self.max_tokens = max_tokens;
        Ok(())
    }

    pub fn set_ocr(&mut self, enabled: bool) {
        self.ocr_enabled = enabled;
    }

    pub fn set_ocr_language(&mut self, language: &str) -> Result<(), FormError> {
        validate_language(language)?;
        self.ocr_language = language.to_string();
        Ok(())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr_enabled
    }

    pub fn ocr_language(&self) -> &str {
        &self.ocr_language
    }

    /// Overall progress in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the start action should be enabled.
    pub fn can_start(&self) -> bool {
        !self.is_running() && !self.files.is_empty() && self.output_dir.is_some()
    }

    pub fn last_summary(&self) -> Option<&BatchSummary> {
        self.last_summary.as_ref()
    }

    /// The request a start would submit.
    pub fn request(&self) -> Result<ExtractionRequest, FormError> {
        if self.files.is_empty() {
            return Err(FormError::NoFiles);
        }
        let output_root = self.output_dir.clone().ok_or(FormError::NoOutputDirectory)?;

        let mut builder = ExtractionConfig::builder()
            .max_tokens(self.max_tokens)
            .encoding(self.base_config.encoding)
            .ocr(self.ocr_enabled)
            .ocr_language(self.ocr_language.clone())
            .output_root(output_root.clone());
        if let Some(path) = &self.base_config.pdfium_library_path {
            builder = builder.pdfium_library_path(path.clone());
        }
        if let Some(password) = &self.base_config.password {
            builder = builder.password(password.clone());
        }

        Ok(ExtractionRequest {
            files: self.files.clone(),
            output_root,
            config: builder.build()?,
        })
    }

    /// Start a run with the production extractor.
    pub fn start(&mut self) -> Result<(), FormError> {
        self.start_with(Extractor::new)
    }

    /// Start a run whose extractor is built by `factory`.
    pub fn start_with<F>(&mut self, factory: F) -> Result<(), FormError>
    where
        F: FnOnce(ExtractionConfig) -> Result<Extractor, ExtractError> + Send + 'static,
    {
        if self.is_running() {
            return Err(FormError::AlreadyRunning);
        }
        let request = self.request()?;

        self.log.clear();
        self.progress = 0.0;
        self.last_summary = None;
        self.log.push(format!(
            "Starting extraction of {} file(s) into {}",
            request.files.len(),
            request.output_root.display()
        ));

        self.session = Some(spawn_session_with(request, factory)?);
        Ok(())
    }

    /// Apply all pending worker events. Returns the events applied so the
    /// caller can react to individual ones.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let (events, disconnected) = session.try_events();

        let mut finished = false;
        for event in &events {
            match event {
                SessionEvent::Log(line) => self.log.push(line.clone()),
                SessionEvent::Progress(p) => self.progress = *p,
                SessionEvent::FileCompleted(_) | SessionEvent::FileFailed { .. } => {}
                SessionEvent::Finished(summary) => {
                    self.progress = 1.0;
                    self.log.push(format!(
                        "Finished: {}/{} file(s), {} text file(s), {} image(s), {} tokens",
                        summary.files_processed,
                        summary.files_matched,
                        summary.text_files,
                        summary.images_saved,
                        summary.total_tokens
                    ));
                    self.last_summary = Some(summary.clone());
                    finished = true;
                }
                SessionEvent::Aborted(reason) => {
                    self.log.push(format!("Error: {reason}"));
                    finished = true;
                }
            }
        }

        if !finished && disconnected {
            self.log.push("Error: extraction worker stopped unexpectedly".into());
            finished = true;
        }
        if finished {
            if let Some(mut session) = self.session.take() {
                session.join();
            }
        }
        events
    }
}
