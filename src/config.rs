//! Configuration types for PDF extraction and chunking.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The same struct is used by the
//! command-line driver and by the front-end session, so one run can be
//! reproduced from the other by serialising the config.
//!
//! The OCR heuristics are deliberately crude length checks. Their thresholds
//! live here as named constants so existing output fixtures keep matching.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default token budget per output file.
pub const DEFAULT_MAX_TOKENS: usize = 45_000;

/// Default OCR language passed to the recognizer.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// A page whose native text is shorter than this (trimmed characters) is
/// classified as "mostly images".
pub const MOSTLY_IMAGES_THRESHOLD: usize = 50;

/// Full-page OCR also runs when native text is shorter than this, even for
/// pages not classified as mostly images.
pub const LOW_TEXT_THRESHOLD: usize = 100;

/// Linear scale used when rasterising a page for OCR.
pub const DEFAULT_PAGE_RENDER_SCALE: f32 = 2.0;

/// OCR languages offered by the interactive front-end.
pub const COMMON_OCR_LANGUAGES: &[&str] = &["eng", "vie", "fra", "deu", "spa", "eng+vie"];

/// Configuration for extracting one or more PDFs.
///
/// # Example
/// ```rust
/// use pdf2chunks::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_tokens(8_000)
///     .ocr(true)
///     .ocr_language("eng+deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 8_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum tokens per output text file. Default: 45 000.
    ///
    /// A single line longer than the budget is still written whole, in a
    /// chunk of its own.
    pub max_tokens: usize,

    /// BPE encoding used to count tokens. Default: `cl100k_base`.
    pub encoding: TokenizerEncoding,

    /// OCR settings. OCR is off by default.
    pub ocr: OcrSettings,

    /// Root directory under which `{stem}_extracted/` folders are created.
    /// If None, each folder is created beside its input PDF.
    pub output_root: Option<PathBuf>,

    /// Explicit pdfium library (file or directory). If None, the library is
    /// looked up next to the executable and then system-wide.
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            encoding: TokenizerEncoding::default(),
            ocr: OcrSettings::default(),
            output_root: None,
            pdfium_library_path: None,
            password: None,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// OCR behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Run OCR on extracted images and on text-poor pages. Default: false.
    pub enabled: bool,

    /// Recognizer language code(s), `+`-joined (e.g. `eng+vie`). Default: `eng`.
    pub language: String,

    /// See [`MOSTLY_IMAGES_THRESHOLD`].
    pub mostly_images_threshold: usize,

    /// See [`LOW_TEXT_THRESHOLD`].
    pub low_text_threshold: usize,

    /// See [`DEFAULT_PAGE_RENDER_SCALE`].
    pub page_render_scale: f32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            mostly_images_threshold: MOSTLY_IMAGES_THRESHOLD,
            low_text_threshold: LOW_TEXT_THRESHOLD,
            page_render_scale: DEFAULT_PAGE_RENDER_SCALE,
        }
    }
}

impl OcrSettings {
    /// Whether a page with `native_chars` of native text counts as a scan.
    pub fn is_mostly_images(&self, native_chars: usize) -> bool {
        native_chars < self.mostly_images_threshold
    }

    /// Whether a page with `native_chars` of native text gets full-page OCR.
    pub fn needs_page_ocr(&self, native_chars: usize) -> bool {
        self.is_mostly_images(native_chars) || native_chars < self.low_text_threshold
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn encoding(mut self, encoding: TokenizerEncoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn ocr(mut self, enabled: bool) -> Self {
        self.config.ocr.enabled = enabled;
        self
    }

    pub fn ocr_language(mut self, language: impl Into<String>) -> Self {
        self.config.ocr.language = language.into();
        self
    }

    pub fn mostly_images_threshold(mut self, chars: usize) -> Self {
        self.config.ocr.mostly_images_threshold = chars;
        self
    }

    pub fn low_text_threshold(mut self, chars: usize) -> Self {
        self.config.ocr.low_text_threshold = chars;
        self
    }

    pub fn page_render_scale(mut self, scale: f32) -> Self {
        self.config.ocr.page_render_scale = scale;
        self
    }

    pub fn output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(dir.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max tokens per file must be ≥ 1".into(),
            ));
        }
        validate_language(&c.ocr.language)?;
        if !(0.5..=8.0).contains(&c.ocr.page_render_scale) {
            return Err(ExtractError::InvalidConfig(format!(
                "page render scale must be 0.5–8.0, got {}",
                c.ocr.page_render_scale
            )));
        }
        if c.ocr.mostly_images_threshold > c.ocr.low_text_threshold {
            return Err(ExtractError::InvalidConfig(format!(
                "mostly-images threshold ({}) must not exceed low-text threshold ({})",
                c.ocr.mostly_images_threshold, c.ocr.low_text_threshold
            )));
        }
        Ok(self.config)
    }
}

/// Check a `+`-joined recognizer language code such as `eng` or `eng+vie`.
///
/// Each segment must be non-empty and made of ASCII letters, digits or `_`
/// (tesseract traineddata names, e.g. `chi_sim`).
pub fn validate_language(language: &str) -> Result<(), ExtractError> {
    let valid = !language.is_empty()
        && language.split('+').all(|seg| {
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(ExtractError::InvalidConfig(format!(
            "invalid OCR language '{language}' (expected codes like 'eng' or 'eng+vie')"
        )))
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// BPE encoding used for token counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenizerEncoding {
    /// GPT-4 / GPT-3.5 encoding. (default)
    #[default]
    Cl100kBase,
    /// GPT-4o encoding.
    O200kBase,
}

impl TokenizerEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenizerEncoding::Cl100kBase => "cl100k_base",
            TokenizerEncoding::O200kBase => "o200k_base",
        }
    }
}
