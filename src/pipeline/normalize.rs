//! Text cleanup: repair common artifacts of PDF text extraction.
//!
//! Native PDF text comes out with line-wrap hyphens, stray one-letter lines
//! from drop caps and ligature glitches, page numbers on lines of their own,
//! and ragged spacing around punctuation. The rules below fix those without
//! touching content. OCR output goes through the same rules.
//!
//! ## Rule Order
//!
//! Whitespace is collapsed first so later patterns only ever see single
//! spaces; hyphen joins run before line dropping so a wrapped word is never
//! mistaken for an artifact line; punctuation spacing runs before the
//! sentence-capitalisation pass so `.` is already glued to its word.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Clean raw page text.
///
/// Applies the ordered rule pass until the text stops changing, so that
/// `clean_extracted_text(clean_extracted_text(s)) == clean_extracted_text(s)`.
/// Never panics; text no rule matches is returned trimmed.
///
/// Line endings are unified to `\n` first (pdfium emits CRLF).
///
/// Rules (applied in order):
/// 1. Collapse runs of spaces/tabs to one space
/// 2. Rejoin words hyphenated across a line break (`wonder-\nful`)
/// 3. Drop single-letter lines (a run of them goes in one step)
/// 4. Collapse 3+ line breaks to 2
/// 5. Strip spaces before line breaks
/// 6. No space before `,.!?;:`, one space after when an uppercase letter follows
/// 7. Drop bare-integer lines (page numbers)
/// 8. Capitalise a lowercase letter glued to a period (`Hello.world` → `Hello. World`)
pub fn clean_extracted_text(input: &str) -> String {
    // Terminates: a pass only deletes characters, or inserts a space between
    // punctuation and a letter, which no rule removes again.
    let mut current = clean_pass(&unify_line_endings(input));
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn unify_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// One ordered application of every rule.
fn clean_pass(input: &str) -> String {
    let s = collapse_horizontal_whitespace(input);
    let s = join_hyphenated_words(&s);
    let s = drop_single_letter_lines(&s);
    let s = collapse_blank_lines(&s);
    let s = strip_trailing_spaces(&s);
    let s = fix_punctuation_spacing(&s);
    let s = drop_page_number_lines(&s);
    let s = capitalise_after_period(&s);
    s.trim().to_string()
}

// ── Rule 1: Collapse horizontal whitespace ───────────────────────────────────

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_horizontal_whitespace(input: &str) -> String {
    RE_HSPACE.replace_all(input, " ").into_owned()
}

// ── Rule 2: Rejoin hyphenated line wraps ─────────────────────────────────────

static RE_HYPHEN_WRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\n([a-z])").unwrap());

fn join_hyphenated_words(input: &str) -> String {
    RE_HYPHEN_WRAP.replace_all(input, "$1").into_owned()
}

// ── Rule 3: Drop single-letter lines ─────────────────────────────────────────

static RE_SINGLE_LETTER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\n[a-zA-Z])+\n").unwrap());

fn drop_single_letter_lines(input: &str) -> String {
    RE_SINGLE_LETTER_LINE.replace_all(input, "\n").into_owned()
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 5: Strip spaces before line breaks ──────────────────────────────────

static RE_TRAILING_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +\n").unwrap());

fn strip_trailing_spaces(input: &str) -> String {
    RE_TRAILING_SPACES.replace_all(input, "\n").into_owned()
}

// ── Rule 6: Punctuation spacing ──────────────────────────────────────────────

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" +([,.!?;:])").unwrap());
static RE_PUNCT_BEFORE_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,.!?;:])([A-Z])").unwrap());

fn fix_punctuation_spacing(input: &str) -> String {
    let s = RE_SPACE_BEFORE_PUNCT.replace_all(input, "$1");
    RE_PUNCT_BEFORE_UPPER.replace_all(&s, "$1 $2").into_owned()
}

// ── Rule 7: Drop page-number lines ───────────────────────────────────────────

static RE_NUMBER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\d+\n").unwrap());

fn drop_page_number_lines(input: &str) -> String {
    RE_NUMBER_LINE.replace_all(input, "\n").into_owned()
}

// ── Rule 8: Capitalise after period ──────────────────────────────────────────

static RE_PERIOD_LOWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([a-z])").unwrap());

fn capitalise_after_period(input: &str) -> String {
    RE_PERIOD_LOWER
        .replace_all(input, |caps: &Captures| {
            format!(". {}", caps[1].to_uppercase())
        })
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
