//! Token-bounded chunking of the assembled document.
//!
//! Whole lines are packed greedily until the next line would push the chunk
//! over the budget. Each line is counted on its own (line + `\n`), so the sum
//! is an approximation of the chunk's real count, and a single line longer
//! than the budget is emitted alone rather than split.

use crate::config::TokenizerEncoding;
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tiktoken_rs::CoreBPE;
use tracing::info;

/// Deterministic token counting.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// [`TokenCounter`] over a tiktoken BPE.
pub struct TiktokenCounter {
    encoding: TokenizerEncoding,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the BPE ranks for `encoding` (embedded in the binary).
    pub fn new(encoding: TokenizerEncoding) -> Result<Self, ExtractError> {
        let bpe = match encoding {
            TokenizerEncoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            TokenizerEncoding::O200kBase => tiktoken_rs::o200k_base(),
        }
        .map_err(|e| ExtractError::TokenizerUnavailable {
            encoding: encoding.as_str().to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self { encoding, bpe })
    }

    pub fn encoding(&self) -> TokenizerEncoding {
        self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// One output chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-indexed position in the document.
    pub index: usize,
    /// Chunk text, trimmed.
    pub text: String,
    /// Sum of the per-line counts that went into the chunk.
    pub tokens: usize,
}

/// Split `text` into chunks of at most `max_tokens` (per-line estimate).
pub fn split_into_chunks(text: &str, max_tokens: usize, counter: &dyn TokenCounter) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for line in text.split('\n') {
        let candidate = format!("{line}\n");
        let line_tokens = counter.count(&candidate);

        if current_tokens + line_tokens > max_tokens && !current.is_empty() {
            push_chunk(&mut chunks, &current, current_tokens);
            current = candidate;
            current_tokens = line_tokens;
        } else {
            current.push_str(&candidate);
            current_tokens += line_tokens;
        }
    }
    push_chunk(&mut chunks, &current, current_tokens);

    chunks
}

/// Append `text` trimmed, unless nothing is left after trimming.
fn push_chunk(chunks: &mut Vec<Chunk>, text: &str, tokens: usize) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(Chunk {
            index: chunks.len() + 1,
            text: trimmed.to_string(),
            tokens,
        });
    }
}

/// `{base}.txt` when there is a single chunk, else `{base}_part_{n}.txt`.
pub fn chunk_file_name(base: &str, index: usize, total: usize) -> String {
    if total == 1 {
        format!("{base}.txt")
    } else {
        format!("{base}_part_{index}.txt")
    }
}

/// Write each chunk as a UTF-8 file in `dir`. Returns the paths in order.
pub fn write_chunks(
    chunks: &[Chunk],
    base: &str,
    dir: &Path,
    counter: &dyn TokenCounter,
) -> Result<Vec<PathBuf>, ExtractError> {
    let total = chunks.len();
    let mut paths = Vec::with_capacity(total);

    for chunk in chunks {
        let path = dir.join(chunk_file_name(base, chunk.index, total));
        std::fs::write(&path, &chunk.text).map_err(|source| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source,
        })?;
        info!(
            "Created: {} ({} tokens)",
            path.display(),
            counter.count(&chunk.text)
        );
        paths.push(path);
    }

    Ok(paths)
}
