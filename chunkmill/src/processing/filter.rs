use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ProcessingConfig;
use crate::models::{ChunkPayload, ProcessedChunk};

/// Why a candidate chunk was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    TocSignature,
    ShortText,
    SymbolOnly,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::TocSignature => write!(f, "toc_signature"),
            Self::ShortText => write!(f, "short_text"),
            Self::SymbolOnly => write!(f, "symbol_only"),
        }
    }
}

/// Pure meaningfulness predicate, applied after hierarchy merging and before
/// page chunking. Rejection counting is the caller's responsibility.
pub struct ContentFilter {
    min_text_chars: usize,
    table_reference: Regex,
    ellipsis_run: Regex,
    symbol_only: Regex,
}

impl ContentFilter {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars,
            // Table-of-contents lines reference tables ("<표 1-2>", "〈표 3〉")
            // and pad to the page number with dot or middle-dot leaders.
            table_reference: Regex::new(r"[<〈\[]\s*표").unwrap(),
            ellipsis_run: Regex::new(r"[.·⋯…]{3,}").unwrap(),
            symbol_only: Regex::new(r"^[0-9\s\-|.·()]+$").unwrap(),
        }
    }

    /// True when the chunk is worth indexing.
    pub fn accept(&self, chunk: &ProcessedChunk) -> bool {
        self.evaluate(chunk).is_none()
    }

    /// `None` when accepted, otherwise the first matching rejection rule.
    pub fn evaluate(&self, chunk: &ProcessedChunk) -> Option<RejectReason> {
        let content = chunk.content.trim();

        if content.is_empty() {
            return Some(RejectReason::Empty);
        }

        if self.table_reference.is_match(content) && self.ellipsis_run.is_match(content) {
            return Some(RejectReason::TocSignature);
        }

        // Checked before the length floor so digit/symbol junk is counted
        // under this rule rather than as short text.
        if self.symbol_only.is_match(content) {
            return Some(RejectReason::SymbolOnly);
        }

        // Length floor applies only to standalone text, never to merged or
        // table-derived chunks.
        if matches!(chunk.payload, ChunkPayload::Text)
            && content.graphemes(true).count() < self.min_text_chars
        {
            return Some(RejectReason::ShortText);
        }

        None
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(&ProcessingConfig::default())
    }
}
