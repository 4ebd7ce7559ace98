use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{DocumentElement, ItemLabel};

/// One child folded into a merged chunk. `content` is the child's verbatim
/// original content, never the normalized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedChild {
    pub item_label: ItemLabel,
    pub chunk_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Token count of a chunked text unit. Estimates come from the character
/// heuristic and must not be treated as exact by callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenCount {
    Exact(usize),
    Estimated(usize),
}

impl TokenCount {
    pub fn value(&self) -> usize {
        match self {
            Self::Exact(n) | Self::Estimated(n) => *n,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Self::Estimated(_))
    }
}

/// Variant part of a processed chunk, tagged on `item_label` so the indexing
/// consumer sees `text`, `table`, `merged` or `chunked_text`. Pictures never
/// reach the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "item_label", rename_all = "snake_case")]
pub enum ChunkPayload {
    Text,
    /// Standalone table wrapped in a single-entry children list so the
    /// downstream shape matches merged chunks.
    Table { children: Vec<MergedChild> },
    Merged {
        children: Vec<MergedChild>,
        merged_count: usize,
    },
    ChunkedText {
        source_ids: Vec<String>,
        count: usize,
        token_count: TokenCount,
    },
}

impl ChunkPayload {
    pub fn label(&self) -> ItemLabel {
        match self {
            Self::Text => ItemLabel::Text,
            Self::Table { .. } => ItemLabel::Table,
            Self::Merged { .. } => ItemLabel::Merged,
            Self::ChunkedText { .. } => ItemLabel::ChunkedText,
        }
    }
}

/// One search-ready output chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub index: i64,
    #[serde(default)]
    pub page_numbers: BTreeSet<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub payload: ChunkPayload,
}

impl ProcessedChunk {
    pub fn item_label(&self) -> ItemLabel {
        self.payload.label()
    }

    /// Wrap an element without changing its content (plain text passthrough).
    pub fn from_element(element: &DocumentElement) -> Self {
        Self {
            chunk_id: element.chunk_id.clone(),
            document_id: element.document_id.clone(),
            content: element.content.clone(),
            title: element.title.clone(),
            index: element.index,
            page_numbers: element.page_numbers.clone(),
            summary: element.summary.clone(),
            link: element.link.clone(),
            payload: ChunkPayload::Text,
        }
    }

    /// The ordered input ids this chunk covers: its own id, or the buffered
    /// source ids for a chunked text unit.
    pub fn covered_ids(&self) -> Vec<&str> {
        match &self.payload {
            ChunkPayload::ChunkedText { source_ids, .. } => {
                source_ids.iter().map(String::as_str).collect()
            }
            _ => vec![self.chunk_id.as_str()],
        }
    }
}
