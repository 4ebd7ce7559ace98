use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChunkmillError, Result};

/// Label of one extracted unit. `Text`, `Table` and `Picture` arrive from the
/// extraction stage; `Merged` and `ChunkedText` are synthesized by this core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemLabel {
    #[default]
    Text,
    Table,
    Picture,
    Merged,
    ChunkedText,
}

impl std::fmt::Display for ItemLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Table => write!(f, "table"),
            Self::Picture => write!(f, "picture"),
            Self::Merged => write!(f, "merged"),
            Self::ChunkedText => write!(f, "chunked_text"),
        }
    }
}

impl std::str::FromStr for ItemLabel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            "picture" => Ok(Self::Picture),
            "merged" => Ok(Self::Merged),
            "chunked_text" => Ok(Self::ChunkedText),
            _ => Err(format!("Unknown item label: {s}")),
        }
    }
}

/// One raw extracted unit, read-only once inside the pipeline.
///
/// `index` is the single source of truth for ordering within a bundle;
/// `original_content` is the verbatim extraction output and is never
/// overwritten by normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentElement {
    pub chunk_id: String,
    pub document_id: String,
    pub item_label: ItemLabel,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    /// Parent `chunk_id` for elements declared as children of another element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,
    pub index: i64,
    #[serde(default)]
    pub page_numbers: BTreeSet<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl DocumentElement {
    /// Verbatim content for carrying into merged children: the extraction
    /// original when present, otherwise the working content.
    pub fn original_or_content(&self) -> &str {
        self.original_content.as_deref().unwrap_or(&self.content)
    }
}

/// Document-level metadata record accompanying one bundle.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DocumentMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One extraction output: document metadata plus the ordered element list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentBundle {
    #[serde(default)]
    pub document: DocumentMeta,
    pub elements: Vec<DocumentElement>,
}

impl DocumentBundle {
    /// Parse and validate a bundle. A malformed container or a broken caller
    /// contract fails the whole file; the caller may skip it and continue.
    pub fn from_json(raw: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Enforce the caller contract: `chunk_id` unique within the bundle.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if element.chunk_id.is_empty() {
                return Err(ChunkmillError::Validation(format!(
                    "Element at index {} has an empty chunk_id",
                    element.index
                )));
            }
            if !seen.insert(&element.chunk_id) {
                return Err(ChunkmillError::Validation(format!(
                    "Duplicate chunk_id '{}' in bundle",
                    element.chunk_id
                )));
            }
        }
        Ok(())
    }
}
