mod chunk;
mod element;

pub use chunk::{ChunkPayload, MergedChild, ProcessedChunk, TokenCount};
pub use element::{DocumentBundle, DocumentElement, DocumentMeta, ItemLabel};

use std::collections::HashMap;

pub type Metadata = HashMap<String, serde_json::Value>;
