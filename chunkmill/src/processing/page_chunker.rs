use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{ChunkPayload, ProcessedChunk};

use super::TokenCounter;

/// Folds runs of consecutive standalone text chunks on the same page into one
/// chunked-text unit. Anything other than standalone text is a hard boundary
/// and passes through unchanged.
///
/// A two-state machine: `Empty`, or `Buffering(page)` while a same-page text
/// run is open.
pub struct PageChunker {
    tokens: Arc<dyn TokenCounter>,
}

impl PageChunker {
    pub fn new(tokens: Arc<dyn TokenCounter>) -> Self {
        Self { tokens }
    }

    pub fn chunk(&self, input: Vec<ProcessedChunk>) -> Vec<ProcessedChunk> {
        let mut output = Vec::with_capacity(input.len());
        let mut buffer: Vec<ProcessedChunk> = Vec::new();
        let mut buffer_page: Option<u32> = None;

        for chunk in input {
            let is_text = matches!(chunk.payload, ChunkPayload::Text);
            if !is_text {
                // Hard boundary: close the open run, pass the chunk through.
                if !buffer.is_empty() {
                    output.push(self.flush(std::mem::take(&mut buffer)));
                }
                output.push(chunk);
                continue;
            }

            let page = first_page(&chunk);
            if !buffer.is_empty() && page != buffer_page {
                output.push(self.flush(std::mem::take(&mut buffer)));
            }
            buffer_page = page;
            buffer.push(chunk);
        }

        if !buffer.is_empty() {
            output.push(self.flush(buffer));
        }

        output
    }

    fn flush(&self, buffer: Vec<ProcessedChunk>) -> ProcessedChunk {
        debug_assert!(!buffer.is_empty());

        let content = buffer
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let source_ids: Vec<String> = buffer.iter().map(|c| c.chunk_id.clone()).collect();

        let mut page_numbers = BTreeSet::new();
        for chunk in &buffer {
            page_numbers.extend(chunk.page_numbers.iter().copied());
        }

        let title = title_from_content(&buffer[0].content);
        let token_count = self.tokens.count(&content);
        let count = buffer.len();
        let first = &buffer[0];

        ProcessedChunk {
            chunk_id: first.chunk_id.clone(),
            document_id: first.document_id.clone(),
            content,
            title,
            index: first.index,
            page_numbers,
            summary: first.summary.clone(),
            link: first.link.clone(),
            payload: ChunkPayload::ChunkedText {
                source_ids,
                count,
                token_count,
            },
        }
    }
}

/// Page key of a text chunk: its lowest page number, `None` when the element
/// carries no page metadata (unpaged text folds with other unpaged text).
fn first_page(chunk: &ProcessedChunk) -> Option<u32> {
    chunk.page_numbers.iter().next().copied()
}

/// First non-empty line with leading markdown heading markers stripped.
fn title_from_content(content: &str) -> Option<String> {
    content
        .lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(String::from)
}
