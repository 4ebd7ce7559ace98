use std::sync::Arc;

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::models::{DocumentBundle, DocumentElement, ItemLabel, ProcessedChunk};

use super::{
    ContentFilter, HierarchyMerger, MergeAnomaly, PageChunker, RejectReason, TokenCounter,
    default_counter,
};

/// Per-bundle diagnostic counters. Rejection counts are broken out per filter
/// rule; `anomalies` lists the unresolvable parent references.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub input_elements: usize,
    pub pictures_dropped: usize,
    pub merged_chunks: usize,
    pub independent_chunks: usize,
    pub filtered_empty: usize,
    pub filtered_toc: usize,
    pub filtered_short: usize,
    pub filtered_symbols: usize,
    pub output_chunks: usize,
    pub anomalies: Vec<MergeAnomaly>,
}

impl PipelineStats {
    pub fn filtered_total(&self) -> usize {
        self.filtered_empty + self.filtered_toc + self.filtered_short + self.filtered_symbols
    }

    fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Empty => self.filtered_empty += 1,
            RejectReason::TocSignature => self.filtered_toc += 1,
            RejectReason::ShortText => self.filtered_short += 1,
            RejectReason::SymbolOnly => self.filtered_symbols += 1,
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub chunks: Vec<ProcessedChunk>,
    pub stats: PipelineStats,
}

/// Full merge → filter → page-chunk transform over one document bundle.
///
/// Synchronous, deterministic, and free of I/O: identical input and
/// configuration always produce identical output.
pub struct ProcessingPipeline {
    merger: HierarchyMerger,
    filter: ContentFilter,
    chunker: PageChunker,
}

impl ProcessingPipeline {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self::with_token_counter(config, default_counter(config))
    }

    pub fn with_token_counter(config: &ProcessingConfig, tokens: Arc<dyn TokenCounter>) -> Self {
        Self {
            merger: HierarchyMerger::new(),
            filter: ContentFilter::new(config),
            chunker: PageChunker::new(tokens),
        }
    }

    pub fn process(&self, bundle: &DocumentBundle) -> Result<PipelineOutput> {
        bundle.validate()?;

        let mut stats = PipelineStats {
            input_elements: bundle.elements.len(),
            ..PipelineStats::default()
        };

        // Pictures never reach the index; they should not arrive here at all,
        // but a stray one must not fail the bundle.
        let elements: Vec<DocumentElement> = bundle
            .elements
            .iter()
            .filter(|e| {
                if e.item_label == ItemLabel::Picture {
                    stats.pictures_dropped += 1;
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        let outcome = self.merger.merge(&elements);
        stats.anomalies = outcome.anomalies;
        for chunk in &outcome.chunks {
            match chunk.item_label() {
                ItemLabel::Merged => stats.merged_chunks += 1,
                _ => stats.independent_chunks += 1,
            }
        }

        let mut kept = Vec::with_capacity(outcome.chunks.len());
        for chunk in outcome.chunks {
            match self.filter.evaluate(&chunk) {
                None => kept.push(chunk),
                Some(reason) => stats.record_rejection(reason),
            }
        }

        // Joining buffered texts can synthesize a filter signature across
        // element boundaries (a table reference in one element, a dot-leader
        // run in the next), so the folded units are screened again.
        let mut chunks = Vec::with_capacity(kept.len());
        for chunk in self.chunker.chunk(kept) {
            match self.filter.evaluate(&chunk) {
                None => chunks.push(chunk),
                Some(reason) => stats.record_rejection(reason),
            }
        }
        stats.output_chunks = chunks.len();

        tracing::debug!(
            input = stats.input_elements,
            merged = stats.merged_chunks,
            filtered = stats.filtered_total(),
            output = stats.output_chunks,
            anomalies = stats.anomalies.len(),
            "Processed document bundle"
        );

        Ok(PipelineOutput { chunks, stats })
    }
}

impl Default for ProcessingPipeline {
    fn default() -> Self {
        Self::new(&ProcessingConfig::default())
    }
}
