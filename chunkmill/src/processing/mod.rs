mod filter;
mod merger;
mod page_chunker;
mod pipeline;
mod table;
mod tokens;

pub use filter::{ContentFilter, RejectReason};
pub use merger::{HierarchyMerger, MergeAnomaly, MergeOutcome};
pub use page_chunker::PageChunker;
pub use pipeline::{PipelineOutput, PipelineStats, ProcessingPipeline};
pub use table::TableNormalizer;
#[cfg(feature = "tiktoken")]
pub use tokens::TiktokenCounter;
pub use tokens::{CharEstimateCounter, TokenCounter, default_counter};
