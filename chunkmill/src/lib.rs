//! Hierarchy-aware document chunking and cross-source retrieval
//! deduplication.
//!
//! ```text
//! DocumentBundle ──► HierarchyMerger ──► ContentFilter ──► PageChunker ──► chunks
//!                          │                                    │
//!                          └─► TableNormalizer                  └─► TokenCounter
//!
//! es / graph / web / rdb hits ──► DedupSession::aggregate ──► unique results
//! ```
//!
//! The processing side turns one extracted document bundle into an ordered
//! list of search-ready chunks: elements declaring a hierarchy parent are
//! folded into merged chunks, degenerate content is filtered, and runs of
//! same-page standalone text are buffered into chunked-text units. The search
//! side deduplicates results gathered from heterogeneous retrieval backends
//! against one caller-owned session.
//!
//! The whole core is synchronous, deterministic, and performs no I/O; reading
//! and persisting bundles belongs to the caller.

pub mod config;
pub mod error;
pub mod models;
pub mod processing;
pub mod search;

pub use config::ProcessingConfig;
pub use error::{ChunkmillError, Result};
pub use models::{DocumentBundle, DocumentElement, ItemLabel, ProcessedChunk};
pub use processing::ProcessingPipeline;
pub use search::DedupSession;
