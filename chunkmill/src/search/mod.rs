mod dedup;

pub use dedup::{AggregatedResults, DedupSession, RetrievalHit, SourceKind, aggregate};
