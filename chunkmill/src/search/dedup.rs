use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::models::Metadata;

/// Retrieval backend a result came from. The canonical identity derived for a
/// hit is always tagged with this kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Elasticsearch,
    Graph,
    Web,
    Rdb,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elasticsearch => write!(f, "elasticsearch"),
            Self::Graph => write!(f, "graph"),
            Self::Web => write!(f, "web"),
            Self::Rdb => write!(f, "rdb"),
        }
    }
}

/// One heterogeneous retrieval result. Which optional fields are populated
/// depends on the source kind: `id` for indexed stores, `url` for web hits,
/// `table`/`row_id` for relational rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RetrievalHit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Unique results of one aggregation run, partitioned per source kind plus
/// the concatenated all-unique list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AggregatedResults {
    pub elasticsearch: Vec<RetrievalHit>,
    pub graph: Vec<RetrievalHit>,
    pub web: Vec<RetrievalHit>,
    pub rdb: Vec<RetrievalHit>,
    pub combined: Vec<RetrievalHit>,
    pub distinct_count: usize,
    pub duplicates_dropped: usize,
}

/// Caller-owned deduplication session. The identity set only grows for the
/// session's lifetime; a new session starts empty. Never shared implicitly.
#[derive(Debug, Default)]
pub struct DedupSession {
    seen: HashSet<String>,
    duplicates_dropped: usize,
}

impl DedupSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all recorded identities, starting the session over.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.duplicates_dropped = 0;
    }

    pub fn distinct_count(&self) -> usize {
        self.seen.len()
    }

    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Keep the hits whose canonical identity has not been seen in this
    /// session, recording each kept identity. Input order is preserved.
    pub fn deduplicate(&mut self, hits: Vec<RetrievalHit>, kind: SourceKind) -> Vec<RetrievalHit> {
        let mut kept = Vec::with_capacity(hits.len());
        for hit in hits {
            let identity = canonical_identity(&hit, kind);
            if self.seen.insert(identity) {
                kept.push(hit);
            } else {
                self.duplicates_dropped += 1;
            }
        }
        kept
    }

    /// Run all four source kinds against this one session and collect the
    /// per-kind partitions plus the combined unique list.
    pub fn aggregate(
        &mut self,
        es: Vec<RetrievalHit>,
        graph: Vec<RetrievalHit>,
        web: Vec<RetrievalHit>,
        rdb: Vec<RetrievalHit>,
    ) -> AggregatedResults {
        let elasticsearch = self.deduplicate(es, SourceKind::Elasticsearch);
        let graph = self.deduplicate(graph, SourceKind::Graph);
        let web = self.deduplicate(web, SourceKind::Web);
        let rdb = self.deduplicate(rdb, SourceKind::Rdb);

        let mut combined =
            Vec::with_capacity(elasticsearch.len() + graph.len() + web.len() + rdb.len());
        combined.extend(elasticsearch.iter().cloned());
        combined.extend(graph.iter().cloned());
        combined.extend(web.iter().cloned());
        combined.extend(rdb.iter().cloned());

        AggregatedResults {
            elasticsearch,
            graph,
            web,
            rdb,
            combined,
            distinct_count: self.distinct_count(),
            duplicates_dropped: self.duplicates_dropped(),
        }
    }
}

/// One-shot aggregation over a fresh session; the session lives exactly as
/// long as the call.
pub fn aggregate(
    es: Vec<RetrievalHit>,
    graph: Vec<RetrievalHit>,
    web: Vec<RetrievalHit>,
    rdb: Vec<RetrievalHit>,
) -> AggregatedResults {
    DedupSession::new().aggregate(es, graph, web, rdb)
}

/// Identity derivation, in priority order: explicit identifier, canonical
/// URL (web), (table, row id) composite (rdb), then a stable content digest.
/// Every form is tagged with the source kind.
fn canonical_identity(hit: &RetrievalHit, kind: SourceKind) -> String {
    if let Some(id) = hit.id.as_deref().filter(|id| !id.is_empty()) {
        return format!("{kind}_{id}");
    }

    match kind {
        SourceKind::Web => {
            if let Some(url) = hit.url.as_deref().and_then(canonical_url) {
                return format!("web_url_{url}");
            }
        }
        SourceKind::Rdb => {
            if let (Some(table), Some(row_id)) = (hit.table.as_deref(), hit.row_id.as_deref()) {
                return format!("rdb_{table}_{row_id}");
            }
        }
        SourceKind::Elasticsearch | SourceKind::Graph => {}
    }

    format!("{kind}_hash_{}", content_digest(&hit.content))
}

/// Scheme-normalized URL with the fragment dropped and any trailing slash
/// trimmed, so cosmetic variants of one address collapse to one identity.
fn canonical_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    url.set_fragment(None);
    Some(url.to_string().trim_end_matches('/').to_string())
}

/// Stable SHA-256 prefix. A fixed digest, unlike a runtime-local hash, keeps
/// identities comparable across sessions and processes.
fn content_digest(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}
