use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{ChunkPayload, DocumentElement, ItemLabel, MergedChild, ProcessedChunk};

use super::TableNormalizer;

/// A declared parent reference that could not be used as a merge target:
/// either the parent element is absent from the bundle, or it was itself
/// folded as a child of its own parent. The children were emitted
/// independently instead of being folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAnomaly {
    pub parent_id: String,
    pub child_ids: Vec<String>,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub chunks: Vec<ProcessedChunk>,
    pub anomalies: Vec<MergeAnomaly>,
}

/// Folds elements that declare a hierarchy parent into one merged chunk per
/// parent, and wraps everything else as an independent chunk. Output order
/// follows `index`, the bundle's total order.
pub struct HierarchyMerger {
    normalizer: TableNormalizer,
}

impl HierarchyMerger {
    pub fn new() -> Self {
        Self {
            normalizer: TableNormalizer::new(),
        }
    }

    pub fn merge(&self, elements: &[DocumentElement]) -> MergeOutcome {
        let by_id: HashMap<&str, &DocumentElement> = elements
            .iter()
            .map(|e| (e.chunk_id.as_str(), e))
            .collect();

        // Partition into child groups (keyed by declared parent) and
        // parentless candidates, preserving first-reference order.
        let mut groups: HashMap<&str, Vec<&DocumentElement>> = HashMap::new();
        let mut group_order: Vec<&str> = Vec::new();
        let mut parentless: Vec<&DocumentElement> = Vec::new();

        for element in elements {
            match element.hierarchy.as_deref() {
                Some(parent_id) if !parent_id.is_empty() => {
                    if !groups.contains_key(parent_id) {
                        group_order.push(parent_id);
                    }
                    groups.entry(parent_id).or_default().push(element);
                }
                _ => parentless.push(element),
            }
        }

        let used_as_parent: HashSet<&str> = group_order.iter().copied().collect();

        let mut chunks = Vec::new();
        let mut anomalies = Vec::new();

        for parent_id in &group_order {
            let mut children = groups.remove(*parent_id).unwrap_or_default();
            children.sort_by_key(|child| child.index);

            match by_id.get(*parent_id) {
                // A parent that declares its own hierarchy reference is
                // consumed as a child of that group; folding its children
                // here as well would index the parent's content twice.
                Some(parent) if has_parent_ref(parent) => {
                    tracing::warn!(
                        parent_id = *parent_id,
                        child_count = children.len(),
                        "Hierarchy parent is itself a child; emitting its children independently"
                    );
                    anomalies.push(MergeAnomaly {
                        parent_id: (*parent_id).to_string(),
                        child_ids: children.iter().map(|c| c.chunk_id.clone()).collect(),
                    });
                    for child in &children {
                        if let Some(chunk) = self.wrap_independent(child) {
                            chunks.push(chunk);
                        }
                    }
                }
                Some(parent) => chunks.push(self.build_merged(parent, &children)),
                None => {
                    // Degrade gracefully: the children still carry indexable
                    // content even when their declared parent never arrived.
                    tracing::warn!(
                        parent_id = *parent_id,
                        child_count = children.len(),
                        "Hierarchy parent not found; emitting children independently"
                    );
                    anomalies.push(MergeAnomaly {
                        parent_id: (*parent_id).to_string(),
                        child_ids: children.iter().map(|c| c.chunk_id.clone()).collect(),
                    });
                    for child in &children {
                        if let Some(chunk) = self.wrap_independent(child) {
                            chunks.push(chunk);
                        }
                    }
                }
            }
        }

        // True independents: parentless elements not consumed as a parent.
        for element in parentless {
            if used_as_parent.contains(element.chunk_id.as_str()) {
                continue;
            }
            if let Some(chunk) = self.wrap_independent(element) {
                chunks.push(chunk);
            }
        }

        chunks.sort_by_key(|chunk| chunk.index);

        MergeOutcome { chunks, anomalies }
    }

    fn build_merged(&self, parent: &DocumentElement, children: &[&DocumentElement]) -> ProcessedChunk {
        let mut segments: Vec<String> = Vec::with_capacity(children.len() + 1);

        let parent_content = parent.content.trim();
        if !parent_content.is_empty() {
            segments.push(parent_content.to_string());
        }

        for child in children {
            let rendered = match child.item_label {
                ItemLabel::Table => self.normalizer.normalize(&child.content),
                _ => child.content.trim().to_string(),
            };
            if !rendered.is_empty() {
                segments.push(rendered);
            }
        }

        let merged_children: Vec<MergedChild> = children
            .iter()
            .map(|child| MergedChild {
                item_label: child.item_label,
                chunk_id: child.chunk_id.clone(),
                content: child.original_or_content().to_string(),
                summary: child.summary.clone(),
            })
            .collect();

        let mut page_numbers: BTreeSet<u32> = parent.page_numbers.clone();
        for child in children {
            page_numbers.extend(child.page_numbers.iter().copied());
        }

        ProcessedChunk {
            chunk_id: parent.chunk_id.clone(),
            document_id: parent.document_id.clone(),
            content: segments.join("\n"),
            title: parent.title.clone(),
            index: parent.index,
            page_numbers,
            summary: parent.summary.clone(),
            link: parent.link.clone(),
            payload: ChunkPayload::Merged {
                merged_count: children.len() + 1,
                children: merged_children,
            },
        }
    }

    fn wrap_independent(&self, element: &DocumentElement) -> Option<ProcessedChunk> {
        match element.item_label {
            // Pictures are excluded upstream of indexing; a stray one is
            // dropped rather than failing the bundle.
            ItemLabel::Picture => None,
            ItemLabel::Table => {
                let mut chunk = ProcessedChunk::from_element(element);
                chunk.content = self.normalizer.normalize(&element.content);
                // Single-entry wrapper keeps the downstream shape uniform with
                // merged chunks while preserving the raw markup.
                chunk.payload = ChunkPayload::Table {
                    children: vec![MergedChild {
                        item_label: ItemLabel::Table,
                        chunk_id: element.chunk_id.clone(),
                        content: element.original_or_content().to_string(),
                        summary: element.summary.clone(),
                    }],
                };
                Some(chunk)
            }
            ItemLabel::Text | ItemLabel::Merged | ItemLabel::ChunkedText => {
                Some(ProcessedChunk::from_element(element))
            }
        }
    }
}

fn has_parent_ref(element: &DocumentElement) -> bool {
    element.hierarchy.as_deref().is_some_and(|h| !h.is_empty())
}

impl Default for HierarchyMerger {
    fn default() -> Self {
        Self::new()
    }
}
