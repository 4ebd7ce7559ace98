use std::collections::BTreeSet;

use chunkmill::models::{ChunkPayload, DocumentBundle, DocumentMeta};
use chunkmill::processing::{ContentFilter, TableNormalizer};
use chunkmill::search::{DedupSession, RetrievalHit, SourceKind};
use chunkmill::{DocumentElement, ItemLabel, ProcessingPipeline};

fn element(chunk_id: &str, index: i64, label: ItemLabel, page: u32, content: &str) -> DocumentElement {
    DocumentElement {
        chunk_id: chunk_id.to_string(),
        document_id: "doc-1".to_string(),
        item_label: label,
        content: content.to_string(),
        original_content: None,
        hierarchy: None,
        index,
        page_numbers: BTreeSet::from([page]),
        summary: None,
        title: None,
        link: None,
    }
}

fn bundle(elements: Vec<DocumentElement>) -> DocumentBundle {
    DocumentBundle {
        document: DocumentMeta {
            title: Some("2023 회계연도 결산 보고서".to_string()),
            ..DocumentMeta::default()
        },
        elements,
    }
}

const LONG_TEXT_A: &str = "제1장에서는 전체 예산 집행 현황과 주요 쟁점 사항을 간략히 정리한다.";
const LONG_TEXT_B: &str = "제2장에서는 부처별 세부 집행 내역을 항목 단위로 검토하고 평가한다.";

#[test]
fn every_output_chunk_passes_the_filter() {
    let pipeline = ProcessingPipeline::default();
    let filter = ContentFilter::default();
    let b = bundle(vec![
        element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A),
        element("c2", 1, ItemLabel::Text, 1, "   "),
        element("c3", 2, ItemLabel::Text, 1, "12-34 |. ()"),
        element(
            "c4",
            3,
            ItemLabel::Table,
            2,
            "<table><tr><td>합계</td><td>1,250</td></tr></table>",
        ),
    ]);

    let output = pipeline.process(&b).unwrap();

    assert!(!output.chunks.is_empty());
    assert!(output.chunks.iter().all(|c| filter.accept(c)));
}

#[test]
fn resolvable_children_appear_exactly_once() {
    let pipeline = ProcessingPipeline::default();
    let mut child_text = element("c1", 1, ItemLabel::Text, 3, LONG_TEXT_A);
    child_text.hierarchy = Some("P1".to_string());
    let mut child_table = element(
        "c2",
        2,
        ItemLabel::Table,
        4,
        "<table><tr><td>세출</td><td>9,000</td></tr></table>",
    );
    child_table.hierarchy = Some("P1".to_string());
    let b = bundle(vec![
        element("P1", 0, ItemLabel::Text, 3, "부처별 예산 집행 개요"),
        child_text,
        child_table,
    ]);

    let output = pipeline.process(&b).unwrap();

    assert_eq!(output.chunks.len(), 1);
    let merged = &output.chunks[0];
    assert_eq!(merged.item_label(), ItemLabel::Merged);
    assert_eq!(merged.page_numbers, BTreeSet::from([3, 4]));
    match &merged.payload {
        ChunkPayload::Merged {
            children,
            merged_count,
        } => {
            assert_eq!(*merged_count, 3);
            // Children in non-decreasing index order, each exactly once.
            assert_eq!(children[0].chunk_id, "c1");
            assert_eq!(children[1].chunk_id, "c2");
        }
        other => panic!("expected merged payload, got {other:?}"),
    }
    // Neither child surfaces as a top-level chunk.
    assert!(output.chunks.iter().all(|c| c.chunk_id == "P1"));
}

#[test]
fn page_chunker_output_reconstructs_filtered_order() {
    let pipeline = ProcessingPipeline::default();
    let b = bundle(vec![
        element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A),
        element("c2", 1, ItemLabel::Text, 1, LONG_TEXT_B),
        element(
            "t1",
            2,
            ItemLabel::Table,
            1,
            "<table><tr><td>세입</td><td>100</td></tr></table>",
        ),
        element("c3", 3, ItemLabel::Text, 2, LONG_TEXT_A),
    ]);

    let output = pipeline.process(&b).unwrap();

    let covered: Vec<&str> = output.chunks.iter().flat_map(|c| c.covered_ids()).collect();
    assert_eq!(covered, vec!["c1", "c2", "t1", "c3"]);
}

#[test]
fn three_same_page_elements_yield_two_units() {
    let pipeline = ProcessingPipeline::default();
    let b = bundle(vec![
        element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A),
        element("c2", 1, ItemLabel::Text, 1, LONG_TEXT_B),
        element(
            "t1",
            2,
            ItemLabel::Table,
            1,
            "<table><tr><td>예산</td><td>500</td></tr></table>",
        ),
    ]);

    let output = pipeline.process(&b).unwrap();

    assert_eq!(output.chunks.len(), 2);
    assert_eq!(output.chunks[0].item_label(), ItemLabel::ChunkedText);
    assert_eq!(
        output.chunks[0].content,
        format!("{LONG_TEXT_A}\n\n{LONG_TEXT_B}")
    );
    assert_eq!(output.chunks[1].item_label(), ItemLabel::Table);
}

#[test]
fn table_normalizer_is_idempotent() {
    let normalizer = TableNormalizer::new();
    let raw = r#"<table>
        <caption>부처별 집행 실적</caption>
        <tr><th>부처</th><th>집행액</th></tr>
        <tr><td>교육부</td><td>75,300,000</td></tr>
    </table>"#;
    let once = normalizer.normalize(raw);
    assert_eq!(normalizer.normalize(&once), once);
}

#[test]
fn dedup_second_call_never_grows() {
    let mut session = DedupSession::new();
    let hits = || {
        vec![
            RetrievalHit {
                id: Some("c1".to_string()),
                content: "첫 결과".to_string(),
                ..RetrievalHit::default()
            },
            RetrievalHit {
                id: Some("c2".to_string()),
                content: "둘째 결과".to_string(),
                ..RetrievalHit::default()
            },
        ]
    };

    let first = session.deduplicate(hits(), SourceKind::Elasticsearch);
    let second = session.deduplicate(hits(), SourceKind::Elasticsearch);

    assert!(second.len() <= first.len());
}

#[test]
fn dedup_examples_from_heterogeneous_sources() {
    let mut session = DedupSession::new();

    // An elasticsearch hit submitted twice comes back once.
    let es_hit = RetrievalHit {
        id: Some("c1".to_string()),
        content: "색인된 문서".to_string(),
        ..RetrievalHit::default()
    };
    let kept = session.deduplicate(vec![es_hit.clone(), es_hit], SourceKind::Elasticsearch);
    assert_eq!(kept.len(), 1);

    // A web hit without a URL deduplicates on a stable content digest.
    let web_hit = || RetrievalHit {
        content: "크롤링된 본문".to_string(),
        ..RetrievalHit::default()
    };
    let kept = session.deduplicate(vec![web_hit()], SourceKind::Web);
    assert_eq!(kept.len(), 1);
    let kept = session.deduplicate(vec![web_hit()], SourceKind::Web);
    assert!(kept.is_empty());
}

#[test]
fn missing_parent_degrades_without_failing() {
    let pipeline = ProcessingPipeline::default();
    let mut orphan = element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A);
    orphan.hierarchy = Some("NEVER_EXTRACTED".to_string());
    let b = bundle(vec![orphan]);

    let output = pipeline.process(&b).unwrap();

    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.stats.anomalies.len(), 1);
    assert_eq!(output.stats.anomalies[0].parent_id, "NEVER_EXTRACTED");
}

#[test]
fn bundle_round_trips_through_json() {
    let b = bundle(vec![element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A)]);
    let json = serde_json::to_string(&b).unwrap();
    let parsed = DocumentBundle::from_json(&json).unwrap();
    assert_eq!(parsed, b);
}

#[test]
fn processed_chunks_serialize_with_flat_item_label() {
    let pipeline = ProcessingPipeline::default();
    let b = bundle(vec![element("c1", 0, ItemLabel::Text, 1, LONG_TEXT_A)]);

    let output = pipeline.process(&b).unwrap();
    let json = serde_json::to_value(&output.chunks).unwrap();

    assert_eq!(json[0]["item_label"], "chunked_text");
    assert!(json[0]["token_count"].is_object());
}
