/*!
 * Tests for the walker and segmenter working together
 */

use docweave::app_config::SegmentationConfig;
use docweave::document::{Paragraph, Table};
use docweave::{
    Document, FormattingRun, NodeKind, SegmentStatus, Segmenter, StyleCategory, TableCoord,
    classify, walk,
};

use crate::common;

#[test]
fn test_walk_withTableBetweenParagraphs_shouldKeepDocumentOrder() {
    let nodes = walk(&common::sample_document()).nodes;

    let texts: Vec<&str> = nodes.iter().map(|n| n.plain_text.as_str()).collect();
    let categories: Vec<StyleCategory> = nodes
        .iter()
        .map(|n| classify(n.style.as_deref()).category)
        .collect();

    assert_eq!(texts, vec!["Title", "A", "B", "Hello world. Second sentence."]);
    assert_eq!(
        categories,
        vec![
            StyleCategory::Title,
            StyleCategory::Normal,
            StyleCategory::Normal,
            StyleCategory::Normal
        ]
    );
    assert_eq!(nodes[1].kind, NodeKind::TableCell);
    assert_eq!(nodes[3].kind, NodeKind::Paragraph);
}

#[test]
fn test_segmentAll_withSampleDocument_shouldSplitOnlyTheParagraph() {
    let nodes = walk(&common::sample_document()).nodes;
    let segments = Segmenter::default().segment_all(&nodes);

    let texts: Vec<&str> = segments.iter().map(|s| s.source_text.as_str()).collect();
    assert_eq!(texts, vec!["Title", "A", "B", "Hello world.", "Second sentence."]);

    let ids: Vec<usize> = segments.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    assert_eq!(segments[3].owning_node_position, segments[4].owning_node_position);
    assert_eq!(
        segments[2].table_coord,
        Some(TableCoord { table: 0, row: 0, cell: 1 })
    );
    assert!(segments.iter().all(|s| s.status == SegmentStatus::Untranslated));
}

#[test]
fn test_segment_withTableCellSentences_shouldNotSplitCell() {
    let doc = Document::new().with_table(Table::from_text_rows([["One. Two. Three."]]));

    let segments = Segmenter::default().segment_all(&walk(&doc).nodes);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].source_text, "One. Two. Three.");
    assert!(segments[0].is_table_cell());
}

#[test]
fn test_segment_withFormattingAcrossSentences_shouldKeepTagsBalanced() {
    let doc = Document::new().with_paragraph(Paragraph::new(vec![
        FormattingRun::plain("Start "),
        FormattingRun::bold("here. And continue"),
        FormattingRun::plain(" there. Last one."),
    ]));

    let segments = Segmenter::default().segment_all(&walk(&doc).nodes);

    for segment in &segments {
        assert!(
            docweave::validate(&segment.source_text).ok,
            "unbalanced segment {:?}",
            segment.source_text
        );
    }
    let rejoined: Vec<String> = segments.iter().map(|s| docweave::strip(&s.source_text)).collect();
    assert_eq!(rejoined.join(" "), "Start here. And continue there. Last one.");
}

#[test]
fn test_segmenter_withSplittingDisabled_shouldKeepParagraphsWhole() {
    let config = SegmentationConfig {
        split_sentences: false,
        extra_abbreviations: Vec::new(),
    };

    let segments = Segmenter::new(&config).segment_all(&walk(&common::sample_document()).nodes);

    assert_eq!(segments.len(), 4);
    assert_eq!(segments[3].source_text, "Hello world. Second sentence.");
}

#[test]
fn test_segmenter_withExtraAbbreviation_shouldNotSplitAfterIt() {
    let config = SegmentationConfig {
        split_sentences: true,
        extra_abbreviations: vec!["ca.".to_string()],
    };
    let doc = Document::new().with_paragraph(Paragraph::from_text("It weighs ca. Ten tons. Really."));

    let segments = Segmenter::new(&config).segment_all(&walk(&doc).nodes);

    let texts: Vec<&str> = segments.iter().map(|s| s.source_text.as_str()).collect();
    assert_eq!(texts, vec!["It weighs ca. Ten tons.", "Really."]);
}
