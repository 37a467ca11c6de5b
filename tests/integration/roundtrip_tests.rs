/*!
 * Integration tests for extract → edit → reconstruct through the library API
 */

use anyhow::Result;

use crate::common;
use docweave::document::Paragraph;
use docweave::project::{Edit, SegmentStore};
use docweave::{
    Document, FormattingRun, IssueKind, ReconstructionError, ReconstructionOptions, Segment,
    Segmenter, StyleCatalog, reconstruct, walk,
};

fn import(document: &Document) -> Vec<Segment> {
    Segmenter::default().segment_all(&walk(document).nodes)
}

/// Test the full round trip with no edits
#[test]
fn test_roundTrip_withSampleDocument_shouldRejoinSentences() -> Result<()> {
    let original = common::sample_document();
    let segments = import(&original);

    let rebuilt = reconstruct(
        &original,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;

    let texts: Vec<String> = walk(&rebuilt.document)
        .nodes
        .into_iter()
        .map(|n| n.plain_text)
        .collect();
    assert_eq!(texts, vec!["Title", "A", "B", "Hello world. Second sentence."]);
    assert_eq!(rebuilt.report.segments_exported, 5);
    assert!(rebuilt.report.is_clean());
    Ok(())
}

/// Test that untouched segments reproduce text, styles and runs
#[test]
fn test_roundTrip_withFormattedDocument_shouldBeIdempotent() -> Result<()> {
    let original = common::formatted_document();
    let segments = import(&original);

    let rebuilt = reconstruct(
        &original,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;

    let before = walk(&original).nodes;
    let after = walk(&rebuilt.document).nodes;
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.plain_text, a.plain_text);
        assert_eq!(b.style, a.style);
        assert_eq!(b.kind, a.kind);
        assert_eq!(b.table_coord, a.table_coord);
        assert_eq!(b.encoded(), a.encoded());
    }
    Ok(())
}

/// Test that edits made through the store reach the rebuilt document
#[test]
fn test_roundTrip_withStoreEdits_shouldApplyTargets() -> Result<()> {
    let original = common::formatted_document();
    let store = SegmentStore::new(import(&original));

    // "Revenue grew <b>twelve percent</b>." is segment 2
    store.apply(Edit::SetTarget {
        id: 2,
        text: "Der Umsatz wuchs um <b>zwölf Prozent</b>.".to_string(),
    })?;
    let snapshot = store.snapshot();

    // Edits after the snapshot are not part of this export
    store.apply(Edit::SetTarget {
        id: 1,
        text: "Ignored".to_string(),
    })?;

    let rebuilt = reconstruct(
        &original,
        &snapshot,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;

    let nodes = walk(&rebuilt.document).nodes;
    assert_eq!(nodes[0].plain_text, "Quarterly report");
    assert_eq!(
        nodes[1].encoded(),
        "Der Umsatz wuchs um <b>zwölf Prozent</b>. Costs were <i>flat</i>. See the table."
    );
    assert_eq!(nodes[1].style.as_deref(), Some("Normal"));
    Ok(())
}

/// Test that malformed tags block the export and name every offender
#[test]
fn test_reconstruct_withBrokenTags_shouldListAllOffenders() {
    let original = common::sample_document();
    let mut segments = import(&original);
    segments[0].target_text = "<b>Titel".to_string();
    segments[4].target_text = "Zweiter <i>Satz</b>.".to_string();

    let result = reconstruct(
        &original,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    );

    match result {
        Err(e @ ReconstructionError::TagSyntax { .. }) => {
            assert_eq!(e.segment_ids(), vec![1, 5]);
        }
        other => panic!("expected tag syntax error, got {:?}", other.map(|r| r.report)),
    }
}

/// Test that an unknown style degrades to the default and is reported
#[test]
fn test_reconstruct_withStyleMissingFromCatalog_shouldUseDefault() -> Result<()> {
    let original = Document::new()
        .with_paragraph(Paragraph::from_text("Fancy words.").with_style("Fancy Heading"))
        .with_paragraph(Paragraph::from_text("Plain words.").with_style("Normal"));
    let segments = import(&original);

    let rebuilt = reconstruct(
        &original,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;

    let styles: Vec<Option<String>> = walk(&rebuilt.document)
        .nodes
        .into_iter()
        .map(|n| n.style)
        .collect();
    assert_eq!(styles, vec![Some("Normal".to_string()), Some("Normal".to_string())]);
    assert_eq!(rebuilt.report.count(IssueKind::StyleNotFound), 1);
    assert_eq!(
        rebuilt.report.summary(),
        "2/2 segments exported, 1 style not found (defaults used)"
    );
    Ok(())
}

/// Test that an untagged edit keeps the source node's formatting
#[test]
fn test_reconstruct_withUntaggedEditOfBoldNode_shouldCarryFormatting() -> Result<()> {
    let original = Document::new().with_paragraph(Paragraph::new(vec![FormattingRun::bold(
        "Warning",
    )]));
    let mut segments = import(&original);
    segments[0].target_text = "Achtung".to_string();

    let rebuilt = reconstruct(
        &original,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;

    assert_eq!(walk(&rebuilt.document).nodes[0].encoded(), "<b>Achtung</b>");
    Ok(())
}
