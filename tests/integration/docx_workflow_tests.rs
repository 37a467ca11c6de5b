/*!
 * Integration tests for DOCX packages
 */

use anyhow::Result;
use std::fs;

use crate::common;
use docweave::document::{self, DocxStore};
use docweave::{
    DocumentStore, ReconstructionOptions, Segmenter, StyleCatalog, reconstruct, walk,
};

/// Test that write → read keeps node order, styles and runs
#[test]
fn test_docx_writeThenRead_shouldPreserveNodes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::formatted_document();
    let path = common::write_docx_document(temp_dir.path(), "report.docx", &original)?;

    let reread = document::open(&path)?;

    let before = walk(&original).nodes;
    let after = walk(&reread).nodes;
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.position, a.position);
        assert_eq!(b.kind, a.kind);
        assert_eq!(b.style, a.style);
        assert_eq!(b.table_coord, a.table_coord);
        assert_eq!(b.runs, a.runs);
    }
    assert!(reread.package.is_some());
    Ok(())
}

/// Test a full import → edit → export through DOCX bytes
#[test]
fn test_docx_editAndExport_shouldRewriteOnlyEditedText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_docx_document(temp_dir.path(), "report.docx", &common::formatted_document())?;

    let source = DocxStore.read(&path)?;
    let mut segments = Segmenter::default().segment_all(&walk(&source).nodes);
    segments[0].target_text = "Quartalsbericht".to_string();
    let growth = segments
        .iter_mut()
        .find(|s| s.source_text == "Growth")
        .expect("table cell segment");
    growth.target_text = "Wachstum".to_string();

    let rebuilt = reconstruct(
        &source,
        &segments,
        &StyleCatalog::default(),
        &ReconstructionOptions::default(),
    )?;
    let output = temp_dir.path().join("report.de.docx");
    let mut file = fs::File::create(&output)?;
    DocxStore.write(&rebuilt.document, &mut file)?;
    drop(file);

    let exported = document::open(&output)?;
    let nodes = walk(&exported).nodes;
    let texts: Vec<&str> = nodes.iter().map(|n| n.plain_text.as_str()).collect();

    assert_eq!(
        texts,
        vec![
            "Quartalsbericht",
            "Revenue grew twelve percent. Costs were flat. See the table.",
            "Region",
            "Wachstum",
            "North",
            "14%",
            "Note: figures are unaudited.",
        ]
    );
    assert_eq!(nodes[0].style.as_deref(), Some("Title"));
    assert_eq!(nodes[6].style.as_deref(), Some("Heading 2"));
    assert_eq!(nodes[6].encoded(), "<bi>Note:</bi> figures are <u>unaudited</u>.");
    assert!(rebuilt.report.is_clean());
    Ok(())
}

/// Test that exporting twice from the same source gives identical documents
#[test]
fn test_docx_exportTwice_shouldBeStable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_docx_document(temp_dir.path(), "stable.docx", &common::sample_document())?;
    let source = DocxStore.read(&path)?;
    let segments = Segmenter::default().segment_all(&walk(&source).nodes);

    let first = reconstruct(&source, &segments, &source.styles, &ReconstructionOptions::default())?;
    let first_bytes = DocxStore.render(&first.document)?;
    let reparsed = DocxStore.parse(&first_bytes)?;
    let second = reconstruct(&reparsed, &segments, &reparsed.styles, &ReconstructionOptions::default())?;

    assert_eq!(first.document.body, second.document.body);
    Ok(())
}

/// Test that a file that is not a zip package is rejected
#[test]
fn test_docx_read_withPlainTextFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "fake.docx", "not a package")?;

    assert!(document::open(&path).is_err());
    Ok(())
}
