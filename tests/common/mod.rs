/*!
 * Common test utilities for the docweave test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use docweave::document::{DocxStore, JsonDocumentStore, Paragraph, Table};
use docweave::{Document, DocumentStore, FormattingRun};

/// Routes library logs to the test output; set RUST_LOG to see them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Title, a one-row table and a two-sentence paragraph
pub fn sample_document() -> Document {
    Document::new()
        .with_paragraph(Paragraph::from_text("Title").with_style("Title"))
        .with_table(Table::from_text_rows([["A", "B"]]))
        .with_paragraph(Paragraph::from_text("Hello world. Second sentence."))
}

/// A document exercising run formatting, styles and tables together
pub fn formatted_document() -> Document {
    Document::new()
        .with_paragraph(Paragraph::from_text("Quarterly report").with_style("Title"))
        .with_paragraph(
            Paragraph::new(vec![
                FormattingRun::plain("Revenue grew "),
                FormattingRun::bold("twelve percent"),
                FormattingRun::plain(". Costs were "),
                FormattingRun::italic("flat"),
                FormattingRun::plain(". See the table."),
            ])
            .with_style("Normal"),
        )
        .with_table(Table::from_text_rows([["Region", "Growth"], ["North", "14%"]]))
        .with_paragraph(
            Paragraph::new(vec![
                FormattingRun::new("Note:", true, true, false),
                FormattingRun::plain(" figures are "),
                FormattingRun::underline("unaudited"),
                FormattingRun::plain("."),
            ])
            .with_style("Heading 2"),
        )
}

/// Writes a document as a JSON tree
pub fn write_json_document(dir: &Path, filename: &str, document: &Document) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, JsonDocumentStore.render(document)?)?;
    Ok(path)
}

/// Writes a document as a freshly generated DOCX package
pub fn write_docx_document(dir: &Path, filename: &str, document: &Document) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, DocxStore.render(document)?)?;
    Ok(path)
}
