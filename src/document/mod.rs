/*!
 * Document model and document sources/sinks.
 *
 * This module provides:
 * - An in-memory document tree (body → paragraphs/tables → runs)
 * - A style catalog with an explicit fallback table
 * - The `DocumentStore` seam for reading and writing documents, with a JSON
 *   tree backend and a DOCX package backend
 */

use std::io::Write;
use std::path::Path;

use crate::errors::DocumentError;

pub mod docx;
pub mod json_store;
pub mod model;

// Re-export types used by other modules
pub use docx::DocxStore;
pub use json_store::JsonDocumentStore;
pub use model::{
    Block, Cell, Document, Paragraph, ParagraphSource, Row, SourcePackage, StyleCatalog,
    StyleDef, StyleResolution, Table,
};

/// On-disk document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Office Open XML word-processing package (.docx)
    Docx,
    /// Serialized document tree (.json)
    Json,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "docx" => Ok(Self::Docx),
            "json" => Ok(Self::Json),
            other => Err(DocumentError::UnsupportedFormat(if other.is_empty() {
                format!("{} (no extension)", path.display())
            } else {
                format!(".{}", other)
            })),
        }
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Json => "json",
        }
    }

    /// Store implementation for this format.
    pub fn store(&self) -> Box<dyn DocumentStore> {
        match self {
            Self::Docx => Box::new(DocxStore),
            Self::Json => Box::new(JsonDocumentStore),
        }
    }
}

/// Reads documents into the tree model and renders them back to bytes.
///
/// Rendering produces bytes rather than writing a file so callers decide
/// where and how the output is persisted.
pub trait DocumentStore: Send + Sync {
    /// Format handled by this store
    fn format(&self) -> DocumentFormat;

    /// Parse a document from raw file bytes
    fn parse(&self, bytes: &[u8]) -> Result<Document, DocumentError>;

    /// Render a document to raw file bytes
    fn render(&self, document: &Document) -> Result<Vec<u8>, DocumentError>;

    /// Read and parse a document file
    fn read(&self, path: &Path) -> Result<Document, DocumentError> {
        let bytes = std::fs::read(path)?;
        self.parse(&bytes)
    }

    /// Render a document into a writer
    fn write(&self, document: &Document, writer: &mut dyn Write) -> Result<(), DocumentError> {
        writer.write_all(&self.render(document)?)?;
        writer.flush()?;
        Ok(())
    }
}

/// Open a document, choosing the store from the file extension.
pub fn open(path: &Path) -> Result<Document, DocumentError> {
    DocumentFormat::from_path(path)?.store().read(path)
}
