/*!
 * JSON document tree store.
 */

use log::debug;

use crate::errors::DocumentError;

use super::{Document, DocumentFormat, DocumentStore};

/// Stores documents as a pretty-printed serde JSON tree
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentStore;

impl DocumentStore for JsonDocumentStore {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Json
    }

    fn parse(&self, bytes: &[u8]) -> Result<Document, DocumentError> {
        let document: Document = serde_json::from_slice(bytes)?;
        debug!("Parsed JSON document with {} body blocks", document.body.len());
        Ok(document)
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>, DocumentError> {
        let mut bytes = serde_json::to_vec_pretty(document)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
