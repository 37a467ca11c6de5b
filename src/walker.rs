/*!
 * Document walker.
 *
 * One traversal of the body in source order. Paragraphs and table cells are
 * emitted as a single tagged stream of content nodes, so a table sitting
 * between two paragraphs yields its cells between them.
 *
 * Every paragraph slot the traversal visits gets the next position from one
 * counter, including blank paragraphs that produce no node. Reconstruction
 * walks the same slots through `node_addresses`, so positions line up by
 * construction rather than by matching.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::document::{Block, Document, Paragraph};
use crate::formatting::{FormattingRun, encode};
use crate::report::Issue;

/// What kind of slot a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Paragraph,
    TableCell,
}

/// Table, row and cell indices of a table-cell node (all zero based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableCoord {
    pub table: usize,
    pub row: usize,
    pub cell: usize,
}

/// Where a paragraph slot lives in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreePath {
    /// Direct child of the body
    Body { block: usize },
    /// Paragraph inside a table cell
    Cell {
        block: usize,
        row: usize,
        cell: usize,
        paragraph: usize,
    },
}

/// One paragraph slot visited by the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress {
    pub position: usize,
    pub kind: NodeKind,
    pub table_coord: Option<TableCoord>,
    pub path: TreePath,
}

/// One translatable block: a body paragraph or a table-cell paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub position: usize,
    pub kind: NodeKind,
    pub style: Option<String>,
    /// Present exactly when `kind` is `TableCell`
    pub table_coord: Option<TableCoord>,
    pub plain_text: String,
    pub runs: Vec<FormattingRun>,
}

impl ContentNode {
    /// Runs encoded as tagged text
    pub fn encoded(&self) -> String {
        encode(&self.runs)
    }

    pub fn is_table_cell(&self) -> bool {
        self.kind == NodeKind::TableCell
    }
}

/// Nodes in document order plus anything skipped along the way
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    pub nodes: Vec<ContentNode>,
    pub issues: Vec<Issue>,
}

/// Visit every paragraph slot in document order.
fn traverse(document: &Document) -> (Vec<NodeAddress>, Vec<Issue>) {
    let mut addresses = Vec::new();
    let mut issues = Vec::new();
    let mut position = 0usize;
    let mut table_index = 0usize;

    for (block_index, block) in document.body.iter().enumerate() {
        match block {
            Block::Paragraph(_) => {
                addresses.push(NodeAddress {
                    position,
                    kind: NodeKind::Paragraph,
                    table_coord: None,
                    path: TreePath::Body { block: block_index },
                });
                position += 1;
            }
            Block::Table(table) => {
                for (row_index, row) in table.rows.iter().enumerate() {
                    for (cell_index, cell) in row.cells.iter().enumerate() {
                        let coord = TableCoord {
                            table: table_index,
                            row: row_index,
                            cell: cell_index,
                        };
                        for (inner_index, inner) in cell.blocks.iter().enumerate() {
                            match inner {
                                Block::Paragraph(_) => {
                                    addresses.push(NodeAddress {
                                        position,
                                        kind: NodeKind::TableCell,
                                        table_coord: Some(coord),
                                        path: TreePath::Cell {
                                            block: block_index,
                                            row: row_index,
                                            cell: cell_index,
                                            paragraph: inner_index,
                                        },
                                    });
                                    position += 1;
                                }
                                Block::Table(_) => {
                                    let message = format!(
                                        "Nested table in table {} row {} cell {} skipped",
                                        table_index, row_index, cell_index
                                    );
                                    warn!("{}", message);
                                    issues.push(Issue::structural_skip(message));
                                }
                                Block::Unsupported { kind, .. } => {
                                    let message = format!(
                                        "Unsupported '{}' element in table {} row {} cell {} skipped",
                                        kind, table_index, row_index, cell_index
                                    );
                                    warn!("{}", message);
                                    issues.push(Issue::structural_skip(message));
                                }
                            }
                        }
                    }
                }
                table_index += 1;
            }
            Block::Unsupported { kind, .. } => {
                let message = format!(
                    "Unsupported '{}' element at body index {} skipped",
                    kind, block_index
                );
                warn!("{}", message);
                issues.push(Issue::structural_skip(message));
            }
        }
    }

    (addresses, issues)
}

/// Every paragraph slot in traversal order, blank ones included.
pub fn node_addresses(document: &Document) -> Vec<NodeAddress> {
    traverse(document).0
}

/// Paragraph at a tree path, if the path is still valid for this document.
pub fn paragraph_at<'a>(document: &'a Document, path: &TreePath) -> Option<&'a Paragraph> {
    let block = match *path {
        TreePath::Body { block } => document.body.get(block)?,
        TreePath::Cell {
            block,
            row,
            cell,
            paragraph,
        } => match document.body.get(block)? {
            Block::Table(table) => table
                .rows
                .get(row)?
                .cells
                .get(cell)?
                .blocks
                .get(paragraph)?,
            _ => return None,
        },
    };
    match block {
        Block::Paragraph(p) => Some(p),
        _ => None,
    }
}

/// Mutable paragraph at a tree path.
pub fn paragraph_mut<'a>(document: &'a mut Document, path: &TreePath) -> Option<&'a mut Paragraph> {
    let block = match *path {
        TreePath::Body { block } => document.body.get_mut(block)?,
        TreePath::Cell {
            block,
            row,
            cell,
            paragraph,
        } => match document.body.get_mut(block)? {
            Block::Table(table) => table
                .rows
                .get_mut(row)?
                .cells
                .get_mut(cell)?
                .blocks
                .get_mut(paragraph)?,
            _ => return None,
        },
    };
    match block {
        Block::Paragraph(p) => Some(p),
        _ => None,
    }
}

/// Walk the document and emit a content node for every non-blank slot.
pub fn walk(document: &Document) -> WalkOutput {
    let (addresses, issues) = traverse(document);

    let nodes: Vec<ContentNode> = addresses
        .iter()
        .filter_map(|address| {
            let paragraph = paragraph_at(document, &address.path)?;
            if paragraph.is_blank() {
                return None;
            }
            Some(ContentNode {
                position: address.position,
                kind: address.kind,
                style: paragraph.style.clone(),
                table_coord: address.table_coord,
                plain_text: paragraph.text(),
                runs: paragraph.runs.clone(),
            })
        })
        .collect();

    debug!(
        "Walked {} paragraph slots into {} content nodes ({} skipped elements)",
        addresses.len(),
        nodes.len(),
        issues.len()
    );

    WalkOutput { nodes, issues }
}
