/*!
 * Core document tree types.
 *
 * A document is a body of block children (paragraphs and tables, in source
 * order) plus the catalog of paragraph styles it may reference. Tables hold
 * rows of cells, and each cell holds its own blocks.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::formatting::{FormattingRun, merge_adjacent};

/// A complete rich-text document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Paragraph styles known to this document
    #[serde(default)]
    pub styles: StyleCatalog,

    /// Block children of the body, in source order
    #[serde(default)]
    pub body: Vec<Block>,

    /// Original container the document was read from, used to write back
    /// everything the tree does not model
    #[serde(skip)]
    pub package: Option<Arc<SourcePackage>>,
}

impl Document {
    /// Create an empty document with the default style catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph block.
    pub fn with_paragraph(mut self, paragraph: Paragraph) -> Self {
        self.body.push(Block::Paragraph(paragraph));
        self
    }

    /// Append a table block.
    pub fn with_table(mut self, table: Table) -> Self {
        self.body.push(Block::Table(table));
        self
    }

    /// Replace the style catalog.
    pub fn with_styles(mut self, styles: StyleCatalog) -> Self {
        self.styles = styles;
        self
    }

    /// Plain text of every body paragraph, for diagnostics.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.body
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p.text()),
                _ => None,
            })
            .collect()
    }
}

/// Raw pieces of the original container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePackage {
    /// Complete original file bytes
    pub bytes: Vec<u8>,
    /// Original opening tag of the document root, with namespace declarations
    pub root_tag: Option<String>,
    /// Original section properties markup that closes the body
    pub section_xml: Option<String>,
}

/// A child of the body or of a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// An element the tree does not model; passed through untouched
    Unsupported {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw: Option<String>,
    },
}

/// A paragraph: a style name and an ordered list of runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph style name (not id), e.g. "Heading 1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default)]
    pub runs: Vec<FormattingRun>,

    /// Paragraph properties other than the style, kept as source markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_xml: Option<String>,

    /// Markup the paragraph was read from; not part of equality
    #[serde(skip)]
    pub source: Option<Arc<ParagraphSource>>,
}

impl PartialEq for Paragraph {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style
            && self.runs == other.runs
            && self.properties_xml == other.properties_xml
    }
}

/// A paragraph element as found in the source container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSource {
    /// The complete original element
    pub xml: String,
    /// Style, properties and runs as read
    pub style: Option<String>,
    pub properties_xml: Option<String>,
    pub runs: Vec<FormattingRun>,
    /// Local names of inline elements the runs do not represent
    /// (drawings, hyperlinks, bookmarks, revisions, fields)
    pub unmodeled: Vec<String>,
}

impl Paragraph {
    /// Create a paragraph from runs with no explicit style.
    pub fn new(runs: Vec<FormattingRun>) -> Self {
        Self {
            style: None,
            runs,
            properties_xml: None,
            source: None,
        }
    }

    /// Create a single-run, unformatted paragraph.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![FormattingRun::plain(text)])
    }

    /// Set the style name.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Whether the paragraph has no visible text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Source markup, while the paragraph still reads as it was parsed.
    ///
    /// Runs are compared after merging, so splitting or joining runs with
    /// equal attributes does not count as a change.
    pub fn unchanged_source(&self) -> Option<&ParagraphSource> {
        let source = self.source.as_deref()?;
        let unchanged = self.style == source.style
            && self.properties_xml == source.properties_xml
            && merge_adjacent(self.runs.clone()) == merge_adjacent(source.runs.clone());
        unchanged.then_some(source)
    }

    /// Inline elements a rewrite of this paragraph loses.
    pub fn dropped_inline(&self) -> &[String] {
        match self.source.as_deref() {
            Some(source) if self.unchanged_source().is_none() => &source.unmodeled,
            _ => &[],
        }
    }
}

/// A table: rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Row>,

    /// Table properties and grid, kept as source markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_xml: Option<String>,
}

impl Table {
    /// Build a table of single-paragraph cells from text.
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| Row {
                    cells: row.into_iter().map(Cell::from_text).collect(),
                    properties_xml: None,
                })
                .collect(),
            properties_xml: None,
        }
    }
}

/// One table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_xml: Option<String>,
}

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_xml: Option<String>,
}

impl Cell {
    /// Create a cell holding one unformatted paragraph.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_paragraphs(vec![Paragraph::from_text(text)])
    }

    /// Create a cell from paragraphs.
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            blocks: paragraphs.into_iter().map(Block::Paragraph).collect(),
            properties_xml: None,
        }
    }
}

/// One paragraph style definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDef {
    /// Identifier used in markup (e.g. "Heading1")
    pub id: String,
    /// Display name (e.g. "Heading 1")
    pub name: String,
}

impl StyleDef {
    /// Create a definition whose id is the name without spaces.
    pub fn from_name(name: &str) -> Self {
        Self {
            id: name.split_whitespace().collect(),
            name: name.to_string(),
        }
    }
}

/// How a requested style name was resolved against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleResolution {
    /// The catalog knows the name (possibly after normalizing case/spacing)
    Found(String),
    /// The fallback table redirected the name to a known style
    Fallback { requested: String, resolved: String },
    /// Unknown; the catalog's default style should be used
    NotFound { requested: String, default: String },
}

impl StyleResolution {
    /// Name of the style to apply.
    pub fn style_name(&self) -> &str {
        match self {
            Self::Found(name) => name,
            Self::Fallback { resolved, .. } => resolved,
            Self::NotFound { default, .. } => default,
        }
    }
}

/// The set of paragraph styles an output document may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCatalog {
    #[serde(default)]
    pub styles: Vec<StyleDef>,

    /// Style applied when a requested one cannot be resolved
    #[serde(default = "default_style_name")]
    pub default_style: String,

    /// Requested name → replacement name, consulted before giving up
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fallbacks: BTreeMap<String, String>,
}

fn default_style_name() -> String {
    "Normal".to_string()
}

/// Built-in paragraph styles of a blank word-processing document
const BUILTIN_STYLES: &[&str] = &[
    "Normal",
    "Title",
    "Subtitle",
    "Heading 1",
    "Heading 2",
    "Heading 3",
    "Heading 4",
    "Heading 5",
    "Heading 6",
    "Quote",
    "Intense Quote",
    "List Paragraph",
    "List Bullet",
    "List Number",
    "Caption",
];

impl Default for StyleCatalog {
    fn default() -> Self {
        Self {
            styles: BUILTIN_STYLES.iter().map(|name| StyleDef::from_name(name)).collect(),
            default_style: default_style_name(),
            fallbacks: BTreeMap::new(),
        }
    }
}

/// Lowercase, whitespace-free form used for lenient comparisons.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl StyleCatalog {
    /// Create an empty catalog with the given default style.
    pub fn empty(default_style: &str) -> Self {
        Self {
            styles: Vec::new(),
            default_style: default_style.to_string(),
            fallbacks: BTreeMap::new(),
        }
    }

    /// Add a style definition (ignored if the id is already present).
    pub fn add(&mut self, style: StyleDef) {
        if !self.styles.iter().any(|s| s.id == style.id) {
            self.styles.push(style);
        }
    }

    /// Merge extra fallback entries into the table.
    pub fn with_fallbacks<I, K, V>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in fallbacks {
            self.fallbacks.insert(from.into(), to.into());
        }
        self
    }

    /// Whether a style with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.styles.iter().any(|s| s.name == name)
    }

    /// Find a style by name, or by lenient name/id match.
    pub fn lookup(&self, name: &str) -> Option<&StyleDef> {
        if let Some(style) = self.styles.iter().find(|s| s.name == name) {
            return Some(style);
        }
        let wanted = normalize(name);
        self.styles
            .iter()
            .find(|s| normalize(&s.name) == wanted || normalize(&s.id) == wanted)
    }

    /// Name registered for a markup id.
    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.styles.iter().find(|s| s.id == id).map(|s| s.name.as_str())
    }

    /// Markup id for a style name; falls back to the name without spaces.
    pub fn id_for(&self, name: &str) -> String {
        self.lookup(name)
            .map(|s| s.id.clone())
            .unwrap_or_else(|| name.split_whitespace().collect())
    }

    /// Resolve a requested style name against this catalog.
    pub fn resolve(&self, requested: &str) -> StyleResolution {
        if let Some(style) = self.lookup(requested) {
            return StyleResolution::Found(style.name.clone());
        }

        if let Some(target) = self.fallbacks.get(requested) {
            if let Some(style) = self.lookup(target) {
                return StyleResolution::Fallback {
                    requested: requested.to_string(),
                    resolved: style.name.clone(),
                };
            }
        }

        StyleResolution::NotFound {
            requested: requested.to_string(),
            default: self.default_style.clone(),
        }
    }
}
