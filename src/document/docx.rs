/*!
 * Office Open XML (.docx) document store.
 *
 * Parsing walks `word/document.xml` with a pull parser and builds the block
 * tree: paragraphs with their style and bold/italic/underline runs, tables
 * with nested cells, and opaque passthrough for anything else. Paragraph,
 * table, row and cell properties the tree does not model are captured as
 * raw markup and written back unchanged.
 *
 * Every paragraph also keeps its original element along with the names of
 * inline content the runs cannot hold (drawings, hyperlinks, bookmarks,
 * tracked changes, fields). A paragraph that still reads as parsed is
 * written back as that element, byte for byte; only changed paragraphs are
 * regenerated from their runs.
 *
 * When the document came from a package, every other part of that package
 * is copied through byte for byte; otherwise a minimal package with a
 * generated style sheet is produced.
 */

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use log::{debug, warn};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;
use crate::formatting::FormattingRun;

use super::{
    Block, Cell, Document, DocumentFormat, DocumentStore, Paragraph, ParagraphSource, Row,
    SourcePackage, StyleCatalog, StyleDef, Table,
};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Markers that carry nothing worth keeping, dropped wherever they appear
const DISPOSABLE: &[&[u8]] = &[b"proofErr", b"lastRenderedPageBreak", b"pPr", b"rPr", b"t"];

/// Inline wrappers whose runs still count as paragraph text
const TEXT_WRAPPERS: &[&[u8]] = &[
    b"hyperlink",
    b"ins",
    b"moveTo",
    b"smartTag",
    b"sdt",
    b"fldSimple",
    b"customXml",
    b"dir",
    b"bdo",
];

/// Property parts of inline wrappers
const WRAPPER_PROPERTIES: &[&[u8]] = &[b"sdtPr", b"sdtEndPr", b"customXmlPr", b"smartTagPr"];

/// Reads and writes .docx packages
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxStore;

impl DocumentStore for DocxStore {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn parse(&self, bytes: &[u8]) -> Result<Document, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
            DocumentError::Malformed(format!("package has no {}", DOCUMENT_PART))
        })?;

        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => parse_styles(&xml)?,
            None => {
                debug!("Package has no {}; using built-in styles", STYLES_PART);
                StyleCatalog::default()
            }
        };

        let mut parser = BodyParser::new(&document_xml, &styles);
        let body = parser.parse_document()?;
        debug!(
            "Parsed DOCX package: {} body blocks, {} styles",
            body.len(),
            styles.styles.len()
        );

        let package = SourcePackage {
            bytes: bytes.to_vec(),
            root_tag: parser.root_tag,
            section_xml: parser.section_xml,
        };

        Ok(Document {
            styles,
            body,
            package: Some(Arc::new(package)),
        })
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>, DocumentError> {
        let document_xml = render_document_xml(document)?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        match document.package.as_deref() {
            Some(package) => {
                let mut source = ZipArchive::new(Cursor::new(package.bytes.as_slice()))?;
                for index in 0..source.len() {
                    let mut entry = source.by_index(index)?;
                    if entry.is_dir() {
                        continue;
                    }
                    let name = entry.name().to_string();
                    zip.start_file(name.as_str(), part_options())?;
                    if name == DOCUMENT_PART {
                        zip.write_all(&document_xml)?;
                    } else {
                        std::io::copy(&mut entry, &mut zip)?;
                    }
                }
            }
            None => {
                let styles_xml = render_styles_xml(&document.styles)?;
                let parts: [(&str, &[u8]); 5] = [
                    ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
                    ("_rels/.rels", PACKAGE_RELS_XML.as_bytes()),
                    ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
                    (DOCUMENT_PART, &document_xml),
                    (STYLES_PART, &styles_xml),
                ];
                for (name, content) in parts {
                    zip.start_file(name, part_options())?;
                    zip.write_all(content)?;
                }
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, DocumentError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Value of an attribute, matched on its local name.
fn attr(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Whether a toggle property such as `<w:b/>` is switched on.
fn is_on(element: &BytesStart) -> bool {
    !matches!(
        attr(element, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

fn unexpected_eof(context: &str) -> DocumentError {
    DocumentError::Malformed(format!("unexpected end of document inside {}", context))
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

/// Map lowercase built-in style names ("heading 1") to their UI form.
fn ui_style_name(raw: &str) -> String {
    const LOWERCASE_BUILTINS: &[&str] = &[
        "normal",
        "title",
        "subtitle",
        "quote",
        "intense quote",
        "caption",
        "list paragraph",
        "list bullet",
        "list number",
        "no spacing",
    ];

    let is_heading = raw
        .strip_prefix("heading ")
        .is_some_and(|level| level.parse::<u8>().is_ok());
    if !is_heading && !LOWERCASE_BUILTINS.contains(&raw) {
        return raw.to_string();
    }

    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Build a catalog from the paragraph styles of `word/styles.xml`.
fn parse_styles(xml: &str) -> Result<StyleCatalog, DocumentError> {
    let mut catalog = StyleCatalog::empty("Normal");
    let mut reader = Reader::from_str(xml);
    // (style id, marked as default) of the paragraph style being read
    let mut current: Option<(String, bool)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"style" => {
                current = match (attr(&e, b"type").as_deref(), attr(&e, b"styleId")) {
                    (Some("paragraph"), Some(id)) => {
                        Some((id, attr(&e, b"default").as_deref() == Some("1")))
                    }
                    _ => None,
                };
            }
            Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                if let Some((id, is_default)) = &current {
                    let name = ui_style_name(&attr(&e, b"val").unwrap_or_else(|| id.clone()));
                    if *is_default {
                        catalog.default_style = name.clone();
                    }
                    catalog.add(StyleDef { id: id.clone(), name });
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"style" => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    if catalog.styles.is_empty() {
        debug!("Style sheet defines no paragraph styles; using built-in styles");
        return Ok(StyleCatalog::default());
    }
    Ok(catalog)
}

fn render_styles_xml(catalog: &StyleCatalog) -> Result<Vec<u8>, DocumentError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:styles").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;

    for style in &catalog.styles {
        let mut start = BytesStart::new("w:style");
        start.push_attribute(("w:type", "paragraph"));
        if style.name == catalog.default_style {
            start.push_attribute(("w:default", "1"));
        }
        start.push_attribute(("w:styleId", style.id.as_str()));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Empty(
            BytesStart::new("w:name").with_attributes([("w:val", style.name.as_str())]),
        ))?;
        writer.write_event(Event::End(BytesEnd::new("w:style")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:styles")))?;
    Ok(writer.into_inner())
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

/// Recursive-descent reader over `word/document.xml`.
struct BodyParser<'a> {
    xml: &'a str,
    reader: Reader<&'a [u8]>,
    styles: &'a StyleCatalog,
    root_tag: Option<String>,
    section_xml: Option<String>,
}

impl<'a> BodyParser<'a> {
    fn new(xml: &'a str, styles: &'a StyleCatalog) -> Self {
        Self {
            xml,
            reader: Reader::from_str(xml),
            styles,
            root_tag: None,
            section_xml: None,
        }
    }

    fn raw(&self, start: usize) -> String {
        self.xml[start..self.reader.buffer_position()].to_string()
    }

    fn parse_document(&mut self) -> Result<Vec<Block>, DocumentError> {
        let mut body = Vec::new();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"document" => self.root_tag = Some(self.raw(before)),
                    b"body" => body = self.parse_body()?,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if self.root_tag.is_none() {
            return Err(DocumentError::Malformed(format!(
                "{} has no document element",
                DOCUMENT_PART
            )));
        }
        Ok(body)
    }

    fn parse_body(&mut self) -> Result<Vec<Block>, DocumentError> {
        let mut blocks = Vec::new();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(self.parse_paragraph(before)?)),
                    b"tbl" => blocks.push(Block::Table(self.parse_table()?)),
                    b"sectPr" => {
                        self.skip()?;
                        self.section_xml = Some(self.raw(before));
                    }
                    other => {
                        let kind = String::from_utf8_lossy(other).into_owned();
                        self.skip()?;
                        blocks.push(Block::Unsupported {
                            kind,
                            raw: Some(self.raw(before)),
                        });
                    }
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(self.empty_paragraph(before))),
                    b"sectPr" => self.section_xml = Some(self.raw(before)),
                    name if DISPOSABLE.contains(&name) => {}
                    other => blocks.push(Block::Unsupported {
                        kind: String::from_utf8_lossy(other).into_owned(),
                        raw: Some(self.raw(before)),
                    }),
                },
                Event::End(e) if e.local_name().as_ref() == b"body" => break,
                Event::Eof => return Err(unexpected_eof("body")),
                _ => {}
            }
        }

        Ok(blocks)
    }

    /// Parse a `w:p` whose opening tag started at byte `start`.
    fn parse_paragraph(&mut self, start: usize) -> Result<Paragraph, DocumentError> {
        let mut paragraph = Paragraph::default();
        let mut unmodeled = Vec::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"pPr" => self.parse_paragraph_properties(&mut paragraph)?,
                    b"r" => {
                        if let Some(run) = self.parse_run(&mut unmodeled)? {
                            paragraph.runs.push(run);
                        }
                    }
                    b"sdtContent" => {}
                    name if TEXT_WRAPPERS.contains(&name) => unmodeled.push(local_name(name)),
                    name if WRAPPER_PROPERTIES.contains(&name) => self.skip()?,
                    // del, moveFrom, oMath, ...: nothing the runs can hold
                    name => {
                        unmodeled.push(local_name(name));
                        self.skip()?;
                    }
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"r" => {}
                    name if DISPOSABLE.contains(&name) => {}
                    name => unmodeled.push(local_name(name)),
                },
                Event::End(e) if e.local_name().as_ref() == b"p" => break,
                Event::Eof => return Err(unexpected_eof("paragraph")),
                _ => {}
            }
        }

        self.attach_source(&mut paragraph, start, unmodeled);
        Ok(paragraph)
    }

    fn empty_paragraph(&self, start: usize) -> Paragraph {
        let mut paragraph = Paragraph::default();
        self.attach_source(&mut paragraph, start, Vec::new());
        paragraph
    }

    fn attach_source(&self, paragraph: &mut Paragraph, start: usize, unmodeled: Vec<String>) {
        if !unmodeled.is_empty() {
            debug!("Paragraph holds unmodeled inline content: {:?}", unmodeled);
        }
        paragraph.source = Some(Arc::new(ParagraphSource {
            xml: self.raw(start),
            style: paragraph.style.clone(),
            properties_xml: paragraph.properties_xml.clone(),
            runs: paragraph.runs.clone(),
            unmodeled,
        }));
    }

    fn parse_paragraph_properties(&mut self, paragraph: &mut Paragraph) -> Result<(), DocumentError> {
        let mut passthrough = String::new();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Empty(e) if e.local_name().as_ref() == b"pStyle" => {
                    if let Some(id) = attr(&e, b"val") {
                        let name = self.styles.name_for_id(&id).map(str::to_string);
                        paragraph.style = Some(name.unwrap_or(id));
                    }
                }
                Event::Empty(_) => passthrough.push_str(&self.raw(before)),
                Event::Start(_) => {
                    self.skip()?;
                    passthrough.push_str(&self.raw(before));
                }
                Event::End(e) if e.local_name().as_ref() == b"pPr" => break,
                Event::Eof => return Err(unexpected_eof("paragraph properties")),
                _ => {}
            }
        }

        if !passthrough.is_empty() {
            paragraph.properties_xml = Some(passthrough);
        }
        Ok(())
    }

    fn parse_run(
        &mut self,
        unmodeled: &mut Vec<String>,
    ) -> Result<Option<FormattingRun>, DocumentError> {
        let mut run = FormattingRun::default();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"rPr" => self.parse_run_properties(&mut run)?,
                    b"t" => self.read_text(&mut run.text)?,
                    // drawing, pict, object, instrText, AlternateContent, ...
                    name => {
                        unmodeled.push(local_name(name));
                        self.skip()?;
                    }
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"tab" | b"ptab" => run.text.push('\t'),
                    b"br" | b"cr" => match attr(&e, b"type").as_deref() {
                        None | Some("textWrapping") => run.text.push('\n'),
                        Some(_) => unmodeled.push("br".to_string()),
                    },
                    b"noBreakHyphen" => run.text.push('-'),
                    name if DISPOSABLE.contains(&name) => {}
                    // fldChar, footnoteReference, commentReference, sym, ...
                    name => unmodeled.push(local_name(name)),
                },
                Event::End(e) if e.local_name().as_ref() == b"r" => break,
                Event::Eof => return Err(unexpected_eof("run")),
                _ => {}
            }
        }

        Ok((!run.text.is_empty()).then_some(run))
    }

    fn parse_run_properties(&mut self, run: &mut FormattingRun) -> Result<(), DocumentError> {
        loop {
            match self.reader.read_event()? {
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"b" => run.bold = is_on(&e),
                    b"i" => run.italic = is_on(&e),
                    b"u" => run.underline = is_on(&e),
                    _ => {}
                },
                Event::Start(e) => match e.local_name().as_ref() {
                    b"b" => run.bold = is_on(&e),
                    b"i" => run.italic = is_on(&e),
                    b"u" => run.underline = is_on(&e),
                    // rPrChange holds a nested rPr of the previous revision
                    _ => self.skip()?,
                },
                Event::End(e) if e.local_name().as_ref() == b"rPr" => break,
                Event::Eof => return Err(unexpected_eof("run properties")),
                _ => {}
            }
        }
        Ok(())
    }

    fn read_text(&mut self, out: &mut String) -> Result<(), DocumentError> {
        loop {
            match self.reader.read_event()? {
                Event::Text(text) => out.push_str(&text.unescape()?),
                Event::CData(data) => out.push_str(&String::from_utf8_lossy(&data)),
                Event::End(e) if e.local_name().as_ref() == b"t" => break,
                Event::Eof => return Err(unexpected_eof("text")),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_table(&mut self) -> Result<Table, DocumentError> {
        let mut table = Table::default();
        let mut passthrough = String::new();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"tr" => table.rows.push(self.parse_row()?),
                    b"tblPr" | b"tblGrid" => {
                        self.skip()?;
                        passthrough.push_str(&self.raw(before));
                    }
                    _ => self.skip()?,
                },
                Event::End(e) if e.local_name().as_ref() == b"tbl" => break,
                Event::Eof => return Err(unexpected_eof("table")),
                _ => {}
            }
        }

        if !passthrough.is_empty() {
            table.properties_xml = Some(passthrough);
        }
        Ok(table)
    }

    fn parse_row(&mut self) -> Result<Row, DocumentError> {
        let mut row = Row::default();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"tc" => row.cells.push(self.parse_cell()?),
                    b"trPr" | b"tblPrEx" => {
                        self.skip()?;
                        row.properties_xml
                            .get_or_insert_with(String::new)
                            .push_str(&self.raw(before));
                    }
                    _ => self.skip()?,
                },
                Event::End(e) if e.local_name().as_ref() == b"tr" => break,
                Event::Eof => return Err(unexpected_eof("table row")),
                _ => {}
            }
        }

        Ok(row)
    }

    fn parse_cell(&mut self) -> Result<Cell, DocumentError> {
        let mut cell = Cell::default();

        loop {
            let before = self.reader.buffer_position();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" => cell.blocks.push(Block::Paragraph(self.parse_paragraph(before)?)),
                    b"tbl" => cell.blocks.push(Block::Table(self.parse_table()?)),
                    b"tcPr" => {
                        self.skip()?;
                        cell.properties_xml = Some(self.raw(before));
                    }
                    _ => self.skip()?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"p" => {
                    cell.blocks.push(Block::Paragraph(self.empty_paragraph(before)));
                }
                Event::End(e) if e.local_name().as_ref() == b"tc" => break,
                Event::Eof => return Err(unexpected_eof("table cell")),
                _ => {}
            }
        }

        Ok(cell)
    }

    /// Consume events up to and including the end of the element just opened.
    fn skip(&mut self) -> Result<(), DocumentError> {
        let mut depth = 1usize;
        loop {
            match self.reader.read_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => return Err(unexpected_eof("element")),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Body rendering
// ---------------------------------------------------------------------------

type XmlWriter = Writer<Vec<u8>>;

fn write_raw(writer: &mut XmlWriter, raw: &str) {
    writer.get_mut().extend_from_slice(raw.as_bytes());
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Qualified element name of a captured opening tag, e.g. `w:document`.
fn tag_name(open_tag: &str) -> &str {
    open_tag
        .trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("w:document")
}

fn render_document_xml(document: &Document) -> Result<Vec<u8>, DocumentError> {
    let mut writer = Writer::new(Vec::new());
    let package = document.package.as_deref();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let root_name = match package.and_then(|p| p.root_tag.as_deref()) {
        Some(root_tag) => {
            write_raw(&mut writer, root_tag);
            tag_name(root_tag).to_string()
        }
        None => {
            writer.write_event(Event::Start(
                BytesStart::new("w:document")
                    .with_attributes([("xmlns:w", WORDML_NS), ("xmlns:r", RELATIONSHIPS_NS)]),
            ))?;
            "w:document".to_string()
        }
    };

    let context = RenderContext {
        styles: &document.styles,
        // Source markup may reference parts that only the source package has
        verbatim: package.is_some(),
    };
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;
    for block in &document.body {
        write_block(&mut writer, block, &context)?;
    }
    if let Some(section) = package.and_then(|p| p.section_xml.as_deref()) {
        write_raw(&mut writer, section);
    }
    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new(root_name.as_str())))?;

    Ok(writer.into_inner())
}

/// What body rendering needs besides the block being written
struct RenderContext<'a> {
    styles: &'a StyleCatalog,
    /// Whether unchanged paragraphs may be written as their source markup
    verbatim: bool,
}

fn write_block(
    writer: &mut XmlWriter,
    block: &Block,
    context: &RenderContext<'_>,
) -> Result<(), DocumentError> {
    match block {
        Block::Paragraph(paragraph) => write_paragraph(writer, paragraph, context),
        Block::Table(table) => write_table(writer, table, context),
        Block::Unsupported { raw: Some(raw), .. } => {
            write_raw(writer, raw);
            Ok(())
        }
        Block::Unsupported { kind, raw: None } => {
            warn!("Dropping unsupported '{}' block with no source markup", kind);
            Ok(())
        }
    }
}

fn write_paragraph(
    writer: &mut XmlWriter,
    paragraph: &Paragraph,
    context: &RenderContext<'_>,
) -> Result<(), DocumentError> {
    if context.verbatim {
        if let Some(source) = paragraph.unchanged_source() {
            write_raw(writer, &source.xml);
            return Ok(());
        }
    }

    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    if paragraph.style.is_some() || paragraph.properties_xml.is_some() {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        if let Some(style) = &paragraph.style {
            let id = context.styles.id_for(style);
            writer.write_event(Event::Empty(
                BytesStart::new("w:pStyle").with_attributes([("w:val", id.as_str())]),
            ))?;
        }
        if let Some(raw) = &paragraph.properties_xml {
            write_raw(writer, raw);
        }
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    for run in paragraph.runs.iter().filter(|r| !r.text.is_empty()) {
        write_run(writer, run)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_run(writer: &mut XmlWriter, run: &FormattingRun) -> Result<(), DocumentError> {
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;

    if run.is_formatted() {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        if run.bold {
            writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
        }
        if run.italic {
            writer.write_event(Event::Empty(BytesStart::new("w:i")))?;
        }
        if run.underline {
            writer.write_event(Event::Empty(
                BytesStart::new("w:u").with_attributes([("w:val", "single")]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    let mut pending = String::new();
    for ch in run.text.chars() {
        match ch {
            '\t' | '\n' => {
                write_text(writer, &mut pending)?;
                let name = if ch == '\t' { "w:tab" } else { "w:br" };
                writer.write_event(Event::Empty(BytesStart::new(name)))?;
            }
            _ => pending.push(ch),
        }
    }
    write_text(writer, &mut pending)?;

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn write_text(writer: &mut XmlWriter, pending: &mut String) -> Result<(), DocumentError> {
    if pending.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(
        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(pending)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    pending.clear();
    Ok(())
}

fn write_table(
    writer: &mut XmlWriter,
    table: &Table,
    context: &RenderContext<'_>,
) -> Result<(), DocumentError> {
    writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;

    match &table.properties_xml {
        Some(raw) => write_raw(writer, raw),
        None => {
            writer.write_event(Event::Start(BytesStart::new("w:tblPr")))?;
            writer.write_event(Event::Empty(
                BytesStart::new("w:tblW").with_attributes([("w:w", "0"), ("w:type", "auto")]),
            ))?;
            writer.write_event(Event::End(BytesEnd::new("w:tblPr")))?;

            let columns = table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
            writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
            for _ in 0..columns {
                writer.write_event(Event::Empty(BytesStart::new("w:gridCol")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
        }
    }

    for row in &table.rows {
        writer.write_event(Event::Start(BytesStart::new("w:tr")))?;
        if let Some(raw) = &row.properties_xml {
            write_raw(writer, raw);
        }
        for cell in &row.cells {
            writer.write_event(Event::Start(BytesStart::new("w:tc")))?;
            if let Some(raw) = &cell.properties_xml {
                write_raw(writer, raw);
            }
            for block in &cell.blocks {
                write_block(writer, block, context)?;
            }
            // A cell must end with a paragraph
            if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
                writer.write_event(Event::Empty(BytesStart::new("w:p")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
    Ok(())
}
