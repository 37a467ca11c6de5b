/*!
 * Error types for the docweave library.
 *
 * This module contains custom error types for the different stages of the
 * extract → edit → reconstruct round trip, using the thiserror crate for
 * ergonomic error definitions. Recoverable problems (skipped elements,
 * missing styles, stale segments) are not errors; they are collected in a
 * `report::Report` instead.
 */

use thiserror::Error;

/// Errors produced while decoding inline formatting tags
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// One or more tags were still open when the text ended
    #[error("Unclosed tag(s): {}", format_tags(.tags))]
    UnclosedTags {
        /// Names of the still-open tags, outermost first
        tags: Vec<String>,
        /// Byte offset of the innermost opening tag
        offset: usize,
    },

    /// A closing tag did not match the innermost open tag
    #[error("Mismatched closing tag at byte {offset}: expected </{expected}>, found </{found}>")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    /// A closing tag appeared with no open tag at all
    #[error("Unmatched closing tag </{tag}> at byte {offset}")]
    UnmatchedClose { tag: String, offset: usize },

    /// A tag-like token used a name outside the supported set
    #[error("Unknown tag <{name}> at byte {offset}")]
    UnknownTag { name: String, offset: usize },
}

impl CodecError {
    /// Byte offset into the text where the problem was detected
    pub fn offset(&self) -> usize {
        match self {
            Self::UnclosedTags { offset, .. }
            | Self::MismatchedClose { offset, .. }
            | Self::UnmatchedClose { offset, .. }
            | Self::UnknownTag { offset, .. } => *offset,
        }
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("<{}>", t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while reading or writing documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Underlying file operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// The file extension does not map to a supported format
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// DOCX package (zip container) error
    #[error("Package error: {0}")]
    Package(#[from] zip::result::ZipError),

    /// XML parse or write error inside a DOCX part
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// A single segment whose text failed tag validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTagError {
    /// Id of the offending segment
    pub segment_id: usize,
    /// What was wrong with its markup
    pub error: CodecError,
}

/// Errors that abort a reconstruction before any output is produced
#[derive(Error, Debug)]
pub enum ReconstructionError {
    /// Pre-flight tag validation failed for at least one segment
    #[error("Tag syntax errors in {}", format_offenders(.offenders))]
    TagSyntax { offenders: Vec<SegmentTagError> },
}

impl ReconstructionError {
    /// Ids of every segment that blocked the reconstruction
    pub fn segment_ids(&self) -> Vec<usize> {
        match self {
            Self::TagSyntax { offenders } => offenders.iter().map(|o| o.segment_id).collect(),
        }
    }
}

fn format_offenders(offenders: &[SegmentTagError]) -> String {
    let details = offenders
        .iter()
        .map(|o| format!("#{} ({})", o.segment_id, o.error))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} segment(s): {}", offenders.len(), details)
}

/// Errors that can occur when loading or saving a project
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Underlying file operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The project file is not valid JSON for a project
    #[error("Failed to parse project: {0}")]
    Parse(#[from] serde_json::Error),

    /// The project was written by a newer, incompatible version
    #[error("Unsupported project format version {found} (max supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// An edit referenced a segment that does not exist
    #[error("Unknown segment id {0}")]
    UnknownSegment(usize),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a document store
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from reconstruction
    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructionError),

    /// Error from project persistence
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// The job was cancelled before it produced a result
    #[error("Operation cancelled")]
    Cancelled,

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
