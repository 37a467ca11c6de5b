/*!
 * Inline formatting tag codec.
 *
 * Character-run formatting travels inside segment text as a small marker
 * language so that translators can move emphasis around freely:
 * - `<b>…</b>` bold
 * - `<i>…</i>` italic
 * - `<bi>…</bi>` bold and italic
 * - `<u>…</u>` underline
 *
 * # Architecture
 *
 * - `tags`: encode runs into tagged text, decode tagged text back into runs
 * - `validation`: cheap balance checks suitable for per-keystroke use
 */

use serde::{Deserialize, Serialize};

pub mod tags;
pub mod validation;

// Re-export main types
pub use tags::{decode, encode, has_tags, merge_adjacent, strip};
pub use validation::{TagValidation, check, validate};

/// A maximal span of text sharing one attribute set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingRun {
    /// Run text, verbatim
    pub text: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
}

impl FormattingRun {
    /// Create an unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a run with the given attributes.
    pub fn new(text: impl Into<String>, bold: bool, italic: bool, underline: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
            underline,
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, true, false, false)
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text, false, true, false)
    }

    /// Create an underlined run.
    pub fn underline(text: impl Into<String>) -> Self {
        Self::new(text, false, false, true)
    }

    /// Attribute set of this run.
    pub fn attributes(&self) -> RunAttributes {
        RunAttributes {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    /// Copy of this run's attributes applied to other text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        self.attributes().run(text)
    }

    /// Whether any attribute is set.
    pub fn is_formatted(&self) -> bool {
        self.attributes().is_formatted()
    }
}

/// The bold/italic/underline combination of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunAttributes {
    /// Whether any attribute is set.
    pub fn is_formatted(&self) -> bool {
        self.bold || self.italic || self.underline
    }

    /// Build a run carrying these attributes.
    pub fn run(&self, text: impl Into<String>) -> FormattingRun {
        FormattingRun::new(text, self.bold, self.italic, self.underline)
    }

    /// Union with the attributes implied by a tag.
    pub fn with_tag(mut self, tag: TagKind) -> Self {
        match tag {
            TagKind::Bold => self.bold = true,
            TagKind::Italic => self.italic = true,
            TagKind::BoldItalic => {
                self.bold = true;
                self.italic = true;
            }
            TagKind::Underline => self.underline = true,
        }
        self
    }

    /// The single tag that expresses this attribute set, if there is one.
    ///
    /// Underline combined with anything else has no tag and is emitted as
    /// plain text.
    pub fn tag(&self) -> Option<TagKind> {
        match (self.bold, self.italic, self.underline) {
            (true, false, false) => Some(TagKind::Bold),
            (false, true, false) => Some(TagKind::Italic),
            (true, true, false) => Some(TagKind::BoldItalic),
            (false, false, true) => Some(TagKind::Underline),
            _ => None,
        }
    }
}

/// Supported tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `<b>`
    Bold,
    /// `<i>`
    Italic,
    /// `<bi>`
    BoldItalic,
    /// `<u>`
    Underline,
}

impl TagKind {
    /// Name used inside the angle brackets.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::BoldItalic => "bi",
            Self::Underline => "u",
        }
    }

    /// Look up a tag by name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" => Some(Self::Bold),
            "i" => Some(Self::Italic),
            "bi" => Some(Self::BoldItalic),
            "u" => Some(Self::Underline),
            _ => None,
        }
    }

    /// Opening marker, e.g. `<b>`.
    pub fn open(&self) -> String {
        format!("<{}>", self.name())
    }

    /// Closing marker, e.g. `</b>`.
    pub fn close(&self) -> String {
        format!("</{}>", self.name())
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
