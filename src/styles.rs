/*!
 * Paragraph style classification.
 *
 * Maps a raw paragraph style name, as found in a document, to a short
 * display label and a coarse category used to render segment lists.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a display label for an unrecognized style
const MAX_DISPLAY_CHARS: usize = 12;

/// "heading1", "heading 2", "Heading_3" after normalization
static HEADING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^heading(\d+)$").unwrap());

/// Normalized names treated as the body text style
const NORMAL_NAMES: &[&str] = &[
    "normal",
    "bodytext",
    "body",
    "textbody",
    "default",
    "defaultparagraphstyle",
    "standard",
    "plaintext",
    "nospacing",
];

/// Display category of a paragraph style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleCategory {
    Title,
    Subtitle,
    Heading1,
    Heading2,
    Heading3,
    Quote,
    List,
    Normal,
    Other,
}

impl StyleCategory {
    /// Lowercase identifier of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::Quote => "quote",
            Self::List => "list",
            Self::Normal => "normal",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one style name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleInfo {
    /// Short label, e.g. "H1" or "Title"
    pub display_name: String,
    pub category: StyleCategory,
}

impl StyleInfo {
    fn new(display_name: impl Into<String>, category: StyleCategory) -> Self {
        Self {
            display_name: display_name.into(),
            category,
        }
    }
}

/// Lowercase and drop spaces, underscores and hyphens.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Shorten a label to at most `MAX_DISPLAY_CHARS` characters.
fn abbreviate(name: &str) -> String {
    let name = name.trim();
    if name.chars().count() <= MAX_DISPLAY_CHARS {
        return name.to_string();
    }
    let mut short: String = name.chars().take(MAX_DISPLAY_CHARS - 1).collect();
    short.push('…');
    short
}

/// Classify a raw paragraph style name.
///
/// Missing or empty names count as body text.
pub fn classify(raw_name: Option<&str>) -> StyleInfo {
    let raw = raw_name.unwrap_or_default().trim();
    let key = normalize(raw);

    if key.is_empty() || NORMAL_NAMES.contains(&key.as_str()) {
        return StyleInfo::new("Normal", StyleCategory::Normal);
    }

    if let Some(caps) = HEADING_REGEX.captures(&key) {
        let level = &caps[1];
        let category = match level {
            "1" => StyleCategory::Heading1,
            "2" => StyleCategory::Heading2,
            "3" => StyleCategory::Heading3,
            _ => StyleCategory::Other,
        };
        return StyleInfo::new(format!("H{}", level), category);
    }

    match key.as_str() {
        "title" => StyleInfo::new("Title", StyleCategory::Title),
        "subtitle" => StyleInfo::new("Subtitle", StyleCategory::Subtitle),
        k if k.contains("quote") => StyleInfo::new("Quote", StyleCategory::Quote),
        k if k.starts_with("list") => StyleInfo::new("List", StyleCategory::List),
        _ => StyleInfo::new(abbreviate(raw), StyleCategory::Other),
    }
}
