/*!
 * Sentence segmentation of content nodes.
 *
 * A paragraph node is split into sentences over its encoded (tagged) text.
 * Sentence boundaries are detected on the plain characters only, and every
 * cut is placed where no tag is open, so a tag pair is never split across
 * two segments. Table cells are never split.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::app_config::SegmentationConfig;
use crate::formatting::tags::{Token, tokenize};
use crate::styles::{StyleInfo, classify};
use crate::walker::{ContentNode, NodeKind, TableCoord};

/// Abbreviations (without the trailing period) after which a period never ends a sentence
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "st", "jr", "sr", "etc", "inc", "ltd", "co", "fig", "vs",
    "e.g", "i.e", "no", "vol", "approx",
];

const SENTENCE_END: &[char] = &['.', '!', '?'];
const CLOSING_PUNCT: &[char] = &['"', '\'', '”', '’', ')', ']', '»'];
const OPENING_PUNCT: &[char] = &['"', '\'', '“', '‘', '(', '[', '«'];

/// Translation status of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Untranslated,
    Draft,
    Translated,
    Approved,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untranslated => "untranslated",
            Self::Draft => "draft",
            Self::Translated => "translated",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "untranslated" => Ok(Self::Untranslated),
            "draft" => Ok(Self::Draft),
            "translated" => Ok(Self::Translated),
            "approved" => Ok(Self::Approved),
            _ => Err(anyhow::anyhow!("Invalid segment status: {}", s)),
        }
    }
}

/// One independently editable unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based id, unique within a project
    pub id: usize,

    /// Encoded source text
    pub source_text: String,

    /// Encoded edited text (empty until edited)
    #[serde(default)]
    pub target_text: String,

    #[serde(default)]
    pub status: SegmentStatus,

    /// Position of the content node this segment belongs to
    #[serde(default)]
    pub owning_node_position: usize,

    /// Paragraph style name of the owning node (empty when unstyled)
    #[serde(default)]
    pub style: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_coord: Option<TableCoord>,
}

impl Segment {
    /// Text used for export: the target when it has content, else the source.
    pub fn effective_text(&self) -> &str {
        if self.target_text.trim().is_empty() {
            &self.source_text
        } else {
            &self.target_text
        }
    }

    /// Display classification of the segment's style
    pub fn style_info(&self) -> StyleInfo {
        classify(Some(self.style.as_str()))
    }

    pub fn is_table_cell(&self) -> bool {
        self.table_coord.is_some()
    }
}

/// Splits content nodes into segments
#[derive(Debug, Clone)]
pub struct Segmenter {
    split_sentences: bool,
    abbreviations: BTreeSet<String>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        let abbreviations = ABBREVIATIONS
            .iter()
            .map(|a| a.to_string())
            .chain(
                config
                    .extra_abbreviations
                    .iter()
                    .map(|a| a.trim().trim_end_matches('.').to_lowercase())
                    .filter(|a| !a.is_empty()),
            )
            .collect();

        Self {
            split_sentences: config.split_sentences,
            abbreviations,
        }
    }

    /// Segment one node, numbering segments from `first_id`.
    pub fn segment(&self, node: &ContentNode, first_id: usize) -> Vec<Segment> {
        let encoded = node.encoded();

        let pieces: Vec<String> = match node.kind {
            NodeKind::TableCell => vec![encoded],
            NodeKind::Paragraph if self.split_sentences => self.split(&encoded),
            NodeKind::Paragraph => vec![encoded.trim().to_string()],
        };

        pieces
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .enumerate()
            .map(|(offset, source_text)| Segment {
                id: first_id + offset,
                source_text,
                target_text: String::new(),
                status: SegmentStatus::Untranslated,
                owning_node_position: node.position,
                style: node.style.clone().unwrap_or_default(),
                table_coord: node.table_coord,
            })
            .collect()
    }

    /// Segment every node in order with ids starting at 1.
    pub fn segment_all(&self, nodes: &[ContentNode]) -> Vec<Segment> {
        let mut segments = Vec::new();
        for node in nodes {
            let next_id = segments.len() + 1;
            segments.extend(self.segment(node, next_id));
        }
        debug!("Segmented {} nodes into {} segments", nodes.len(), segments.len());
        segments
    }

    /// Split encoded text into trimmed sentence pieces.
    pub fn split(&self, encoded: &str) -> Vec<String> {
        let tokens = tokenize(encoded);
        if tokens.is_empty() {
            return Vec::new();
        }

        // Tag nesting depth in front of each token
        let mut depth_before = Vec::with_capacity(tokens.len());
        let mut depth = 0usize;
        for token in &tokens {
            depth_before.push(depth);
            match token {
                Token::Open { .. } => depth += 1,
                Token::Close { .. } => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        // Plain characters with the index of the token they came from
        let chars: Vec<(usize, char)> = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, t)| match t {
                Token::Char { ch, .. } => Some((i, *ch)),
                _ => None,
            })
            .collect();

        let mut cuts = BTreeSet::new();
        for (last_of_sentence, next_start) in self.boundaries(&chars) {
            let gap_start = chars[last_of_sentence].0 + 1;
            let gap_end = chars[next_start].0;
            if let Some(cut) = choose_cut(&tokens, &depth_before, gap_start, gap_end) {
                cuts.insert(cut);
            }
        }

        let mut pieces = Vec::new();
        let mut start = 0usize;
        for cut in cuts.into_iter().chain(std::iter::once(tokens.len())) {
            if cut <= start {
                continue;
            }
            let text = encoded[tokens[start].start()..tokens[cut - 1].end()].trim();
            if !text.is_empty() {
                pieces.push(text.to_string());
            }
            start = cut;
        }
        pieces
    }

    /// Sentence boundaries as (index of the last char of a sentence, index of
    /// the first char of the next one) over the plain characters.
    fn boundaries(&self, chars: &[(usize, char)]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let n = chars.len();
        let mut k = 0usize;

        while k < n {
            let ch = chars[k].1;
            if !SENTENCE_END.contains(&ch) && ch != '…' {
                k += 1;
                continue;
            }

            let run_start = k;
            let mut end = k;
            while end < n && (SENTENCE_END.contains(&chars[end].1) || chars[end].1 == '…') {
                end += 1;
            }
            let punct: String = chars[run_start..end].iter().map(|(_, c)| *c).collect();
            k = end;

            while end < n && CLOSING_PUNCT.contains(&chars[end].1) {
                end += 1;
            }
            let last_of_sentence = end - 1;

            let mut next = end;
            while next < n && chars[next].1.is_whitespace() {
                next += 1;
            }
            if next == end || next == n {
                continue;
            }
            while next < n && OPENING_PUNCT.contains(&chars[next].1) {
                next += 1;
            }
            if next == n || !chars[next].1.is_uppercase() {
                continue;
            }

            if punct.contains("...") || punct.contains('…') {
                continue;
            }
            if punct == "." && self.is_abbreviation(chars, run_start) {
                continue;
            }

            found.push((last_of_sentence, next));
        }

        found
    }

    /// Whether the word ending right before `period` is an abbreviation or an initial.
    fn is_abbreviation(&self, chars: &[(usize, char)], period: usize) -> bool {
        let mut start = period;
        while start > 0 && (chars[start - 1].1.is_alphabetic() || chars[start - 1].1 == '.') {
            start -= 1;
        }
        let word: String = chars[start..period]
            .iter()
            .flat_map(|(_, c)| c.to_lowercase())
            .collect();
        let word = word.trim_start_matches('.');

        if word.is_empty() {
            // Decimal such as "3." followed by more digits never reaches here
            return false;
        }
        if self.abbreviations.contains(word) {
            return true;
        }
        // Single letters and chains of initials such as "U.S"
        word.split('.').all(|part| part.chars().count() == 1)
    }
}

/// Pick a cut (split before token index) inside the gap `[gap_start, gap_end]`.
///
/// Prefers a position with no open tag; otherwise snaps to the nearer edge of
/// the outermost tag pair enclosing the gap.
fn choose_cut(
    tokens: &[Token<'_>],
    depth_before: &[usize],
    gap_start: usize,
    gap_end: usize,
) -> Option<usize> {
    if let Some(cut) = (gap_start..=gap_end).find(|&t| depth_before[t] == 0 && t > 0) {
        return Some(cut);
    }

    let open = (0..gap_start)
        .rev()
        .find(|&t| depth_before[t] == 0 && matches!(tokens[t], Token::Open { .. }))?;
    let close = (gap_end..tokens.len())
        .find(|&t| depth_before[t] == 1 && matches!(tokens[t], Token::Close { .. }))?;
    let after_close = close + 1;

    let candidate = if gap_start - open <= after_close - gap_end {
        open
    } else {
        after_close
    };

    // A snap to either end of the text would leave an empty piece
    if candidate == 0 || candidate >= tokens.len() {
        let other = if candidate == open { after_close } else { open };
        if other == 0 || other >= tokens.len() {
            return None;
        }
        return Some(other);
    }
    Some(candidate)
}

/// Segment one node with the default configuration.
pub fn segment(node: &ContentNode, first_id: usize) -> Vec<Segment> {
    Segmenter::default().segment(node, first_id)
}
