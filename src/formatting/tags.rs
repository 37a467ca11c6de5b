/*!
 * Encoding and decoding of inline formatting tags.
 *
 * Run text is escaped so that literal text which happens to look like a tag
 * survives the round trip: a `<` that would start a tag-like token becomes
 * `&lt;`, and a `&` that would start `&lt;` or `&amp;` becomes `&amp;`.
 * Everything else is left untouched so translators see natural text.
 */

use log::debug;

use crate::errors::CodecError;

use super::{FormattingRun, RunAttributes, TagKind};

/// A lexical unit of tagged segment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Opening marker of a supported tag
    Open { tag: TagKind, start: usize, end: usize },
    /// Closing marker of a supported tag
    Close { tag: TagKind, start: usize, end: usize },
    /// Tag-like token whose name is not supported
    Unknown { name: &'a str, closing: bool, start: usize, end: usize },
    /// One character of content (entities already resolved)
    Char { ch: char, start: usize, end: usize },
}

impl Token<'_> {
    /// Byte offset of the token in the source text.
    pub(crate) fn start(&self) -> usize {
        match self {
            Token::Open { start, .. }
            | Token::Close { start, .. }
            | Token::Unknown { start, .. }
            | Token::Char { start, .. } => *start,
        }
    }

    /// Byte offset just past the token.
    pub(crate) fn end(&self) -> usize {
        match self {
            Token::Open { end, .. }
            | Token::Close { end, .. }
            | Token::Unknown { end, .. }
            | Token::Char { end, .. } => *end,
        }
    }
}

/// A `<name>` or `</name>` token found at a given offset.
struct TagLike<'a> {
    closing: bool,
    name: &'a str,
    end: usize,
}

/// Check whether a tag-like token starts at byte `i` (which must hold `<`).
fn tag_like_at(text: &str, i: usize) -> Option<TagLike<'_>> {
    let bytes = text.as_bytes();
    let mut j = i + 1;
    let closing = bytes.get(j) == Some(&b'/');
    if closing {
        j += 1;
    }

    let name_start = j;
    if !bytes.get(j).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    while bytes.get(j).is_some_and(|b| b.is_ascii_alphanumeric()) {
        j += 1;
    }

    if bytes.get(j) != Some(&b'>') {
        return None;
    }

    Some(TagLike {
        closing,
        name: &text[name_start..j],
        end: j + 1,
    })
}

/// Split tagged text into tokens in a single pass.
pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::with_capacity(text.len());
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if rest.starts_with('<') {
            if let Some(tag) = tag_like_at(text, i) {
                let token = match (TagKind::from_name(tag.name), tag.closing) {
                    (Some(kind), false) => Token::Open { tag: kind, start: i, end: tag.end },
                    (Some(kind), true) => Token::Close { tag: kind, start: i, end: tag.end },
                    (None, closing) => Token::Unknown {
                        name: tag.name,
                        closing,
                        start: i,
                        end: tag.end,
                    },
                };
                tokens.push(token);
                i = tag.end;
                continue;
            }
        } else if rest.starts_with("&lt;") {
            tokens.push(Token::Char { ch: '<', start: i, end: i + 4 });
            i += 4;
            continue;
        } else if rest.starts_with("&amp;") {
            tokens.push(Token::Char { ch: '&', start: i, end: i + 5 });
            i += 5;
            continue;
        }

        // Safe: `i` always sits on a char boundary
        let ch = rest.chars().next().unwrap_or_default();
        let len = ch.len_utf8();
        tokens.push(Token::Char { ch, start: i, end: i + len });
        i += len;
    }

    tokens
}

/// Escape literal run text so it cannot be mistaken for markup.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for (i, ch) in text.char_indices() {
        match ch {
            '<' if tag_like_at(text, i).is_some() => escaped.push_str("&lt;"),
            '&' if text[i..].starts_with("&lt;") || text[i..].starts_with("&amp;") => {
                escaped.push_str("&amp;")
            }
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Encode an ordered run list into a single tagged string.
///
/// Consecutive runs that map to the same tag are wrapped together, so a
/// paragraph split into many identically formatted runs yields one marker
/// pair.
pub fn encode(runs: &[FormattingRun]) -> String {
    let mut out = String::new();
    let mut pending = String::new();
    let mut pending_tag: Option<TagKind> = None;

    for run in runs {
        if run.text.is_empty() {
            continue;
        }

        let attrs = run.attributes();
        let tag = attrs.tag();
        if tag.is_none() && attrs.is_formatted() {
            debug!(
                "Run {:?} combines underline with other attributes; emitting plain text",
                run.text
            );
        }

        if tag != pending_tag && !pending.is_empty() {
            push_group(&mut out, pending_tag, &pending);
            pending.clear();
        }
        pending_tag = tag;
        pending.push_str(&run.text);
    }

    if !pending.is_empty() {
        push_group(&mut out, pending_tag, &pending);
    }

    out
}

fn push_group(out: &mut String, tag: Option<TagKind>, text: &str) {
    match tag {
        Some(tag) => {
            out.push_str(&tag.open());
            out.push_str(&escape(text));
            out.push_str(&tag.close());
        }
        None => out.push_str(&escape(text)),
    }
}

/// Decode tagged text back into formatting runs.
///
/// Nested tags combine their attributes. Empty tag pairs produce no run.
pub fn decode(text: &str) -> Result<Vec<FormattingRun>, CodecError> {
    let mut runs = Vec::new();
    let mut stack: Vec<(TagKind, usize)> = Vec::new();
    let mut current = String::new();

    for token in tokenize(text) {
        match token {
            Token::Char { ch, .. } => current.push(ch),
            Token::Open { tag, start, .. } => {
                flush(&mut runs, &mut current, &stack);
                stack.push((tag, start));
            }
            Token::Close { tag, start, .. } => {
                let Some(&(open, _)) = stack.last() else {
                    return Err(CodecError::UnmatchedClose {
                        tag: tag.name().to_string(),
                        offset: start,
                    });
                };
                if open != tag {
                    return Err(CodecError::MismatchedClose {
                        expected: open.name().to_string(),
                        found: tag.name().to_string(),
                        offset: start,
                    });
                }
                flush(&mut runs, &mut current, &stack);
                stack.pop();
            }
            Token::Unknown { name, start, .. } => {
                return Err(CodecError::UnknownTag {
                    name: name.to_string(),
                    offset: start,
                });
            }
        }
    }

    if let Some(&(_, offset)) = stack.last() {
        return Err(CodecError::UnclosedTags {
            tags: stack.iter().map(|(tag, _)| tag.name().to_string()).collect(),
            offset,
        });
    }

    flush(&mut runs, &mut current, &stack);
    Ok(runs)
}

fn flush(runs: &mut Vec<FormattingRun>, current: &mut String, stack: &[(TagKind, usize)]) {
    if current.is_empty() {
        return;
    }
    let attrs = stack
        .iter()
        .fold(RunAttributes::default(), |attrs, (tag, _)| attrs.with_tag(*tag));
    runs.push(attrs.run(std::mem::take(current)));
}

/// Remove all supported tags and resolve escapes, yielding plain text.
///
/// Unknown tag-like tokens are kept verbatim.
pub fn strip(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    for token in tokenize(text) {
        match token {
            Token::Char { ch, .. } => plain.push(ch),
            Token::Unknown { start, end, .. } => plain.push_str(&text[start..end]),
            Token::Open { .. } | Token::Close { .. } => {}
        }
    }
    plain
}

/// Whether the text contains any tag-like token (supported or not).
pub fn has_tags(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| !matches!(t, Token::Char { .. }))
}

/// Merge adjacent runs with identical attributes and drop empty runs.
pub fn merge_adjacent(runs: Vec<FormattingRun>) -> Vec<FormattingRun> {
    let mut merged: Vec<FormattingRun> = Vec::with_capacity(runs.len());

    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.attributes() == run.attributes() => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }

    merged
}
