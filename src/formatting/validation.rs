/*!
 * Tag balance validation for edited segment text.
 *
 * Validation runs in a single linear pass and never allocates runs, so an
 * editor can call it on every keystroke.
 */

use crate::errors::CodecError;

use super::TagKind;
use super::tags::{Token, tokenize};

/// Outcome of validating one segment's markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValidation {
    /// Whether the markup is well formed
    pub ok: bool,
    /// Human readable description (empty when ok)
    pub message: String,
    /// Structured error for callers that need more than the message
    pub error: Option<CodecError>,
}

impl TagValidation {
    /// Create a passing result
    pub fn success() -> Self {
        Self {
            ok: true,
            message: String::new(),
            error: None,
        }
    }

    /// Create a failing result
    pub fn failure(error: CodecError) -> Self {
        Self {
            ok: false,
            message: error.to_string(),
            error: Some(error),
        }
    }
}

/// Check tagged text for structural problems.
///
/// Reports the first problem found scanning left to right; at the end of
/// the text every still-open tag is named.
pub fn check(text: &str) -> Result<(), CodecError> {
    let mut stack: Vec<(TagKind, usize)> = Vec::new();

    for token in tokenize(text) {
        match token {
            Token::Char { .. } => {}
            Token::Open { tag, start, .. } => stack.push((tag, start)),
            Token::Close { tag, start, .. } => match stack.pop() {
                None => {
                    return Err(CodecError::UnmatchedClose {
                        tag: tag.name().to_string(),
                        offset: start,
                    });
                }
                Some((open, _)) if open != tag => {
                    return Err(CodecError::MismatchedClose {
                        expected: open.name().to_string(),
                        found: tag.name().to_string(),
                        offset: start,
                    });
                }
                Some(_) => {}
            },
            Token::Unknown { name, start, .. } => {
                return Err(CodecError::UnknownTag {
                    name: name.to_string(),
                    offset: start,
                });
            }
        }
    }

    match stack.last() {
        Some(&(_, offset)) => Err(CodecError::UnclosedTags {
            tags: stack.iter().map(|(tag, _)| tag.name().to_string()).collect(),
            offset,
        }),
        None => Ok(()),
    }
}

/// Validate tagged text, returning an `(ok, message)` style result.
pub fn validate(text: &str) -> TagValidation {
    match check(text) {
        Ok(()) => TagValidation::success(),
        Err(error) => TagValidation::failure(error),
    }
}
