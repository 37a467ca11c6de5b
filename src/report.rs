/*!
 * Recoverable issues collected during import and export.
 *
 * Nothing in here aborts an operation: skipped elements, missing styles and
 * stale segments are recorded with enough context to show the user, and the
 * operation carries on.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SegmentTagError;

/// Kinds of recoverable problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Source element the walker does not support, or inline content a
    /// rewritten paragraph cannot carry; skipped
    StructuralSkip,
    /// Malformed inline tags in a segment
    TagSyntaxError,
    /// Style missing from the output catalog; default style used
    StyleNotFound,
    /// Segment pointing at a node position that no longer exists; dropped
    StaleReference,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StructuralSkip => "structural skip",
            Self::TagSyntaxError => "tag syntax error",
            Self::StyleNotFound => "style not found",
            Self::StaleReference => "stale reference",
        };
        f.write_str(name)
    }
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Segments involved, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segment_ids: Vec<usize>,
    /// Node position involved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub message: String,
}

impl Issue {
    pub fn structural_skip(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::StructuralSkip,
            segment_ids: Vec::new(),
            position: None,
            message: message.into(),
        }
    }

    /// Inline element lost because its paragraph was rewritten
    pub fn dropped_inline(position: usize, segment_ids: Vec<usize>, element: &str) -> Self {
        Self {
            kind: IssueKind::StructuralSkip,
            segment_ids,
            position: Some(position),
            message: format!("Inline '{}' element dropped by the rewritten paragraph", element),
        }
    }

    pub fn tag_syntax(offender: &SegmentTagError) -> Self {
        Self {
            kind: IssueKind::TagSyntaxError,
            segment_ids: vec![offender.segment_id],
            position: None,
            message: offender.error.to_string(),
        }
    }

    pub fn style_not_found(
        position: usize,
        segment_ids: Vec<usize>,
        requested: &str,
        default_style: &str,
    ) -> Self {
        Self {
            kind: IssueKind::StyleNotFound,
            segment_ids,
            position: Some(position),
            message: format!(
                "Style '{}' not found in output catalog; using '{}'",
                requested, default_style
            ),
        }
    }

    pub fn stale_reference(position: usize, segment_ids: Vec<usize>) -> Self {
        Self {
            kind: IssueKind::StaleReference,
            segment_ids,
            position: Some(position),
            message: format!("No document node at position {}; segment dropped", position),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(position) = self.position {
            write!(f, " node {}", position)?;
        }
        if !self.segment_ids.is_empty() {
            let ids: Vec<String> = self.segment_ids.iter().map(|id| format!("#{}", id)).collect();
            write!(f, " segments {}", ids.join(", "))?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Structured outcome of an import or export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Segments handed to the operation
    pub segments_total: usize,
    /// Segments that made it into the output
    pub segments_exported: usize,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn new(segments_total: usize) -> Self {
        Self {
            segments_total,
            ..Self::default()
        }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    /// Number of issues of one kind
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Issues of one kind
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// One-line summary, e.g. "27/27 segments exported, 2 styles not found (defaults used)"
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}/{} segments exported",
            self.segments_exported, self.segments_total
        );

        let parts = [
            (IssueKind::StyleNotFound, "style", "styles", "not found (defaults used)"),
            (IssueKind::StaleReference, "stale segment group", "stale segment groups", "dropped"),
            (IssueKind::StructuralSkip, "element", "elements", "skipped"),
            (IssueKind::TagSyntaxError, "segment", "segments", "with tag errors"),
        ];
        for (kind, singular, plural, suffix) in parts {
            let n = self.count(kind);
            if n > 0 {
                let noun = if n == 1 { singular } else { plural };
                summary.push_str(&format!(", {} {} {}", n, noun, suffix));
            }
        }

        summary
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
