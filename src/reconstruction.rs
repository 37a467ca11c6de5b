/*!
 * Reconstruction of a document from edited segments.
 *
 * The original document is never touched: a clone is re-walked with the same
 * traversal used at import, each slot that owns segments gets its runs
 * rebuilt from the joined segment text, and only then is the slot's original
 * style resolved against the output catalog and applied. Inline content the
 * runs cannot hold survives only in paragraphs that come out unchanged; each
 * element a rewrite loses is reported.
 *
 * Markup is validated for every segment before anything is rebuilt, so a
 * reconstruction either fails with the complete list of offending segments
 * or produces a whole document.
 */

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::app_config::{CarryOverConfig, ReconstructionConfig};
use crate::document::{Document, StyleCatalog, StyleResolution};
use crate::errors::{ReconstructionError, SegmentTagError};
use crate::formatting::{
    FormattingRun, RunAttributes, check, decode, has_tags, merge_adjacent, strip,
};
use crate::report::{Issue, Report};
use crate::segmenter::Segment;
use crate::walker::{node_addresses, paragraph_mut};

/// Knobs for one reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReconstructionOptions {
    pub carry_over: CarryOverConfig,
}

impl From<&ReconstructionConfig> for ReconstructionOptions {
    fn from(config: &ReconstructionConfig) -> Self {
        Self {
            carry_over: config.carry_over,
        }
    }
}

/// A rebuilt document and what happened while building it
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub document: Document,
    pub report: Report,
}

/// Validate the effective text of every segment.
pub fn preflight(segments: &[Segment]) -> Result<(), ReconstructionError> {
    let offenders: Vec<SegmentTagError> = segments
        .iter()
        .filter_map(|segment| {
            check(segment.effective_text())
                .err()
                .map(|error| SegmentTagError {
                    segment_id: segment.id,
                    error,
                })
        })
        .collect();

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(ReconstructionError::TagSyntax { offenders })
    }
}

/// Group segments by owning node, each group ordered by segment id.
fn group_by_node(segments: &[Segment]) -> BTreeMap<usize, Vec<&Segment>> {
    let mut groups: BTreeMap<usize, Vec<&Segment>> = BTreeMap::new();
    for segment in segments {
        groups
            .entry(segment.owning_node_position)
            .or_default()
            .push(segment);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|s| s.id);
    }
    groups
}

/// Rebuild a document from a snapshot of edited segments.
pub fn reconstruct(
    original: &Document,
    segments: &[Segment],
    catalog: &StyleCatalog,
    options: &ReconstructionOptions,
) -> Result<Reconstruction, ReconstructionError> {
    preflight(segments)?;

    let mut groups = group_by_node(segments);
    let mut report = Report::new(segments.len());
    let mut document = original.clone();
    document.styles = catalog.clone();

    for address in node_addresses(original) {
        let Some(group) = groups.remove(&address.position) else {
            continue;
        };
        let Some(paragraph) = paragraph_mut(&mut document, &address.path) else {
            // Addresses come from the same tree, so this cannot happen
            groups.insert(address.position, group);
            continue;
        };

        let joined = join_texts(&group);
        let joined = joined.as_str();

        let runs = decode(joined).map_err(|error| ReconstructionError::TagSyntax {
            offenders: group
                .iter()
                .map(|s| SegmentTagError {
                    segment_id: s.id,
                    error: error.clone(),
                })
                .collect(),
        })?;
        let runs = if has_tags(joined) {
            runs
        } else {
            let plain: String = runs.iter().map(|r| r.text.as_str()).collect();
            carry_over(&plain, &paragraph.runs, &options.carry_over)
        };

        // Runs first, style second
        paragraph.runs = merge_adjacent(runs);

        if let Some(style) = paragraph.style.take() {
            let resolution = catalog.resolve(&style);
            match &resolution {
                StyleResolution::Found(_) => {}
                StyleResolution::Fallback { requested, resolved } => {
                    debug!(
                        "Style '{}' at node {} mapped to '{}'",
                        requested, address.position, resolved
                    );
                }
                StyleResolution::NotFound { requested, default } => {
                    warn!(
                        "Style '{}' at node {} not found; using '{}'",
                        requested, address.position, default
                    );
                    report.push(Issue::style_not_found(
                        address.position,
                        group.iter().map(|s| s.id).collect(),
                        requested,
                        default,
                    ));
                }
            }
            paragraph.style = Some(resolution.style_name().to_string());
        }

        for element in paragraph.dropped_inline() {
            warn!(
                "Rewriting node {} drops its '{}' element",
                address.position, element
            );
            report.push(Issue::dropped_inline(
                address.position,
                group.iter().map(|s| s.id).collect(),
                element,
            ));
        }

        report.segments_exported += group.len();
    }

    for (position, group) in groups {
        let ids: Vec<usize> = group.iter().map(|s| s.id).collect();
        warn!(
            "Segments {:?} reference node {} which does not exist; dropped",
            ids, position
        );
        report.push(Issue::stale_reference(position, ids));
    }

    info!("{}", report.summary());
    Ok(Reconstruction { document, report })
}

/// Join segment texts with a single space.
///
/// No space is added where the previous text already ends in whitespace
/// hidden inside a closing tag, so untouched segments rejoin to the
/// original text.
fn join_texts(group: &[&Segment]) -> String {
    let mut joined = String::new();
    let mut ends_with_space = true;

    for segment in group {
        let text = segment.effective_text().trim();
        if text.is_empty() {
            continue;
        }
        if !ends_with_space {
            joined.push(' ');
        }
        joined.push_str(text);
        ends_with_space = strip(text).ends_with(char::is_whitespace);
    }

    joined
}

/// Count of non-whitespace characters.
fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Format untagged replacement text after the source node's formatting.
///
/// When most of the source is formatted the whole text takes the dominant
/// attributes; otherwise a formatted opening run carries over to the same
/// number of leading words.
pub fn carry_over(
    text: &str,
    source: &[FormattingRun],
    config: &CarryOverConfig,
) -> Vec<FormattingRun> {
    let plain = || vec![FormattingRun::plain(text)];
    if !config.enabled || text.is_empty() {
        return plain();
    }

    let total: usize = source.iter().map(|r| visible_len(&r.text)).sum();
    let mut weights: Vec<(RunAttributes, usize)> = Vec::new();
    for run in source.iter().filter(|r| r.is_formatted()) {
        let len = visible_len(&run.text);
        match weights.iter_mut().find(|(attrs, _)| *attrs == run.attributes()) {
            Some((_, weight)) => *weight += len,
            None => weights.push((run.attributes(), len)),
        }
    }
    let formatted: usize = weights.iter().map(|(_, w)| *w).sum();
    if total == 0 || formatted == 0 {
        return plain();
    }

    let coverage = formatted as f64 / total as f64;
    if coverage >= config.whole_segment_threshold {
        // Ties go to the attributes seen first
        let dominant = weights
            .iter()
            .fold(None::<&(RunAttributes, usize)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(attrs, _)| *attrs)
            .unwrap_or_default();
        debug!("Carrying {:?} over the whole text (coverage {:.2})", dominant, coverage);
        return vec![dominant.run(text)];
    }

    let Some(lead) = source.iter().find(|r| !r.text.trim().is_empty()) else {
        return plain();
    };
    if !lead.is_formatted() {
        return plain();
    }

    let words = lead.text.split_whitespace().count();
    let split_at = end_of_words(text, words);
    debug!("Carrying {:?} over the first {} word(s)", lead.attributes(), words);
    if split_at >= text.len() {
        return vec![lead.with_text(text)];
    }
    vec![
        lead.with_text(&text[..split_at]),
        FormattingRun::plain(&text[split_at..]),
    ]
}

/// Byte offset just past the `words`-th whitespace-separated word.
fn end_of_words(text: &str, words: usize) -> usize {
    let mut seen = 0usize;
    let mut in_word = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                seen += 1;
                in_word = false;
                if seen == words {
                    return i;
                }
            }
        } else {
            in_word = true;
        }
    }
    text.len()
}
