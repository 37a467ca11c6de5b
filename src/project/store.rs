/*!
 * Live segment list shared between the editor and export.
 *
 * `SegmentStore` owns the segments. Every change goes through `apply`, which
 * notifies subscribers afterwards; readers take a `snapshot` and never hold
 * the lock across their own work.
 */

use log::{debug, trace};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::errors::ProjectError;
use crate::segmenter::{Segment, SegmentStatus};

/// Capacity of the change channel; slow subscribers see `Lagged` past this
const EVENT_CAPACITY: usize = 256;

/// A single change to a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the edited text
    SetTarget { id: usize, text: String },
    /// Set the translation status
    SetStatus { id: usize, status: SegmentStatus },
}

impl Edit {
    pub fn segment_id(&self) -> usize {
        match self {
            Self::SetTarget { id, .. } | Self::SetStatus { id, .. } => *id,
        }
    }
}

/// Published after an edit has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub edit: Edit,
    /// The segment as it is after the edit
    pub segment: Segment,
}

/// Single owner of the editable segment list
#[derive(Debug)]
pub struct SegmentStore {
    segments: RwLock<Vec<Segment>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SegmentStore {
    pub fn new(segments: Vec<Segment>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            segments: RwLock::new(segments),
            events,
        }
    }

    /// Apply one edit and return the updated segment.
    ///
    /// Setting a non-empty target on an untranslated segment moves it to
    /// `Draft`; an explicit status edit always wins.
    pub fn apply(&self, edit: Edit) -> Result<Segment, ProjectError> {
        let updated = {
            let mut segments = self.segments.write();
            let id = edit.segment_id();
            let segment = segments
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(ProjectError::UnknownSegment(id))?;

            match &edit {
                Edit::SetTarget { text, .. } => {
                    segment.target_text = text.clone();
                    if segment.status == SegmentStatus::Untranslated && !text.trim().is_empty() {
                        segment.status = SegmentStatus::Draft;
                    }
                }
                Edit::SetStatus { status, .. } => segment.status = *status,
            }
            segment.clone()
        };

        debug!("Segment #{} updated ({})", updated.id, updated.status);

        // No subscribers is fine
        if self
            .events
            .send(StoreEvent {
                edit,
                segment: updated.clone(),
            })
            .is_err()
        {
            trace!("No store subscribers for segment #{}", updated.id);
        }

        Ok(updated)
    }

    /// Apply edits in order, stopping at the first failure
    pub fn apply_all(&self, edits: impl IntoIterator<Item = Edit>) -> Result<usize, ProjectError> {
        let mut applied = 0;
        for edit in edits {
            self.apply(edit)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Copy of the current list
    pub fn snapshot(&self) -> Vec<Segment> {
        self.segments.read().clone()
    }

    pub fn get(&self, id: usize) -> Option<Segment> {
        self.segments.read().iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.segments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.read().is_empty()
    }

    /// Receive every applied edit from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments.into_inner()
    }
}
