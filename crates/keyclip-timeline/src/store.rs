//! Timeline store: ordered segments with snapshot undo/redo.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::segment::Segment;

/// Why a candidate segment was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRejection {
    /// The end mark is at or before the start mark.
    #[error("end must be after start")]
    EndBeforeStart,
    /// The candidate range overlaps a segment already on the timeline.
    #[error("segment overlaps existing segment {0}")]
    Overlap(Segment),
}

/// Ordered segments for one loaded video, with whole-timeline undo/redo.
///
/// History is kept as full snapshots of the segment list; committing a new
/// segment invalidates the redo history. Segments stay in append order; the
/// store never sorts.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TimelineStore {
    segments: Vec<Segment>,
    undo_stack: Vec<Vec<Segment>>,
    redo_stack: Vec<Vec<Segment>>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments in append order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Validate and append a segment, recording an undo snapshot.
    ///
    /// This is the only forward mutation. There is no per-segment edit or
    /// delete; corrections go through [`TimelineStore::undo`].
    pub fn add_segment(&mut self, start_ms: u64, end_ms: u64) -> Result<Segment, SegmentRejection> {
        if end_ms <= start_ms {
            return Err(SegmentRejection::EndBeforeStart);
        }
        let candidate = Segment::new(start_ms, end_ms);
        if let Some(existing) = self.segments.iter().find(|s| candidate.overlaps(**s)) {
            return Err(SegmentRejection::Overlap(*existing));
        }
        self.undo_stack.push(self.segments.clone());
        self.redo_stack.clear();
        self.segments.push(candidate);
        debug!(%candidate, total = self.segments.len(), "segment added");
        Ok(candidate)
    }

    /// Step back to the previous snapshot. Returns the restored list, or
    /// `None` (with no state change) when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&[Segment]> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack
            .push(std::mem::replace(&mut self.segments, snapshot));
        Some(&self.segments)
    }

    /// Step forward to the most recently undone snapshot. Returns the
    /// restored list, or `None` (with no state change) when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> Option<&[Segment]> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack
            .push(std::mem::replace(&mut self.segments, snapshot));
        Some(&self.segments)
    }

    /// Drop all segments and both history stacks together. Called when a new
    /// video replaces the current one.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
