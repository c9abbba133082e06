//! Per-video clipping session.
//!
//! The session is the explicit context object for one loaded video: the
//! pending start mark, the learned media duration, and the timeline store
//! all live here instead of in application-wide state.

use std::path::{Path, PathBuf};

use keyclip_core::MediaPlayback;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::segment::Segment;
use crate::store::{SegmentRejection, TimelineStore};

/// Why an end mark failed to commit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkError {
    /// An end mark was placed with no start mark pending.
    #[error("mark a start point first")]
    NoStart,
    #[error(transparent)]
    Rejected(#[from] SegmentRejection),
}

/// Clipping state for one loaded video.
///
/// A session belongs to exactly one video. Loading another video means
/// constructing a fresh session, which is also what clears the timeline and
/// its history.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    source: PathBuf,
    duration_ms: u64,
    timeline: TimelineStore,
    pending_start_ms: Option<u64>,
}

impl Session {
    /// Open a session for a video file. The duration starts unknown and is
    /// learned from the playback transport via [`Session::poll_duration`].
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        info!(source = %source.display(), "session opened");
        Self {
            id: Uuid::new_v4(),
            source,
            duration_ms: 0,
            timeline: TimelineStore::new(),
            pending_start_ms: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Media duration in milliseconds, `0` while still unknown.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn timeline(&self) -> &TimelineStore {
        &self.timeline
    }

    /// Segments in append order.
    pub fn segments(&self) -> &[Segment] {
        self.timeline.segments()
    }

    pub fn pending_start_ms(&self) -> Option<u64> {
        self.pending_start_ms
    }

    /// Adopt the transport's reported length. Players report `0` until the
    /// container is parsed, so this is polled. Returns `true` once known.
    pub fn poll_duration(&mut self, playback: &impl MediaPlayback) -> bool {
        if self.duration_ms == 0 {
            let length = playback.length_ms();
            if length > 0 {
                info!(duration_ms = length, "media duration reported");
                self.duration_ms = length;
            }
        }
        self.duration_ms > 0
    }

    /// Record the start point for the next segment, replacing any pending
    /// mark.
    pub fn mark_start(&mut self, position_ms: u64) {
        self.pending_start_ms = Some(position_ms);
    }

    /// Record the start point from the transport's current position.
    pub fn mark_start_from(&mut self, playback: &impl MediaPlayback) {
        self.mark_start(playback.position_ms());
    }

    /// Commit the pending segment, ending at `position_ms`.
    ///
    /// When the media duration is known the end point is clamped to it
    /// before validation. The pending start stays armed on rejection so the
    /// user can pick a different end point; it is consumed on success.
    pub fn mark_end(&mut self, position_ms: u64) -> Result<Segment, MarkError> {
        let start_ms = self.pending_start_ms.ok_or_else(|| {
            warn!("end mark without a pending start");
            MarkError::NoStart
        })?;
        let end_ms = if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        };
        match self.timeline.add_segment(start_ms, end_ms) {
            Ok(segment) => {
                self.pending_start_ms = None;
                Ok(segment)
            }
            Err(rejection) => {
                warn!(%rejection, start_ms, end_ms, "segment rejected");
                Err(rejection.into())
            }
        }
    }

    /// Commit the pending segment at the transport's current position.
    pub fn mark_end_from(&mut self, playback: &impl MediaPlayback) -> Result<Segment, MarkError> {
        self.mark_end(playback.position_ms())
    }

    /// Discard the pending start mark, if any.
    pub fn clear_pending(&mut self) {
        self.pending_start_ms = None;
    }

    /// Step the timeline back one snapshot. See [`TimelineStore::undo`].
    pub fn undo(&mut self) -> Option<&[Segment]> {
        self.timeline.undo()
    }

    /// Step the timeline forward one snapshot. See [`TimelineStore::redo`].
    pub fn redo(&mut self) -> Option<&[Segment]> {
        self.timeline.redo()
    }
}
