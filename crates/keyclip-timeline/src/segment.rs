//! Segment value type.

use keyclip_core::clock_format;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-marked time range within the loaded video, in milliseconds.
///
/// Segments are immutable once created; an edit replaces the whole segment
/// via undo/redo. The store, not this type, rejects invalid ranges before
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the range, in milliseconds.
    pub start_ms: u64,
    /// End of the range, in milliseconds. Always greater than `start_ms`.
    pub end_ms: u64,
}

impl Segment {
    /// Create a new segment. Callers validate `start_ms < end_ms` first.
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        debug_assert!(start_ms < end_ms);
        Self { start_ms, end_ms }
    }

    /// Length of the range in milliseconds.
    pub fn duration_ms(self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Two segments overlap unless one ends at or before the other starts.
    /// Touching endpoints do not count as overlap.
    pub fn overlaps(self, other: Segment) -> bool {
        !(self.end_ms <= other.start_ms || self.start_ms >= other.end_ms)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            clock_format(self.start_ms),
            clock_format(self.end_ms)
        )
    }
}
