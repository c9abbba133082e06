//! KeyClip Timeline - Segment data model
//!
//! Implements the clipping state for one loaded video:
//! - Immutable time-range segments
//! - The timeline store with non-overlap enforcement and snapshot undo/redo
//! - The per-video session that ties marks, duration, and history together

pub mod segment;
pub mod session;
pub mod store;

pub use segment::Segment;
pub use session::{MarkError, Session};
pub use store::{SegmentRejection, TimelineStore};
