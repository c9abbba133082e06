//! KeyClip Core - Foundation types for lossless video clipping
//!
//! This crate provides the fundamental pieces used throughout KeyClip:
//! - Error type and result alias
//! - Millisecond time helpers and clock formatting
//! - The media-playback collaborator interface

pub mod error;
pub mod playback;
pub mod time;

pub use error::{KeyclipError, Result};
pub use playback::MediaPlayback;
pub use time::{clock_format, ms_to_seconds};
