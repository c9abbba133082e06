//! Millisecond time helpers.
//!
//! Clip marks come from the playback transport in integer milliseconds; the
//! transcoder speaks floating-point seconds. These helpers hold the two
//! conventions apart.

/// Format a millisecond position as a zero-padded `HH:MM:SS` clock string.
///
/// Sub-second precision is truncated, never rounded: 1999 ms displays as
/// `00:00:01`.
pub fn clock_format(ms: u64) -> String {
    let s = ms / 1000;
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// Convert a millisecond position to floating-point seconds.
#[inline]
pub fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
