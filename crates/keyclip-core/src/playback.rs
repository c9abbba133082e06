//! Interface to the media-playback collaborator.
//!
//! KeyClip does not decode or render video. The host application supplies a
//! player behind this trait; the core only reads the transport position and
//! length and toggles the obvious switches.

/// Playback transport consumed by a clipping session.
///
/// A reported length of `0` means the player does not know the media
/// duration yet; callers should keep polling.
pub trait MediaPlayback {
    /// Current playback position in milliseconds.
    fn position_ms(&self) -> u64;

    /// Total media length in milliseconds, or `0` if not yet known.
    fn length_ms(&self) -> u64;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Seek to an absolute position in milliseconds.
    fn seek_ms(&mut self, position_ms: u64);

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// Toggle between playing and paused.
    fn toggle_play(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Toggle the mute state.
    fn toggle_mute(&mut self) {
        let muted = self.is_muted();
        self.set_muted(!muted);
    }
}
