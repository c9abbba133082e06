//! Integration tests for the marking/undo flow and keyframe snapping.

use std::path::Path;
use std::sync::Arc;

use keyclip_core::MediaPlayback;
use keyclip_media::KeyframeLocator;
use keyclip_timeline::{MarkError, SegmentRejection, Session};

use crate::support::{init_logging, ScriptedPlayback, StaticProber};

#[test]
fn mark_scrub_mark_builds_timeline() {
    init_logging();
    let mut session = Session::new("/videos/talk.mp4");
    let mut player = ScriptedPlayback::new();
    player.length_ms = 600_000;
    assert!(session.poll_duration(&player));

    player.seek_ms(10_000);
    session.mark_start_from(&player);
    player.seek_ms(25_000);
    session.mark_end_from(&player).unwrap();

    player.seek_ms(90_000);
    session.mark_start_from(&player);
    player.seek_ms(120_000);
    session.mark_end_from(&player).unwrap();

    let segments = session.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].to_string(), "00:00:10 - 00:00:25");
    assert_eq!(segments[1].to_string(), "00:01:30 - 00:02:00");
}

#[test]
fn overlapping_mark_is_rejected_and_timeline_unchanged() {
    let mut session = Session::new("/videos/talk.mp4");
    session.mark_start(1000);
    session.mark_end(2000).unwrap();

    session.mark_start(1500);
    let err = session.mark_end(2500).unwrap_err();
    assert!(matches!(
        err,
        MarkError::Rejected(SegmentRejection::Overlap(_))
    ));
    assert_eq!(session.segments().len(), 1);
}

#[test]
fn undo_redo_walk_through_history() {
    let mut session = Session::new("/videos/talk.mp4");
    for (start, end) in [(0u64, 1000u64), (2000, 3000), (4000, 5000)] {
        session.mark_start(start);
        session.mark_end(end).unwrap();
    }

    session.undo();
    session.undo();
    assert_eq!(session.segments().len(), 1);

    session.redo();
    assert_eq!(session.segments().len(), 2);

    // A fresh mark invalidates the remaining redo step.
    session.mark_start(10_000);
    session.mark_end(11_000).unwrap();
    assert!(session.redo().is_none());
    assert_eq!(session.segments().len(), 3);
}

#[test]
fn snapping_uses_enclosing_keyframe_range() {
    let locator = KeyframeLocator::new(Arc::new(StaticProber::with_keyframes(vec![
        0.0, 2.0, 4.0, 6.0,
    ])));
    let path = Path::new("/videos/talk.mp4");

    // User marks (2500, 5500) ms; the lossless range is [2.0, 6.0).
    let start = locator.snap_back(path, 2.5);
    let end = locator.snap_forward(path, 5.5);
    assert_eq!(start, 2.0);
    assert_eq!(end, 6.0);
    assert_eq!(end - start, 4.0);
}

#[test]
fn snapping_degrades_to_user_marks_when_probe_fails() {
    let locator = KeyframeLocator::new(Arc::new(StaticProber::failing()));
    let path = Path::new("/videos/talk.mp4");
    assert_eq!(locator.snap_back(path, 2.5), 2.5);
    assert_eq!(locator.snap_forward(path, 5.5), 5.5);
}
