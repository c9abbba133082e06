//! End-to-end export scenarios with scripted prober and extractor doubles.

use std::sync::Arc;

use keyclip_media::{ExportError, ExportOutcome, RunState};
use keyclip_timeline::Session;

use crate::support::{coordinator_with, init_logging, RecordingExtractor};

fn session_with_segments(dir: &std::path::Path, ranges: &[(u64, u64)]) -> Session {
    let mut session = Session::new(dir.join("talk.mp4"));
    for (start, end) in ranges {
        session.mark_start(*start);
        session.mark_end(*end).unwrap();
    }
    session
}

#[test]
fn full_run_exports_every_segment_with_snapped_ranges() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(RecordingExtractor::new());
    let coordinator = coordinator_with(vec![0.0, 2.0, 4.0, 6.0], extractor.clone());
    let session = session_with_segments(dir.path(), &[(2500, 5500)]);

    let plan = coordinator.propose(&session).unwrap();
    assert_eq!(plan.segment_count(), 1);

    let mut run = coordinator.start(plan).unwrap();
    let progress = run.status().recv().unwrap();
    assert_eq!(progress.message(), "Exporting segment 1/1...");

    let outcome = run.done().recv().unwrap();
    run.join();
    assert!(outcome.success());
    assert_eq!(outcome.message(), "Exported 1 segments.");

    let requests = extractor.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].start_sec, 2.0);
    assert_eq!(requests[0].duration_sec, 4.0);
    assert_eq!(requests[0].output, dir.path().join("talk_2500-5500.mp4"));
    assert!(requests[0].output.exists());
}

#[test]
fn failing_job_stops_the_run_and_reports_once() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(RecordingExtractor::failing_at(1));
    let coordinator = coordinator_with(vec![0.0], extractor.clone());
    let session = session_with_segments(dir.path(), &[(0, 1000), (2000, 3000), (4000, 5000)]);

    let plan = coordinator.propose(&session).unwrap();
    let mut run = coordinator.start(plan).unwrap();
    let outcome = run.done().recv().unwrap();
    run.join();

    match &outcome {
        ExportOutcome::Failed {
            index,
            output,
            detail,
        } => {
            assert_eq!(*index, 1);
            assert_eq!(*output, dir.path().join("talk_2000-3000.mp4"));
            assert_eq!(detail, "Invalid data found when processing input");
        }
        other => panic!("expected failure, got {other:?}"),
    }

    // Job 1 completed and its file survives; job 3 never started.
    assert!(dir.path().join("talk_0-1000.mp4").exists());
    assert!(!dir.path().join("talk_4000-5000.mp4").exists());
    assert_eq!(extractor.call_count(), 2);

    // Exactly one terminal message.
    assert!(run.done().try_recv().is_err());
}

#[test]
fn output_collision_aborts_before_any_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(RecordingExtractor::new());
    let coordinator = coordinator_with(vec![0.0], extractor.clone());
    let session = session_with_segments(dir.path(), &[(0, 1000), (2000, 3000)]);

    let colliding = dir.path().join("talk_0-1000.mp4");
    std::fs::write(&colliding, b"existing").unwrap();

    let plan = coordinator.propose(&session).unwrap();
    match coordinator.start(plan) {
        Err(ExportError::OutputCollision(path)) => assert_eq!(path, colliding),
        other => panic!("expected collision, got {other:?}"),
    }
    assert_eq!(extractor.call_count(), 0);
    assert_eq!(coordinator.state(), RunState::Failed);
}

#[test]
fn nothing_to_export_without_segments() {
    let extractor = Arc::new(RecordingExtractor::new());
    let coordinator = coordinator_with(vec![0.0], extractor);
    let session = Session::new("/videos/talk.mp4");
    assert_eq!(
        coordinator.propose(&session).unwrap_err(),
        ExportError::NothingToExport
    );
}

#[test]
fn coordinator_is_reusable_after_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(RecordingExtractor::new());
    let coordinator = coordinator_with(vec![0.0], extractor.clone());

    let first = session_with_segments(dir.path(), &[(0, 1000)]);
    let plan = coordinator.propose(&first).unwrap();
    let mut run = coordinator.start(plan).unwrap();
    run.done().recv().unwrap();
    run.join();
    assert_eq!(coordinator.state(), RunState::Completed);

    // A new video means a new session; the coordinator runs it untouched.
    let second = session_with_segments(dir.path(), &[(5000, 9000)]);
    let plan = coordinator.propose(&second).unwrap();
    let mut run = coordinator.start(plan).unwrap();
    let outcome = run.done().recv().unwrap();
    run.join();
    assert!(outcome.success());
    assert_eq!(extractor.call_count(), 2);
}
