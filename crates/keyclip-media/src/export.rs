//! Export coordination: one stream-copy extraction job per segment.
//!
//! A run goes through confirmation (the plan), a pre-flight collision check,
//! and then a worker thread that snaps each segment to keyframes and drives
//! the extractor. Progress and the terminal outcome travel over two one-way
//! channels; everything else stays inside the worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use keyclip_core::ms_to_seconds;
use keyclip_timeline::{Segment, Session};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, info};

use crate::extract::{CancelToken, ClipExtractor, ExtractError, ExtractRequest};
use crate::keyframe::KeyframeLocator;

/// Output path for one segment: `{dir}/{stem}_{start}-{end}{.ext}`, with the
/// raw millisecond values joined by a single hyphen, no padding.
pub fn clip_output_path(source: &Path, segment: Segment) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    source.with_file_name(format!(
        "{stem}_{}-{}{ext}",
        segment.start_ms, segment.end_ms
    ))
}

/// Why an export could not start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Export requested with no segments marked.
    #[error("no segments to export")]
    NothingToExport,
    /// A target file already exists; no job was started.
    #[error("output file already exists: {}", .0.display())]
    OutputCollision(PathBuf),
}

/// Lifecycle of an export run.
///
/// `Idle` and `Confirmed` describe the coordinator before a run starts (no
/// plan / a plan awaiting user confirmation); `Validating` covers the
/// pre-flight collision check; the rest is reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Confirmed,
    Validating,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A snapshot of everything one run needs, taken before confirmation.
///
/// Produced by [`ExportCoordinator::propose`]; the segment count feeds the
/// caller's confirmation prompt. Handing the plan to
/// [`ExportCoordinator::start`] confirms it, handing it to
/// [`ExportCoordinator::decline`] abandons it. Later timeline edits do not
/// affect a plan already taken.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    source: PathBuf,
    segments: Vec<Segment>,
    outputs: Vec<PathBuf>,
}

impl ExportPlan {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Target paths, one per segment, in job order.
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }
}

/// One extraction job, built per segment at export time.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub index: usize,
    pub segment: Segment,
    pub output: PathBuf,
    pub snapped_start_sec: f64,
    pub snapped_end_sec: f64,
}

impl ExportJob {
    pub fn duration_sec(&self) -> f64 {
        self.snapped_end_sec - self.snapped_start_sec
    }

    fn request(&self, source: &Path) -> ExtractRequest {
        ExtractRequest {
            source: source.to_path_buf(),
            start_sec: self.snapped_start_sec,
            duration_sec: self.duration_sec(),
            output: self.output.clone(),
        }
    }
}

/// Emitted on the status channel before each job starts.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Zero-based job index.
    pub index: usize,
    pub total: usize,
    pub output: PathBuf,
}

impl ExportProgress {
    /// Human-readable form, e.g. `Exporting segment 2/3...`.
    pub fn message(&self) -> String {
        format!("Exporting segment {}/{}...", self.index + 1, self.total)
    }
}

/// Terminal report of a run, sent exactly once on the done channel.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// Every job finished.
    Completed { exported: usize },
    /// A job failed. Earlier outputs remain on disk, later jobs never ran.
    Failed {
        index: usize,
        output: PathBuf,
        detail: String,
    },
    /// The run was cancelled. Earlier outputs remain on disk.
    Cancelled,
}

impl ExportOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    fn terminal_state(&self) -> RunState {
        match self {
            Self::Completed { .. } => RunState::Completed,
            Self::Failed { .. } => RunState::Failed,
            Self::Cancelled => RunState::Cancelled,
        }
    }

    /// Human-readable form for the host's status line.
    pub fn message(&self) -> String {
        match self {
            Self::Completed { exported } => format!("Exported {exported} segments."),
            Self::Failed {
                output, detail, ..
            } => {
                let name = output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("Failed to export {name}\n{detail}")
            }
            Self::Cancelled => "Export stopped.".into(),
        }
    }
}

/// Drives export runs. Owns the snapping and extraction collaborators and is
/// reusable: each terminal outcome makes it eligible for a new run.
pub struct ExportCoordinator {
    locator: Arc<KeyframeLocator>,
    extractor: Arc<dyn ClipExtractor>,
    state: Arc<Mutex<RunState>>,
}

impl ExportCoordinator {
    pub fn new(locator: KeyframeLocator, extractor: Arc<dyn ClipExtractor>) -> Self {
        Self {
            locator: Arc::new(locator),
            extractor,
            state: Arc::new(Mutex::new(RunState::Idle)),
        }
    }

    /// Current lifecycle state, for display.
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Snapshot a session into a plan awaiting confirmation.
    ///
    /// Rejects with [`ExportError::NothingToExport`] when the session has no
    /// segments, leaving the coordinator idle.
    pub fn propose(&self, session: &Session) -> Result<ExportPlan, ExportError> {
        if session.segments().is_empty() {
            return Err(ExportError::NothingToExport);
        }
        let segments = session.segments().to_vec();
        let outputs = segments
            .iter()
            .map(|seg| clip_output_path(session.source(), *seg))
            .collect();
        *self.state.lock() = RunState::Confirmed;
        Ok(ExportPlan {
            source: session.source().to_path_buf(),
            segments,
            outputs,
        })
    }

    /// Abandon a proposed plan without running it.
    pub fn decline(&self, plan: ExportPlan) {
        info!(segments = plan.segment_count(), "export declined");
        *self.state.lock() = RunState::Idle;
    }

    /// Validate a plan and launch its jobs on a worker thread.
    ///
    /// The pre-flight check fails with [`ExportError::OutputCollision`]
    /// (naming the first colliding path) before any job starts if a target
    /// file already exists. On success the returned handle carries the two
    /// notification channels for the run.
    pub fn start(&self, plan: ExportPlan) -> Result<ExportRun, ExportError> {
        *self.state.lock() = RunState::Validating;
        for output in &plan.outputs {
            if output.exists() {
                error!(output = %output.display(), "refusing to export over existing file");
                *self.state.lock() = RunState::Failed;
                return Err(ExportError::OutputCollision(output.clone()));
            }
        }

        info!(
            segments = plan.segment_count(),
            source = %plan.source.display(),
            "export started"
        );
        *self.state.lock() = RunState::Running;

        let (status_tx, status_rx) = unbounded();
        let (done_tx, done_rx) = bounded(1);
        let cancel = CancelToken::new();

        let locator = Arc::clone(&self.locator);
        let extractor = Arc::clone(&self.extractor);
        let state = Arc::clone(&self.state);
        let worker_cancel = cancel.clone();
        let handle = std::thread::spawn(move || {
            let outcome = run_jobs(&plan, &locator, &*extractor, &worker_cancel, &status_tx);
            *state.lock() = outcome.terminal_state();
            let _ = done_tx.send(outcome);
        });

        Ok(ExportRun {
            state: Arc::clone(&self.state),
            status: status_rx,
            done: done_rx,
            cancel,
            handle: Some(handle),
        })
    }
}

/// Worker body: jobs strictly in plan order, fail-fast, cancel-aware.
fn run_jobs(
    plan: &ExportPlan,
    locator: &KeyframeLocator,
    extractor: &dyn ClipExtractor,
    cancel: &CancelToken,
    status: &Sender<ExportProgress>,
) -> ExportOutcome {
    let total = plan.segments.len();
    for (index, (segment, output)) in plan.segments.iter().zip(&plan.outputs).enumerate() {
        if cancel.is_cancelled() {
            info!(job = index + 1, "export cancelled between jobs");
            return ExportOutcome::Cancelled;
        }

        let progress = ExportProgress {
            index,
            total,
            output: output.clone(),
        };
        info!("{}", progress.message());
        let _ = status.send(progress);

        let job = ExportJob {
            index,
            segment: *segment,
            output: output.clone(),
            snapped_start_sec: locator.snap_back(&plan.source, ms_to_seconds(segment.start_ms)),
            snapped_end_sec: locator.snap_forward(&plan.source, ms_to_seconds(segment.end_ms)),
        };

        match extractor.extract(&job.request(&plan.source), cancel) {
            Ok(()) => {}
            Err(ExtractError::Cancelled) => {
                info!(job = index + 1, "export cancelled");
                return ExportOutcome::Cancelled;
            }
            Err(err) => {
                error!(job = index + 1, output = %output.display(), %err, "export job failed");
                let detail = match err {
                    ExtractError::Failed { diagnostic, .. } if !diagnostic.is_empty() => diagnostic,
                    other => other.to_string(),
                };
                return ExportOutcome::Failed {
                    index,
                    output: output.clone(),
                    detail,
                };
            }
        }
    }
    info!(exported = total, "export completed");
    ExportOutcome::Completed { exported: total }
}

/// Handle to an in-flight export run.
///
/// The status channel carries one message per job start; the done channel
/// carries exactly one terminal message. Dropping the handle detaches the
/// worker (it keeps running); use [`ExportRun::cancel`] to stop it.
#[derive(Debug)]
pub struct ExportRun {
    state: Arc<Mutex<RunState>>,
    status: Receiver<ExportProgress>,
    done: Receiver<ExportOutcome>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl ExportRun {
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Per-job progress notifications.
    pub fn status(&self) -> &Receiver<ExportProgress> {
        &self.status
    }

    /// The single terminal notification.
    pub fn done(&self) -> &Receiver<ExportOutcome> {
        &self.done
    }

    /// Request cancellation. The in-flight job's process is terminated; the
    /// terminal outcome still arrives on the done channel.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the worker thread has finished. The terminal outcome is
    /// read from [`ExportRun::done`].
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
