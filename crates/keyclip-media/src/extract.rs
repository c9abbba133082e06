//! Lossless clip extraction by invoking ffmpeg with stream copy.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

/// How often the extractor checks the child process and the cancel token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One stream-copy extraction: seek, read for a duration, write one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub source: PathBuf,
    /// Seek position in seconds (a snapped cut point).
    pub start_sec: f64,
    /// How many seconds to copy from the seek position.
    pub duration_sec: f64,
    pub output: PathBuf,
}

/// Why an extraction did not produce its output.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to run transcoder: {0}")]
    Process(#[from] std::io::Error),
    /// The transcoder exited with a failure status. `diagnostic` is its
    /// captured stderr, verbatim.
    #[error("transcoder failed ({status}): {diagnostic}")]
    Failed { status: String, diagnostic: String },
    /// The job was cancelled and its process terminated.
    #[error("extraction cancelled")]
    Cancelled,
}

/// Handle for cancelling in-flight extraction work. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Performs extractions. The production implementation spawns ffmpeg; tests
/// substitute a recording double.
pub trait ClipExtractor: Send + Sync {
    fn extract(&self, request: &ExtractRequest, cancel: &CancelToken) -> Result<(), ExtractError>;
}

/// ffmpeg-backed extractor.
///
/// Stream copy only: the compressed packets between the snapped cut points
/// are copied verbatim, never re-encoded. The overwrite flag is passed
/// because the export coordinator has already ruled out collisions.
pub struct FfmpegExtractor {
    ffmpeg: PathBuf,
    /// How long a cancelled process gets to quit before being killed.
    grace: Duration,
}

impl FfmpegExtractor {
    /// Use the ffmpeg binary resolved by ffmpeg-sidecar (a previously
    /// downloaded sidecar binary, or whatever is on the PATH).
    pub fn new() -> Self {
        Self {
            ffmpeg: ffmpeg_sidecar::paths::ffmpeg_path(),
            grace: Duration::from_secs(2),
        }
    }

    /// Use an explicit ffmpeg binary.
    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: path.into(),
            grace: Duration::from_secs(2),
        }
    }

    /// Override the cancellation grace period.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    fn command(&self, request: &ExtractRequest) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-y")
            .args(["-ss", &request.start_sec.to_string()])
            .arg("-i")
            .arg(&request.source)
            .args(["-t", &request.duration_sec.to_string()])
            .args(["-c", "copy"])
            .arg(&request.output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// Ask the process to quit, give it the grace period to comply, then
    /// kill it, and drop whatever partial output it left behind.
    fn terminate(&self, child: &mut Child, output: &std::path::Path) {
        info!(output = %output.display(), "cancelling in-flight extraction");
        if let Some(stdin) = child.stdin.as_mut() {
            // ffmpeg treats `q` on stdin as a quit request.
            let _ = stdin.write_all(b"q");
            let _ = stdin.flush();
        }
        let deadline = Instant::now() + self.grace;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(_) => break,
            }
        }
        if matches!(child.try_wait(), Ok(None)) {
            warn!("transcoder ignored quit request, killing it");
            let _ = child.kill();
        }
        let _ = child.wait();
        if output.exists() {
            match std::fs::remove_file(output) {
                Ok(()) => info!(output = %output.display(), "removed partial output"),
                Err(err) => {
                    warn!(%err, output = %output.display(), "could not remove partial output")
                }
            }
        }
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipExtractor for FfmpegExtractor {
    fn extract(&self, request: &ExtractRequest, cancel: &CancelToken) -> Result<(), ExtractError> {
        info!(
            output = %request.output.display(),
            start_sec = request.start_sec,
            duration_sec = request.duration_sec,
            "extracting clip"
        );
        let mut child = self.command(request).spawn()?;

        // Drain stderr on a side thread so a chatty process cannot block on
        // a full pipe while we wait on it.
        let stderr = child.stderr.take();
        let reader = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut text);
            }
            text
        });

        let status = loop {
            if cancel.is_cancelled() {
                self.terminate(&mut child, &request.output);
                let _ = reader.join();
                return Err(ExtractError::Cancelled);
            }
            match child.try_wait()? {
                Some(status) => break status,
                // No timeout: a hung transcoder blocks until cancelled.
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        let diagnostic = reader.join().unwrap_or_default();
        if status.success() {
            debug!(output = %request.output.display(), "clip extracted");
            Ok(())
        } else {
            Err(ExtractError::Failed {
                status: status.to_string(),
                diagnostic,
            })
        }
    }
}
