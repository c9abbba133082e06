//! Shared doubles for the integration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use keyclip_core::{KeyclipError, MediaPlayback};
use keyclip_media::{
    CancelToken, ClipExtractor, ExportCoordinator, ExtractError, ExtractRequest, FrameProber,
    KeyframeLocator, MediaMetadata,
};

/// Install a test-friendly subscriber once per process.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Scripted playback transport: position and length are set by the test.
pub struct ScriptedPlayback {
    pub position_ms: u64,
    pub length_ms: u64,
    playing: bool,
    muted: bool,
}

impl ScriptedPlayback {
    pub fn new() -> Self {
        Self {
            position_ms: 0,
            length_ms: 0,
            playing: false,
            muted: false,
        }
    }
}

impl MediaPlayback for ScriptedPlayback {
    fn position_ms(&self) -> u64 {
        self.position_ms
    }
    fn length_ms(&self) -> u64 {
        self.length_ms
    }
    fn play(&mut self) {
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn is_playing(&self) -> bool {
        self.playing
    }
    fn seek_ms(&mut self, position_ms: u64) {
        self.position_ms = position_ms;
    }
    fn is_muted(&self) -> bool {
        self.muted
    }
    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Prober double returning a fixed keyframe list, or failing on demand.
pub struct StaticProber {
    keyframes: Option<Vec<f64>>,
}

impl StaticProber {
    pub fn with_keyframes(keyframes: Vec<f64>) -> Self {
        Self {
            keyframes: Some(keyframes),
        }
    }

    pub fn failing() -> Self {
        Self { keyframes: None }
    }
}

impl FrameProber for StaticProber {
    fn video_keyframes(&self, _path: &Path) -> keyclip_core::Result<Vec<f64>> {
        match &self.keyframes {
            Some(keyframes) => Ok(keyframes.clone()),
            None => Err(KeyclipError::Probe("ffprobe unavailable".into())),
        }
    }

    fn metadata(&self, _path: &Path) -> keyclip_core::Result<MediaMetadata> {
        Ok(MediaMetadata::default())
    }
}

/// Extractor double: records every request, writes a marker file for each
/// "extracted" clip, and can be told to fail at a given job index.
pub struct RecordingExtractor {
    pub requests: Mutex<Vec<ExtractRequest>>,
    calls: AtomicUsize,
    fail_at: Option<usize>,
}

impl RecordingExtractor {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClipExtractor for RecordingExtractor {
    fn extract(
        &self,
        request: &ExtractRequest,
        _cancel: &CancelToken,
    ) -> Result<(), ExtractError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_at == Some(call) {
            return Err(ExtractError::Failed {
                status: "exit status: 1".into(),
                diagnostic: "Invalid data found when processing input".into(),
            });
        }
        std::fs::write(&request.output, b"clip").expect("write marker output");
        Ok(())
    }
}

/// Coordinator wired with the given keyframes and extractor double.
pub fn coordinator_with(
    keyframes: Vec<f64>,
    extractor: Arc<RecordingExtractor>,
) -> ExportCoordinator {
    let locator = KeyframeLocator::new(Arc::new(StaticProber::with_keyframes(keyframes)));
    ExportCoordinator::new(locator, extractor)
}
