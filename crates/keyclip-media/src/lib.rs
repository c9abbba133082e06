//! KeyClip Media - FFmpeg integration for probing and lossless extraction
//!
//! This crate handles:
//! - Keyframe and stream-metadata probing via ffprobe
//! - Keyframe-snapped cut-point lookup with per-video caching
//! - Stream-copy clip extraction via ffmpeg, with cancellation
//! - The export coordinator that runs one extraction job per segment

pub mod export;
pub mod extract;
pub mod keyframe;
pub mod probe;

pub use export::{
    clip_output_path, ExportCoordinator, ExportError, ExportJob, ExportOutcome, ExportPlan,
    ExportProgress, ExportRun, RunState,
};
pub use extract::{CancelToken, ClipExtractor, ExtractError, ExtractRequest, FfmpegExtractor};
pub use keyframe::{KeyframeIndex, KeyframeLocator};
pub use probe::{AudioStreamInfo, FfprobeProber, FrameProber, MediaMetadata, VideoStreamInfo};
