//! Media probing via ffprobe.
//!
//! Two queries: per-frame keyframe timestamps, which drive cut-point
//! snapping, and stream metadata, which the host application only displays.
//! All text-format assumptions about ffprobe's output live in this module's
//! parsers.

use std::path::{Path, PathBuf};
use std::process::Command;

use keyclip_core::{KeyclipError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of per-frame and stream information for a video file.
///
/// The production implementation shells out to ffprobe; tests substitute
/// canned data.
pub trait FrameProber: Send + Sync {
    /// Keyframe timestamps of the first video stream, in seconds, in
    /// whatever order the prober reported them.
    fn video_keyframes(&self, path: &Path) -> Result<Vec<f64>>;

    /// Container and stream metadata for display.
    fn metadata(&self, path: &Path) -> Result<MediaMetadata>;
}

/// Display metadata for a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Container duration in seconds, if the container reports one.
    pub duration_sec: Option<f64>,
    pub video: Option<VideoStreamInfo>,
    pub audio: Option<AudioStreamInfo>,
}

/// Display information about the first video stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub bit_rate: Option<u64>,
}

/// Display information about the first audio stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub codec: String,
    pub channels: Option<u16>,
    pub sample_rate: Option<u32>,
}

impl MediaMetadata {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// One-line description in the shape the host's log panel shows:
    /// `Video: h264 | Bitrate: 1200 kbps; Audio: aac | Channels: 2 | Sample Rate: 48000 Hz`.
    pub fn summary(&self) -> String {
        let video = match &self.video {
            Some(v) => {
                let bitrate = v
                    .bit_rate
                    .map(|b| (b / 1000).to_string())
                    .unwrap_or_else(|| "?".into());
                format!("Video: {} | Bitrate: {} kbps", v.codec, bitrate)
            }
            None => "Video: none".into(),
        };
        let audio = match &self.audio {
            Some(a) => format!(
                "Audio: {} | Channels: {} | Sample Rate: {} Hz",
                a.codec,
                a.channels.map(|c| c.to_string()).unwrap_or_else(|| "?".into()),
                a.sample_rate.map(|r| r.to_string()).unwrap_or_else(|| "?".into()),
            ),
            None => "Audio: none".into(),
        };
        format!("{video}; {audio}")
    }
}

/// ffprobe-backed prober.
pub struct FfprobeProber {
    ffprobe: PathBuf,
}

impl FfprobeProber {
    /// Use the ffprobe binary resolved by ffmpeg-sidecar (a previously
    /// downloaded sidecar binary, or whatever is on the PATH).
    pub fn new() -> Self {
        Self {
            ffprobe: ffmpeg_sidecar::ffprobe::ffprobe_path(),
        }
    }

    /// Use an explicit ffprobe binary.
    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: path.into(),
        }
    }

    fn run(&self, args: &[&str], path: &Path) -> Result<String> {
        let output = Command::new(&self.ffprobe)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| KeyclipError::Probe(format!("failed to run ffprobe: {e}")))?;
        if !output.status.success() {
            return Err(KeyclipError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| KeyclipError::Probe(format!("ffprobe output was not UTF-8: {e}")))
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProber for FfprobeProber {
    fn video_keyframes(&self, path: &Path) -> Result<Vec<f64>> {
        let stdout = self.run(
            &[
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_frames",
                "-show_entries",
                "frame=key_frame,pts_time",
                "-of",
                "csv=p=0",
            ],
            path,
        )?;
        let timestamps = parse_frame_rows(&stdout);
        debug!(
            keyframes = timestamps.len(),
            path = %path.display(),
            "keyframes probed"
        );
        Ok(timestamps)
    }

    fn metadata(&self, path: &Path) -> Result<MediaMetadata> {
        let stdout = self.run(
            &[
                "-v",
                "error",
                "-show_entries",
                "stream=codec_type,codec_name,width,height,channels,sample_rate,bit_rate:format=duration",
                "-of",
                "json",
            ],
            path,
        )?;
        parse_metadata_json(&stdout)
    }
}

/// Parse ffprobe's CSV frame rows into keyframe timestamps.
///
/// Each row carries the keyframe flag and then the presentation timestamp in
/// seconds: `1,2.002000` (or `frame,1,2.002000` when the section prefix is
/// printed). Rows that do not parse are skipped; a malformed row must not
/// fail the whole query.
pub fn parse_frame_rows(output: &str) -> Vec<f64> {
    let mut timestamps = Vec::new();
    for line in output.lines() {
        let mut fields = line.trim().split(',');
        let mut flag = fields.next();
        if flag == Some("frame") {
            flag = fields.next();
        }
        if flag != Some("1") {
            continue;
        }
        if let Some(pts) = fields.next() {
            if let Ok(t) = pts.trim().parse::<f64>() {
                timestamps.push(t);
            }
        }
    }
    timestamps
}

// Wire shapes of `ffprobe -of json`. Numeric stream fields arrive as JSON
// strings, so everything is parsed leniently and converted after.

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    streams: Vec<StreamEntry>,
    format: Option<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u16>,
    sample_rate: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

/// Parse the JSON document of the metadata query into [`MediaMetadata`].
pub fn parse_metadata_json(output: &str) -> Result<MediaMetadata> {
    let doc: ProbeDocument = serde_json::from_str(output)
        .map_err(|e| KeyclipError::Probe(format!("unparsable ffprobe JSON: {e}")))?;

    let video = doc
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| VideoStreamInfo {
            codec: s.codec_name.clone().unwrap_or_default(),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
            bit_rate: s.bit_rate.as_deref().and_then(|b| b.parse().ok()),
        });

    let audio = doc
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStreamInfo {
            codec: s.codec_name.clone().unwrap_or_default(),
            channels: s.channels,
            sample_rate: s.sample_rate.as_deref().and_then(|r| r.parse().ok()),
        });

    Ok(MediaMetadata {
        duration_sec: doc
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok()),
        video,
        audio,
    })
}
