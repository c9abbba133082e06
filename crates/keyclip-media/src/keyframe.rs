//! Keyframe lookup with per-video caching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use keyclip_core::Result;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::probe::FrameProber;

/// Sorted keyframe timestamps for one video, queryable by binary search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyframeIndex {
    timestamps: Vec<f64>,
}

impl KeyframeIndex {
    /// Build an index from prober output. Order is not assumed; the input is
    /// sorted and deduplicated here.
    pub fn from_timestamps(mut timestamps: Vec<f64>) -> Self {
        timestamps.retain(|t| t.is_finite());
        timestamps.sort_by(f64::total_cmp);
        timestamps.dedup();
        Self { timestamps }
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Greatest keyframe at or before `t`.
    pub fn at_or_before(&self, t: f64) -> Option<f64> {
        let idx = self.timestamps.partition_point(|&k| k <= t);
        if idx == 0 {
            None
        } else {
            Some(self.timestamps[idx - 1])
        }
    }

    /// Smallest keyframe strictly after `t`.
    pub fn after(&self, t: f64) -> Option<f64> {
        let idx = self.timestamps.partition_point(|&k| k <= t);
        self.timestamps.get(idx).copied()
    }
}

/// Answers "nearest keyframe at or before / after `t`" for a video file.
///
/// The index is fetched from the prober once per video and kept until a
/// different path is queried. Probe failures degrade to the unsnapped time:
/// a missing keyframe list must never block an export.
pub struct KeyframeLocator {
    prober: Arc<dyn FrameProber>,
    cache: Mutex<Option<(PathBuf, Arc<KeyframeIndex>)>>,
}

impl KeyframeLocator {
    pub fn new(prober: Arc<dyn FrameProber>) -> Self {
        Self {
            prober,
            cache: Mutex::new(None),
        }
    }

    /// Cut point for the start of a range: the latest keyframe at or before
    /// `t`, or the start of the file when no keyframe precedes it.
    pub fn snap_back(&self, path: &Path, t: f64) -> f64 {
        match self.index_for(path) {
            Ok(index) => index.at_or_before(t).unwrap_or(0.0),
            Err(err) => {
                warn!(%err, "keyframe probe failed, using unsnapped start");
                t
            }
        }
    }

    /// Cut point for the end of a range: the earliest keyframe after `t`, or
    /// `t` itself when none follows (the range already reaches the end of
    /// the file).
    pub fn snap_forward(&self, path: &Path, t: f64) -> f64 {
        match self.index_for(path) {
            Ok(index) => index.after(t).unwrap_or(t),
            Err(err) => {
                warn!(%err, "keyframe probe failed, using unsnapped end");
                t
            }
        }
    }

    /// Cached index for `path`, probing on first use or on path change.
    /// Failed probes are not cached, so a transient prober error is retried
    /// on the next query.
    pub fn index_for(&self, path: &Path) -> Result<Arc<KeyframeIndex>> {
        let mut cache = self.cache.lock();
        if let Some((cached_path, index)) = cache.as_ref() {
            if cached_path == path {
                return Ok(Arc::clone(index));
            }
        }
        let timestamps = self.prober.video_keyframes(path)?;
        let index = Arc::new(KeyframeIndex::from_timestamps(timestamps));
        debug!(
            keyframes = index.len(),
            path = %path.display(),
            "keyframe index built"
        );
        *cache = Some((path.to_path_buf(), Arc::clone(&index)));
        Ok(index)
    }
}
