//! Camera lifecycle: facing modes, the backend seam, and capture sessions.
//!
//! A [`CameraBackend`] hands out live [`VideoSource`]s; a [`CaptureSession`]
//! wraps exactly one granted source together with its identity. Acquisition
//! is fallible (permission prompts, missing devices), so callers treat
//! [`CameraError`] as an expected outcome, not a fault.

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod test_pattern;

// Set to false to silence session lifecycle logging
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Which physical camera supplies the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    Front,
    Rear,
}

impl Default for FacingMode {
    fn default() -> Self {
        FacingMode::Front
    }
}

impl FacingMode {
    /// Constraint name on the media-capture wire.
    pub fn constraint_name(self) -> &'static str {
        match self {
            FacingMode::Front => "user",
            FacingMode::Rear => "environment",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    /// Front cameras deliver a mirrored self-view; that mirroring must be
    /// undone before a frame leaves the device.
    pub fn mirrors_preview(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

/// Why a camera could not be acquired or kept running.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available for facing mode \"{}\"", .0.constraint_name())]
    NoDevice(FacingMode),
    #[error("video playback failed to start: {0}")]
    PlaybackFailed(String),
}

/// Live video producer for one granted stream.
pub trait VideoSource: Send {
    /// Most recent decoded frame, or `None` before the first frame arrives.
    fn latest_frame(&mut self) -> Option<RgbImage>;
}

/// Seam to the platform camera API. Implementations hold whatever device
/// handles they need; the detection side only ever sees trait objects.
pub trait CameraBackend: Send + Sync {
    fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoSource>, CameraError>;
}

/// One acquired camera stream.
///
/// The session owns its source; dropping the session stops the stream. The
/// detection controller keeps at most one session alive at a time by
/// owning at most one worker, and the worker owns the session.
pub struct CaptureSession {
    id: String,
    facing: FacingMode,
    started_at: DateTime<Utc>,
    source: Box<dyn VideoSource>,
}

impl CaptureSession {
    /// Request a stream constrained to `facing`. On grant the source is
    /// live and playback has started.
    pub fn acquire(backend: &dyn CameraBackend, facing: FacingMode) -> Result<Self, CameraError> {
        let source = backend.open(facing)?;
        let session = Self {
            id: Uuid::new_v4().to_string(),
            facing,
            started_at: Utc::now(),
            source,
        };
        log_info!(
            "camera session {} acquired ({})",
            session.id,
            facing.constraint_name()
        );
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn source_mut(&mut self) -> &mut dyn VideoSource {
        self.source.as_mut()
    }

    /// Stop the stream. Dropping the session has the same effect; this
    /// form exists for explicit teardown paths and logs the release.
    pub fn release(self) {
        log_info!("camera session {} released", self.id);
    }
}
