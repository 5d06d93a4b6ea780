//! Capture-and-poll core for a live gesture recognition client.
//!
//! A [`camera::CameraBackend`] grants live video; [`DetectionController`]
//! runs the loop that ticks at display cadence, throttles sampling to the
//! configured interval, turns frames into JPEG data URIs, posts them to an
//! inference endpoint and reconciles the responses into a deduplicated
//! gesture reading. The embedding layer polls [`DetectionController::snapshot`]
//! and never touches the loop directly.

pub mod camera;
pub mod config;
pub mod detection;
pub mod inference;
pub mod metrics;
pub mod sampler;
mod utils;

pub use camera::{CameraBackend, CameraError, CaptureSession, FacingMode, VideoSource};
pub use config::CaptureConfig;
pub use detection::{DetectionController, DetectorSnapshot, GestureReading};
pub use inference::{InferenceClient, InferenceError};
pub use metrics::RateMeter;
pub use sampler::{EncodedStill, SamplerConfig};
