use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::FacingMode;

/// Tunables for the capture-and-poll loop.
///
/// The library never reads files or the environment; embedders build this
/// directly or deserialize it from their own settings store. Every field
/// has a default, so partial JSON like `{"endpoint": "..."}` works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Inference endpoint accepting `{"image": <data URI>}` POSTs.
    pub endpoint: String,
    /// Scheduler tick period, the stand-in for one rendered preview frame.
    pub tick_interval_ms: u64,
    /// Minimum spacing between dispatched samples.
    pub sample_interval_ms: u64,
    /// Rolling window over which the tick rate is published.
    pub rate_window_ms: u64,
    /// Per-request timeout for inference calls.
    pub request_timeout_ms: u64,
    /// Cap on the larger side of the encoded still. `None` transmits at
    /// intrinsic camera resolution.
    pub max_dimension: Option<u32>,
    /// JPEG quality on the encoder's 1-100 scale.
    pub jpeg_quality: u8,
    /// Camera to acquire when the loop starts.
    pub facing: FacingMode,
    /// Whether sampling is armed as soon as the loop starts.
    pub detection_enabled: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict".to_string(),
            tick_interval_ms: 16,
            sample_interval_ms: 1000,
            rate_window_ms: 1500,
            request_timeout_ms: 10_000,
            max_dimension: None,
            jpeg_quality: 50,
            facing: FacingMode::Front,
            detection_enabled: true,
        }
    }
}

impl CaptureConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = CaptureConfig::default();
        assert!(!config.endpoint.is_empty());
        assert!(config.tick_interval_ms > 0);
        assert!(config.sample_interval_ms >= config.tick_interval_ms);
        assert!((1..=100).contains(&config.jpeg_quality));
        assert!(config.detection_enabled);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{"endpoint": "http://example.test/predict", "jpeg_quality": 80}"#)
                .unwrap();
        assert_eq!(config.endpoint, "http://example.test/predict");
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.sample_interval_ms, CaptureConfig::default().sample_interval_ms);
        assert_eq!(config.facing, FacingMode::Front);
    }
}
