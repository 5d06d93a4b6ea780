//! Deterministic synthetic camera for demos and tests.

use image::{Rgb, RgbImage};

use super::{CameraBackend, CameraError, FacingMode, VideoSource};

/// Backend producing a shifting gradient instead of real video. The
/// gradient is asymmetric in x, so mirroring is observable, and it shifts
/// every frame, so consecutive frames differ.
#[derive(Debug, Clone)]
pub struct TestPatternBackend {
    pub width: u32,
    pub height: u32,
    /// Calls that return no frame after opening, mimicking the warm-up
    /// before a real device delivers its first frame.
    pub warmup_frames: u32,
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            warmup_frames: 0,
        }
    }
}

impl CameraBackend for TestPatternBackend {
    fn open(&self, _facing: FacingMode) -> Result<Box<dyn VideoSource>, CameraError> {
        Ok(Box::new(TestPatternSource {
            width: self.width,
            height: self.height,
            warmup: self.warmup_frames,
            frame_idx: 0,
        }))
    }
}

pub struct TestPatternSource {
    width: u32,
    height: u32,
    warmup: u32,
    frame_idx: u64,
}

impl VideoSource for TestPatternSource {
    fn latest_frame(&mut self) -> Option<RgbImage> {
        if self.warmup > 0 {
            self.warmup -= 1;
            return None;
        }
        let shift = (self.frame_idx % 256) as u32;
        self.frame_idx = self.frame_idx.wrapping_add(1);
        Some(RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                (y % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_frames_come_back_empty() {
        let backend = TestPatternBackend {
            width: 8,
            height: 8,
            warmup_frames: 2,
        };
        let mut source = backend.open(FacingMode::Front).unwrap();
        assert!(source.latest_frame().is_none());
        assert!(source.latest_frame().is_none());
        assert!(source.latest_frame().is_some());
    }

    #[test]
    fn consecutive_frames_differ() {
        let mut source = TestPatternBackend::default().open(FacingMode::Front).unwrap();
        let first = source.latest_frame().unwrap();
        let second = source.latest_frame().unwrap();
        assert_ne!(first.as_raw(), second.as_raw());
    }
}
