//! Frame sampling: turns the current video frame into a transmissible still.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::camera::VideoSource;

// Set to false to silence encode failure logging
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Per-sample transform settings. The detection loop rebuilds this from
/// the live session on every dispatch instead of storing it, so a facing
/// change can never leave a stale mirror flag behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Cap on the larger output side. `None` keeps the intrinsic size.
    pub max_dimension: Option<u32>,
    /// Undo the front camera's mirrored self-view before transmission.
    pub mirror: bool,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

/// One encoded still, ready for JSON embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStill {
    /// `data:image/jpeg;base64,...` payload.
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Sample the source's current frame. `None` means there is nothing to
/// dispatch this tick, either because no frame has arrived yet or because
/// encoding failed (which is logged).
pub fn sample(source: &mut dyn VideoSource, config: &SamplerConfig) -> Option<EncodedStill> {
    let frame = source.latest_frame()?;
    still_from_frame(&frame, config)
}

/// Transform and encode one frame. The frame itself is never mutated;
/// scaling and mirroring operate on a working copy only.
pub fn still_from_frame(frame: &RgbImage, config: &SamplerConfig) -> Option<EncodedStill> {
    let (src_width, src_height) = frame.dimensions();
    if src_width == 0 || src_height == 0 {
        return None;
    }
    let (width, height) = capped_dimensions(src_width, src_height, config.max_dimension);

    let mut still = if (width, height) == (src_width, src_height) {
        frame.clone()
    } else {
        imageops::resize(frame, width, height, FilterType::Triangle)
    };
    if config.mirror {
        still = imageops::flip_horizontal(&still);
    }

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, config.jpeg_quality);
    if let Err(err) = encoder.encode_image(&still) {
        log_warn!("still encode failed at {}x{}: {err}", width, height);
        return None;
    }

    Some(EncodedStill {
        data_uri: format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)),
        width,
        height,
    })
}

/// Scale both sides down by one factor so the larger side lands exactly on
/// the cap. Frames already inside the cap pass through untouched, as does
/// everything when the cap is `None`. A zero cap is meaningless and is
/// treated as uncapped.
fn capped_dimensions(width: u32, height: u32, max_dimension: Option<u32>) -> (u32, u32) {
    let Some(cap) = max_dimension else {
        return (width, height);
    };
    let larger = width.max(height);
    if cap == 0 || larger <= cap {
        return (width, height);
    }
    let scale = cap as f64 / larger as f64;
    if width >= height {
        (cap, ((height as f64 * scale).round() as u32).max(1))
    } else {
        (((width as f64 * scale).round() as u32).max(1), cap)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn config(max_dimension: Option<u32>, mirror: bool) -> SamplerConfig {
        SamplerConfig {
            max_dimension,
            mirror,
            jpeg_quality: 50,
        }
    }

    fn decode(still: &EncodedStill) -> RgbImage {
        let b64 = still
            .data_uri
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data uri prefix");
        let bytes = STANDARD.decode(b64).expect("base64 payload");
        image::load_from_memory(&bytes).expect("jpeg decodes").to_rgb8()
    }

    /// Left half red, right half blue. Survives JPEG at quality 50 well
    /// enough for channel-dominance checks away from the seam.
    fn half_and_half(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([220, 30, 30])
            } else {
                Rgb([30, 30, 220])
            }
        })
    }

    struct NeverReady;

    impl VideoSource for NeverReady {
        fn latest_frame(&mut self) -> Option<RgbImage> {
            None
        }
    }

    #[test]
    fn cap_scales_the_larger_side_to_the_cap() {
        assert_eq!(capped_dimensions(64, 48, Some(32)), (32, 24));
        assert_eq!(capped_dimensions(48, 64, Some(32)), (24, 32));
        assert_eq!(capped_dimensions(100, 100, Some(50)), (50, 50));
    }

    #[test]
    fn frames_inside_the_cap_pass_through() {
        assert_eq!(capped_dimensions(32, 24, Some(64)), (32, 24));
        assert_eq!(capped_dimensions(32, 24, None), (32, 24));
        assert_eq!(capped_dimensions(32, 24, Some(0)), (32, 24));
    }

    #[test]
    fn extreme_aspect_ratios_never_collapse_to_zero() {
        assert_eq!(capped_dimensions(1000, 1, Some(10)), (10, 1));
        assert_eq!(capped_dimensions(1, 1000, Some(10)), (1, 10));
    }

    #[test]
    fn encoded_still_reports_the_capped_size() {
        let frame = half_and_half(64, 48);
        let still = still_from_frame(&frame, &config(Some(32), false)).unwrap();
        assert_eq!((still.width, still.height), (32, 24));
        let decoded = decode(&still);
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[test]
    fn no_cap_keeps_the_intrinsic_size() {
        let frame = half_and_half(48, 32);
        let still = still_from_frame(&frame, &config(None, false)).unwrap();
        assert_eq!((still.width, still.height), (48, 32));
    }

    #[test]
    fn mirroring_swaps_left_and_right() {
        let frame = half_and_half(32, 32);

        let plain = decode(&still_from_frame(&frame, &config(None, false)).unwrap());
        let left = plain.get_pixel(4, 16);
        assert!(left[0] > left[2], "unmirrored left should stay red: {left:?}");

        let mirrored = decode(&still_from_frame(&frame, &config(None, true)).unwrap());
        let left = mirrored.get_pixel(4, 16);
        let right = mirrored.get_pixel(27, 16);
        assert!(left[2] > left[0], "mirrored left should be blue: {left:?}");
        assert!(right[0] > right[2], "mirrored right should be red: {right:?}");
    }

    #[test]
    fn the_source_frame_is_never_mutated() {
        let frame = half_and_half(32, 32);
        let pristine = frame.clone();

        let first = still_from_frame(&frame, &config(Some(16), true)).unwrap();
        let second = still_from_frame(&frame, &config(Some(16), true)).unwrap();

        assert_eq!(frame, pristine);
        assert_eq!(first, second, "same frame and config must encode identically");
    }

    #[test]
    fn payload_is_a_jpeg_data_uri() {
        let still = still_from_frame(&half_and_half(16, 16), &config(None, false)).unwrap();
        let b64 = still
            .data_uri
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data uri prefix");
        let bytes = STANDARD.decode(b64).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    }

    #[test]
    fn a_source_without_frames_yields_nothing() {
        assert!(sample(&mut NeverReady, &config(None, false)).is_none());
    }
}
