//! Per-frame image preparation ahead of detection.

pub mod grayscale;
pub mod histogram;
pub mod orientation;

use image::GrayImage;

use crate::shared::frame::Frame;

pub use grayscale::to_grayscale;
pub use histogram::equalize_histogram;
pub use orientation::normalize_orientation;

/// Grayscale conversion followed by histogram equalization.
///
/// Deterministic: the same frame buffer always yields the same image.
pub fn prepare_detection_input(frame: &Frame) -> GrayImage {
    equalize_histogram(&to_grayscale(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 7 % 256) as u8);
                data.push((y * 3 % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        Frame::new(data, w, h, 3, 0)
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let frame = gradient_frame(64, 48);
        let first = prepare_detection_input(&frame);
        let second = prepare_detection_input(&frame);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_prepare_output_matches_frame_dimensions() {
        let frame = gradient_frame(64, 48);
        let gray = prepare_detection_input(&frame);
        assert_eq!(gray.dimensions(), (64, 48));
    }

    #[test]
    fn test_prepare_spreads_to_full_range() {
        let frame = gradient_frame(64, 48);
        let gray = prepare_detection_input(&frame);
        assert_eq!(gray.as_raw().iter().copied().max(), Some(255));
        assert_eq!(gray.as_raw().iter().copied().min(), Some(0));
    }
}
