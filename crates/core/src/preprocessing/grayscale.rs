use image::{GrayImage, Luma};

use crate::shared::frame::Frame;

// BT.601 weights in 14-bit fixed point.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Converts an RGB(A) frame to single-channel luminance.
///
/// Single-channel frames are copied as-is; alpha is ignored.
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    let pixels = frame.as_ndarray();
    let channels = frame.channels() as usize;
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let (row, col) = (y as usize, x as usize);
        let value = if channels >= 3 {
            luma(
                pixels[[row, col, 0]],
                pixels[[row, col, 1]],
                pixels[[row, col, 2]],
            )
        } else {
            pixels[[row, col, 0]]
        };
        Luma([value])
    })
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    let y = (weighted + (1 << (SHIFT - 1))) >> SHIFT;
    y.min(255) as u8
}
