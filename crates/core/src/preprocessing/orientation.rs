use ndarray::Axis;

use crate::shared::frame::{Frame, Origin};

/// Returns the frame with its first row at the top of the image.
///
/// Top-left frames are returned unchanged; bottom-up frames are flipped
/// vertically. The result is always tagged [`Origin::TopLeft`].
pub fn normalize_orientation(frame: Frame) -> Frame {
    match frame.origin() {
        Origin::TopLeft => frame,
        Origin::BottomLeft => flip_vertical(&frame).with_origin(Origin::TopLeft),
    }
}

/// Reverses row order, keeping dimensions, channels and index.
pub fn flip_vertical(frame: &Frame) -> Frame {
    let mut rows = frame.as_ndarray();
    rows.invert_axis(Axis(0));
    let data: Vec<u8> = rows.iter().copied().collect();
    Frame::new(
        data,
        frame.width(),
        frame.height(),
        frame.channels(),
        frame.index(),
    )
    .with_origin(frame.origin())
}
