use image::GrayImage;

use crate::preprocessing::prepare_detection_input;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face detection over a prepared grayscale image.
///
/// Regions come back in the detector's own order; callers must not
/// assume any sorting.
pub trait FaceDetector: Send {
    /// Turns an upright frame into this detector's input: grayscale, then
    /// histogram equalization.
    fn prepare(&self, frame: &Frame) -> Result<GrayImage, Box<dyn std::error::Error>> {
        Ok(prepare_detection_input(frame))
    }

    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
