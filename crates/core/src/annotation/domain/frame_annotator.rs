use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for marking detections on a frame.
///
/// Implementations draw in-place and report how many regions were drawn.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        regions: &[Region],
    ) -> Result<usize, Box<dyn std::error::Error>>;
}
