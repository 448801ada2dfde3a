use crate::shared::frame::Frame;

/// A live frame source addressed by device index.
///
/// Implementations handle driver and codec details; the loop only sees
/// [`Frame`]s tagged with their scanline origin.
pub trait Camera: Send {
    /// Opens the device. Must be called before [`Camera::query_frame`].
    fn open(&mut self, index: u32) -> Result<(), Box<dyn std::error::Error>>;

    /// Grabs the next frame, or `None` when the device produced nothing.
    fn query_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device. Safe to call more than once.
    fn release(&mut self);
}
