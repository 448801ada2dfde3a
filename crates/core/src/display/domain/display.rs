use std::time::Duration;

use crate::shared::frame::Frame;

/// A titled on-screen window plus keyboard polling.
pub trait Display: Send {
    /// Shows `frame` in the window named `title`, creating it on first use.
    fn show(&mut self, title: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `timeout` for a key press. `None` blocks until one arrives.
    ///
    /// Returns the key code, or `None` if the wait elapsed without input.
    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<i32>, Box<dyn std::error::Error>>;

    fn destroy_window(&mut self, title: &str) -> Result<(), Box<dyn std::error::Error>>;
}
