use std::collections::HashSet;
use std::time::Duration;

use opencv::core::{Mat, MatTraitConst};
use opencv::{highgui, imgproc};

use crate::display::domain::display::Display;
use crate::shared::frame::Frame;

/// OpenCV HighGUI window. Frames are converted from RGB to BGR on the way in.
#[derive(Default)]
pub struct HighguiDisplay {
    windows: HashSet<String>,
}

impl HighguiDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_mat(frame: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
        let packed = Mat::from_slice(frame.data())?
            .reshape(frame.channels() as i32, frame.height() as i32)?
            .try_clone()?;
        if frame.channels() != 3 {
            return Ok(packed);
        }
        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&packed, &mut bgr, imgproc::COLOR_RGB2BGR)?;
        Ok(bgr)
    }
}

/// HighGUI delay for a timeout. 0 blocks, so a zero timeout is rounded up
/// to 1ms and long timeouts saturate.
fn delay_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        Some(t) => i32::try_from(t.as_millis()).unwrap_or(i32::MAX).max(1),
        None => 0,
    }
}

impl Display for HighguiDisplay {
    fn show(&mut self, title: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !self.windows.contains(title) {
            highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
            self.windows.insert(title.to_string());
        }
        highgui::imshow(title, &Self::to_mat(frame)?)?;
        Ok(())
    }

    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        let key = highgui::wait_key(delay_ms(timeout))?;
        Ok((key >= 0).then_some(key))
    }

    fn destroy_window(&mut self, title: &str) -> Result<(), Box<dyn std::error::Error>> {
        if self.windows.remove(title) {
            highgui::destroy_window(title)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0)]
    #[case(Some(Duration::ZERO), 1)]
    #[case(Some(Duration::from_millis(10)), 10)]
    #[case(Some(Duration::from_secs(3_000_000)), i32::MAX)]
    #[case(Some(Duration::MAX), i32::MAX)]
    fn test_delay_ms(#[case] timeout: Option<Duration>, #[case] expected: i32) {
        assert_eq!(delay_ms(timeout), expected);
    }
}
