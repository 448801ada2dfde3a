use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::display::domain::display::Display;
use crate::shared::frame::Frame;

/// Everything a [`RecordingDisplay`] was asked to do.
#[derive(Debug, Default, Clone)]
pub struct DisplayLog {
    pub shown: Vec<(String, Frame)>,
    pub key_waits: Vec<Option<Duration>>,
    pub destroyed: Vec<String>,
}

/// Headless display that keeps every shown frame and replays scripted keys.
///
/// Key polls past the end of the script report no key.
pub struct RecordingDisplay {
    keys: VecDeque<Option<i32>>,
    fail_show: bool,
    log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::with_keys(std::iter::empty())
    }

    /// One entry per `wait_key` call; `None` means no key for that poll.
    pub fn with_keys(keys: impl IntoIterator<Item = Option<i32>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            fail_show: false,
            log: Arc::new(Mutex::new(DisplayLog::default())),
        }
    }

    /// A display whose `show` always fails.
    pub fn broken() -> Self {
        Self {
            fail_show: true,
            ..Self::new()
        }
    }

    pub fn log(&self) -> Arc<Mutex<DisplayLog>> {
        Arc::clone(&self.log)
    }
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, title: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.fail_show {
            return Err("display unavailable".into());
        }
        let mut log = self.log.lock().map_err(|e| e.to_string())?;
        log.shown.push((title.to_string(), frame.clone()));
        Ok(())
    }

    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        let mut log = self.log.lock().map_err(|e| e.to_string())?;
        log.key_waits.push(timeout);
        Ok(self.keys.pop_front().flatten())
    }

    fn destroy_window(&mut self, title: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut log = self.log.lock().map_err(|e| e.to_string())?;
        log.destroyed.push(title.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_shown_frames() {
        let mut display = RecordingDisplay::new();
        let frame = Frame::new(vec![1, 2, 3], 1, 1, 3, 7);
        display.show("win", &frame).unwrap();
        let log = display.log();
        let log = log.lock().unwrap();
        assert_eq!(log.shown.len(), 1);
        assert_eq!(log.shown[0].0, "win");
        assert_eq!(log.shown[0].1.index(), 7);
    }

    #[test]
    fn test_replays_keys_then_none() {
        let mut display = RecordingDisplay::with_keys([None, Some(27)]);
        let poll = Some(Duration::from_millis(10));
        assert_eq!(display.wait_key(poll).unwrap(), None);
        assert_eq!(display.wait_key(poll).unwrap(), Some(27));
        assert_eq!(display.wait_key(None).unwrap(), None);
        assert_eq!(
            display.log().lock().unwrap().key_waits,
            vec![poll, poll, None]
        );
    }

    #[test]
    fn test_broken_display_fails_show() {
        let mut display = RecordingDisplay::broken();
        let frame = Frame::new(vec![0; 3], 1, 1, 3, 0);
        assert!(display.show("win", &frame).is_err());
        assert!(display.log().lock().unwrap().shown.is_empty());
    }

    #[test]
    fn test_records_destroyed_windows() {
        let mut display = RecordingDisplay::new();
        display.destroy_window("win").unwrap();
        assert_eq!(display.log().lock().unwrap().destroyed, vec!["win"]);
    }
}
