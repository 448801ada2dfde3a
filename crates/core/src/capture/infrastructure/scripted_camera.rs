use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::capture::domain::camera::Camera;
use crate::shared::frame::Frame;

/// What happened to a [`ScriptedCamera`], shared with the test that owns it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CameraLog {
    pub opened_index: Option<u32>,
    pub queries: usize,
    pub releases: usize,
}

/// In-memory camera that replays a fixed sequence of frames.
///
/// Once the script runs out every query yields `None`, which the loop treats
/// as a failed grab.
pub struct ScriptedCamera {
    frames: VecDeque<Option<Frame>>,
    fail_open: bool,
    fail_after: Option<usize>,
    served: usize,
    log: Arc<Mutex<CameraLog>>,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self::with_script(frames.into_iter().map(Some))
    }

    /// Script entries of `None` simulate dropped grabs at that position.
    pub fn with_script(script: impl IntoIterator<Item = Option<Frame>>) -> Self {
        Self {
            frames: script.into_iter().collect(),
            fail_open: false,
            fail_after: None,
            served: 0,
            log: Arc::new(Mutex::new(CameraLog::default())),
        }
    }

    /// A camera whose `open` always fails.
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::with_script(std::iter::empty())
        }
    }

    /// Every query after the first `n` returns a read error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn log(&self) -> Arc<Mutex<CameraLog>> {
        Arc::clone(&self.log)
    }

    fn record(&self, f: impl FnOnce(&mut CameraLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

impl Camera for ScriptedCamera {
    fn open(&mut self, index: u32) -> Result<(), Box<dyn std::error::Error>> {
        if self.fail_open {
            return Err(format!("camera {index} is not available").into());
        }
        self.record(|log| log.opened_index = Some(index));
        Ok(())
    }

    fn query_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        self.record(|log| log.queries += 1);
        if self.fail_after.is_some_and(|n| self.served >= n) {
            return Err("camera read failed".into());
        }
        self.served += 1;
        Ok(self.frames.pop_front().flatten())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.record(|log| log.releases += 1);
    }
}
