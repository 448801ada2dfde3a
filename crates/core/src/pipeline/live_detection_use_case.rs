use std::time::{Duration, Instant};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::capture::domain::camera::Camera;
use crate::detection::domain::face_detector::FaceDetector;
use crate::display::domain::display::Display;
use crate::pipeline::outcome::Outcome;
use crate::pipeline::pipeline_logger::{PipelineLogger, Stage};
use crate::preprocessing::normalize_orientation;
use crate::shared::config::AppConfig;
use crate::shared::frame::Frame;

/// Loop-level knobs taken from [`AppConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoopSettings {
    pub camera_index: u32,
    pub window_title: String,
    pub key_poll: Duration,
    pub hold_on_capture_failure: bool,
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            camera_index: config.camera_index,
            window_title: config.window_title.clone(),
            key_poll: Duration::from_millis(config.key_poll_ms),
            hold_on_capture_failure: config.hold_on_capture_failure,
        }
    }
}

/// Capture, detect, draw and show, one frame at a time, until a key press or
/// a failed grab.
///
/// Owns the camera and window for the whole session and releases both once,
/// whatever ends the loop.
pub struct LiveDetectionUseCase {
    camera: Box<dyn Camera>,
    display: Box<dyn Display>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
    settings: LoopSettings,
    frames: usize,
}

impl LiveDetectionUseCase {
    pub fn new(
        camera: Box<dyn Camera>,
        display: Box<dyn Display>,
        detector: Box<dyn FaceDetector>,
        annotator: Box<dyn FrameAnnotator>,
        logger: Box<dyn PipelineLogger>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            camera,
            display,
            detector,
            annotator,
            logger,
            settings,
            frames: 0,
        }
    }

    /// Frames fully processed so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Runs one loop iteration against an already opened camera.
    ///
    /// Errors come from the detector, annotator or display; a missing or
    /// unreadable frame is not an error but [`Outcome::CaptureFailed`].
    pub fn step(&mut self) -> Result<Outcome, Box<dyn std::error::Error>> {
        let t0 = Instant::now();
        let Some(frame) = self.grab() else {
            return Ok(Outcome::CaptureFailed);
        };
        let t1 = Instant::now();

        let mut frame = normalize_orientation(frame);
        let gray = self.detector.prepare(&frame)?;
        let t2 = Instant::now();

        let faces = self.detector.detect(&gray)?;
        let t3 = Instant::now();

        self.annotator.annotate(&mut frame, &faces)?;
        self.display.show(&self.settings.window_title, &frame)?;
        let t4 = Instant::now();

        self.logger.timing(Stage::Capture, ms(t1 - t0));
        self.logger.timing(Stage::Preprocess, ms(t2 - t1));
        self.logger.timing(Stage::Detect, ms(t3 - t2));
        self.logger.timing(Stage::Render, ms(t4 - t3));
        self.logger.metric("faces", faces.len() as f64);
        self.frames += 1;
        self.logger.progress(self.frames);

        match self.display.wait_key(Some(self.settings.key_poll))? {
            Some(key) => {
                log::debug!("Key {key} pressed");
                Ok(Outcome::StopRequested)
            }
            None => Ok(Outcome::Continue),
        }
    }

    /// Opens the camera, loops until a terminal outcome and releases
    /// everything.
    pub fn run(mut self) -> Outcome {
        if let Err(e) = self.camera.open(self.settings.camera_index) {
            return Outcome::DeviceUnavailable(format!(
                "camera {}: {e}",
                self.settings.camera_index
            ));
        }
        self.logger.info(&format!(
            "Camera {} opened, press any key in \"{}\" to stop",
            self.settings.camera_index, self.settings.window_title
        ));

        let outcome = loop {
            match self.step() {
                Ok(outcome) if outcome.is_terminal() => break outcome,
                Ok(_) => {}
                Err(e) => break Outcome::BackendFailed(e.to_string()),
            }
        };

        if outcome == Outcome::CaptureFailed && self.settings.hold_on_capture_failure {
            if let Err(e) = self.display.wait_key(None) {
                log::warn!("Key wait failed: {e}");
            }
        }

        self.release();
        self.logger.summary();
        outcome
    }

    fn grab(&mut self) -> Option<Frame> {
        match self.camera.query_frame() {
            Ok(Some(frame)) if !frame.is_empty() => Some(frame),
            Ok(_) => {
                log::error!("Unable to capture frame");
                None
            }
            Err(e) => {
                log::error!("Unable to capture frame: {e}");
                None
            }
        }
    }

    fn release(&mut self) {
        self.camera.release();
        if let Err(e) = self.display.destroy_window(&self.settings.window_title) {
            log::warn!("Failed to destroy window: {e}");
        }
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
