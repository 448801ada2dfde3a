use crate::annotation::infrastructure::rectangle_annotator::RectangleAnnotator;
use crate::capture::domain::camera::Camera;
use crate::detection::domain::detector_loader::DetectorLoader;
use crate::display::domain::display::Display;
use crate::pipeline::live_detection_use_case::{LiveDetectionUseCase, LoopSettings};
use crate::pipeline::outcome::Outcome;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::config::AppConfig;

/// Builds a detection session from `config` and runs it to completion.
///
/// The configuration and cascade are checked before the camera is touched,
/// so a bad setup never acquires the device.
pub fn run_session(
    config: &AppConfig,
    loader: &dyn DetectorLoader,
    camera: Box<dyn Camera>,
    display: Box<dyn Display>,
    logger: Box<dyn PipelineLogger>,
) -> Outcome {
    if let Err(e) = config.validate() {
        return Outcome::ConfigError(e.to_string());
    }

    let detector = match loader.load(&config.cascade_path, &config.detection) {
        Ok(detector) => detector,
        Err(e) => return Outcome::ConfigError(e.to_string()),
    };

    LiveDetectionUseCase::new(
        camera,
        display,
        detector,
        Box::new(RectangleAnnotator::from_style(&config.render)),
        logger,
        LoopSettings::from_config(config),
    )
    .run()
}
