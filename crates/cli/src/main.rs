use std::process;

use facecam_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
use facecam_core::detection::infrastructure::opencv_cascade_detector::OpencvCascadeLoader;
use facecam_core::display::infrastructure::highgui_display::HighguiDisplay;
use facecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facecam_core::pipeline::session::run_session;
use facecam_core::shared::config::AppConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    log::debug!("Using cascade {}", config.cascade_path.display());

    let outcome = run_session(
        &config,
        &OpencvCascadeLoader,
        Box::new(FfmpegCamera::new()),
        Box::new(HighguiDisplay::new()),
        Box::new(StdoutPipelineLogger::default()),
    );
    log::info!("Session ended: {outcome:?}");
    process::exit(outcome.dispatch());
}
