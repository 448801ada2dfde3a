pub mod live_detection_use_case;
pub mod outcome;
pub mod pipeline_logger;
pub mod session;
