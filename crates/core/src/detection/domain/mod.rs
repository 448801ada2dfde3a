pub mod detection_params;
pub mod detector_loader;
pub mod face_detector;
pub mod rect_grouper;
