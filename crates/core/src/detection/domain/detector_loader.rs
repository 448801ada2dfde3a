use std::path::Path;

use super::detection_params::DetectionParams;
use super::face_detector::FaceDetector;

/// Builds a ready detector from a cascade artifact on disk.
pub trait DetectorLoader {
    fn load(
        &self,
        path: &Path,
        params: &DetectionParams,
    ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>>;
}
