use std::path::Path;

use image::GrayImage;
use opencv::core::{Mat, MatTraitConst, Rect, Size as CvSize, Vector};
use opencv::imgproc;
use opencv::objdetect::{
    self, CascadeClassifier, CascadeClassifierTrait, CascadeClassifierTraitConst,
};

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::detector_loader::DetectorLoader;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Face detector backed by OpenCV's `CascadeClassifier`.
///
/// Reads both the current and the legacy Haar XML layouts. Preprocessing
/// runs through `imgproc` as well, so a frame never leaves OpenCV between
/// color conversion and equalization.
pub struct OpencvCascadeDetector {
    classifier: CascadeClassifier,
    params: DetectionParams,
}

impl OpencvCascadeDetector {
    pub fn new(path: &Path, params: DetectionParams) -> Result<Self, Box<dyn std::error::Error>> {
        params.validate()?;
        let path_str = path
            .to_str()
            .ok_or_else(|| format!("cascade path {} is not valid UTF-8", path.display()))?;
        let classifier = CascadeClassifier::new(path_str)?;
        if classifier.empty()? {
            return Err(format!("OpenCV could not load cascade {}", path.display()).into());
        }
        log::info!("Loaded cascade {} with OpenCV", path.display());
        Ok(Self { classifier, params })
    }
}

fn frame_to_gray_mat(frame: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
    let packed = Mat::from_slice(frame.data())?
        .reshape(frame.channels() as i32, frame.height() as i32)?
        .try_clone()?;
    let code = match frame.channels() {
        1 => return Ok(packed),
        3 => imgproc::COLOR_RGB2GRAY,
        4 => imgproc::COLOR_RGBA2GRAY,
        n => return Err(format!("unsupported channel count {n}").into()),
    };
    let mut gray = Mat::default();
    imgproc::cvt_color_def(&packed, &mut gray, code)?;
    Ok(gray)
}

fn cv_size(width: u32, height: u32) -> CvSize {
    CvSize::new(
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

impl FaceDetector for OpencvCascadeDetector {
    fn prepare(&self, frame: &Frame) -> Result<GrayImage, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(GrayImage::new(0, 0));
        }
        let gray = frame_to_gray_mat(frame)?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized)?;
        let image = GrayImage::from_raw(
            equalized.cols() as u32,
            equalized.rows() as u32,
            equalized.data_bytes()?.to_vec(),
        )
        .ok_or("equalized image has an unexpected size")?;
        Ok(image)
    }

    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if gray.width() == 0 || gray.height() == 0 {
            return Ok(Vec::new());
        }
        let mat = Mat::from_slice(gray.as_raw())?
            .reshape(1, gray.height() as i32)?
            .try_clone()?;

        let min = self.params.min_size;
        let max = self.params.effective_max_size(gray.width(), gray.height());
        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &mat,
            &mut faces,
            self.params.scale_factor,
            i32::try_from(self.params.min_neighbors).unwrap_or(i32::MAX),
            objdetect::CASCADE_SCALE_IMAGE,
            cv_size(min.width, min.height),
            cv_size(max.width, max.height),
        )?;

        Ok(faces
            .iter()
            .map(|r| Region::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

/// Loads cascades through OpenCV.
pub struct OpencvCascadeLoader;

impl DetectorLoader for OpencvCascadeLoader {
    fn load(
        &self,
        path: &Path,
        params: &DetectionParams,
    ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(OpencvCascadeDetector::new(path, params.clone())?))
    }
}
