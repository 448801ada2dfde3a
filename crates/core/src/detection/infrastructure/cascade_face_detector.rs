use std::borrow::Cow;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::detector_loader::DetectorLoader;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::rect_grouper::group_rectangles;
use crate::shared::constants::GROUP_EPS;
use crate::shared::region::Region;

use super::haar_cascade::{CascadeLoadError, HaarCascade};
use super::integral_image::IntegralImage;

/// Multiscale sliding-window face detector over a boosted Haar cascade.
///
/// The image is shrunk by successive powers of the scale factor while the
/// cascade window stays fixed, so every scale reuses one evaluation path.
/// Raw hits are mapped back to frame coordinates and grouped.
pub struct CascadeFaceDetector {
    cascade: HaarCascade,
    params: DetectionParams,
}

impl CascadeFaceDetector {
    /// Fails on parameters the scale search cannot terminate with, such as
    /// a scale factor of 1 or less.
    pub fn new(cascade: HaarCascade, params: DetectionParams) -> Result<Self, CascadeLoadError> {
        params.validate().map_err(CascadeLoadError::InvalidParams)?;
        Ok(Self { cascade, params })
    }

    pub fn from_file(path: &Path, params: DetectionParams) -> Result<Self, CascadeLoadError> {
        params.validate().map_err(CascadeLoadError::InvalidParams)?;
        Self::new(HaarCascade::load(path)?, params)
    }

    /// Scale factors whose window fits the size limits, smallest first.
    pub fn search_scales(&self, image_width: u32, image_height: u32) -> Vec<f64> {
        let (win_w, win_h) = self.cascade.window_size();
        let max = self.params.effective_max_size(image_width, image_height);
        let min = self.params.min_size;

        let mut scales = Vec::new();
        let mut factor = 1.0f64;
        loop {
            let window_w = (win_w as f64 * factor).round() as u32;
            let window_h = (win_h as f64 * factor).round() as u32;
            let scaled_w = (image_width as f64 / factor).round() as u32;
            let scaled_h = (image_height as f64 / factor).round() as u32;

            if scaled_w <= win_w || scaled_h <= win_h {
                break;
            }
            if window_w > max.width || window_h > max.height {
                break;
            }
            if window_w >= min.width && window_h >= min.height {
                scales.push(factor);
            }
            factor *= self.params.scale_factor;
        }
        scales
    }

    fn scan_scale(&self, gray: &GrayImage, factor: f64, hits: &mut Vec<Region>) {
        let (win_w, win_h) = self.cascade.window_size();
        let scaled_w = (gray.width() as f64 / factor).round() as u32;
        let scaled_h = (gray.height() as f64 / factor).round() as u32;

        let scaled: Cow<'_, GrayImage> = if (scaled_w, scaled_h) == gray.dimensions() {
            Cow::Borrowed(gray)
        } else {
            Cow::Owned(imageops::resize(gray, scaled_w, scaled_h, FilterType::Triangle))
        };
        let integral = IntegralImage::new(&scaled, self.cascade.has_tilted());

        let step = if factor > 2.0 { 1 } else { 2 };
        let window_w = (win_w as f64 * factor).round() as i32;
        let window_h = (win_h as f64 * factor).round() as i32;

        for y in (0..(scaled_h - win_h) as usize).step_by(step) {
            for x in (0..(scaled_w - win_w) as usize).step_by(step) {
                if self.cascade.evaluate(&integral, x, y) {
                    hits.push(Region::new(
                        (x as f64 * factor).round() as i32,
                        (y as f64 * factor).round() as i32,
                        window_w,
                        window_h,
                    ));
                }
            }
        }
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let scales = self.search_scales(gray.width(), gray.height());
        let mut hits = Vec::new();
        for &factor in &scales {
            self.scan_scale(gray, factor, &mut hits);
        }
        log::trace!("{} raw hits over {} scales", hits.len(), scales.len());
        Ok(group_rectangles(&hits, self.params.min_neighbors, GROUP_EPS))
    }
}

/// Loads cascades with the built-in evaluator.
pub struct HaarCascadeLoader;

impl DetectorLoader for HaarCascadeLoader {
    fn load(
        &self,
        path: &Path,
        params: &DetectionParams,
    ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(CascadeFaceDetector::from_file(path, params.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_params::Size;
    use image::Luma;
    use rstest::rstest;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/two_band_face.xml");
    const LEGACY_FIXTURE: &str =
        include_str!("../../../tests/fixtures/legacy_two_band_face.xml");

    fn detector(params: DetectionParams) -> CascadeFaceDetector {
        CascadeFaceDetector::new(HaarCascade::parse(FIXTURE).unwrap(), params).unwrap()
    }

    /// Mid-gray background with one bright face block and a dark eye band.
    fn face_scene(w: u32, h: u32, face: Region) -> GrayImage {
        let band_top = face.y + face.height * 3 / 14;
        let band_bottom = face.y + face.height * 3 / 7;
        GrayImage::from_fn(w, h, |x, y| {
            let (x, y) = (x as i32, y as i32);
            let in_face = x >= face.x && x < face.right() && y >= face.y && y < face.bottom();
            let in_band = in_face
                && y >= band_top
                && y < band_bottom
                && x >= face.x + face.width / 8
                && x < face.right() - face.width / 8;
            Luma([match (in_face, in_band) {
                (_, true) => 40,
                (true, false) => 200,
                _ => 120,
            }])
        })
    }

    #[test]
    fn test_search_scales_respect_min_size() {
        // base window 20x24; min 40x48 first fits at 1.3^3 (44x53)
        let d = detector(DetectionParams::default());
        let scales = d.search_scales(320, 240);
        assert!(!scales.is_empty());
        approx::assert_relative_eq!(scales[0], 1.3f64.powi(3), epsilon = 1e-9);
    }

    #[test]
    fn test_search_scales_respect_max_size() {
        let d = detector(DetectionParams {
            max_size: Some(Size::new(60, 72)),
            ..Default::default()
        });
        for factor in d.search_scales(320, 240) {
            assert!((20.0 * factor).round() <= 60.0);
        }
    }

    #[rstest]
    #[case(1.0)]
    #[case(0.9)]
    #[case(f64::NAN)]
    fn test_non_growing_scale_factor_rejected(#[case] scale_factor: f64) {
        let params = DetectionParams {
            scale_factor,
            ..Default::default()
        };
        let result = CascadeFaceDetector::new(HaarCascade::parse(FIXTURE).unwrap(), params);
        assert!(matches!(result, Err(CascadeLoadError::InvalidParams(_))));
    }

    #[test]
    fn test_from_file_checks_params_before_reading() {
        let params = DetectionParams {
            scale_factor: 1.0,
            ..Default::default()
        };
        let result = CascadeFaceDetector::from_file(Path::new("/nonexistent/cascade.xml"), params);
        assert!(matches!(result, Err(CascadeLoadError::InvalidParams(_))));
    }

    #[test]
    fn test_no_scales_for_tiny_image() {
        let d = detector(DetectionParams::default());
        assert!(d.search_scales(30, 30).is_empty());
    }

    #[test]
    fn test_flat_image_has_no_detections() {
        let mut d = detector(DetectionParams::default());
        let gray = GrayImage::from_pixel(320, 240, Luma([128]));
        assert!(d.detect(&gray).unwrap().is_empty());
    }

    #[test]
    fn test_tiny_image_has_no_detections() {
        let mut d = detector(DetectionParams::default());
        let gray = GrayImage::from_pixel(16, 16, Luma([128]));
        assert!(d.detect(&gray).unwrap().is_empty());
    }

    #[test]
    fn test_detects_face_pattern() {
        let face = Region::new(100, 100, 60, 70);
        let mut d = detector(DetectionParams::default());
        let found = d.detect(&face_scene(320, 240, face)).unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().any(|r| r.intersects(&face)));
    }

    #[test]
    fn test_detects_face_pattern_with_legacy_cascade() {
        let face = Region::new(100, 100, 60, 70);
        let cascade = HaarCascade::parse(LEGACY_FIXTURE).unwrap();
        let mut d = CascadeFaceDetector::new(cascade, DetectionParams::default()).unwrap();
        let found = d.detect(&face_scene(320, 240, face)).unwrap();
        assert!(found.iter().any(|r| r.intersects(&face)));
    }

    #[test]
    fn test_loader_builds_working_detector() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, LEGACY_FIXTURE.as_bytes()).unwrap();

        let mut d = HaarCascadeLoader
            .load(file.path(), &DetectionParams::default())
            .unwrap();
        let face = Region::new(100, 100, 60, 70);
        let found = d.detect(&face_scene(320, 240, face)).unwrap();
        assert!(found.iter().any(|r| r.intersects(&face)));
    }

    #[test]
    fn test_raw_hits_without_grouping_stay_near_face() {
        let face = Region::new(100, 100, 60, 70);
        let mut d = detector(DetectionParams {
            min_neighbors: 0,
            ..Default::default()
        });
        let found = d.detect(&face_scene(320, 240, face)).unwrap();
        assert!(!found.is_empty());
        let near_face = Region::new(92, 92, 76, 86);
        assert!(found.iter().all(|r| r.intersects(&near_face)));
    }

    #[test]
    fn test_grouping_reduces_raw_hits() {
        let face = Region::new(100, 100, 60, 70);
        let scene = face_scene(320, 240, face);
        let raw = detector(DetectionParams {
            min_neighbors: 0,
            ..Default::default()
        })
        .detect(&scene)
        .unwrap();
        let grouped = detector(DetectionParams::default()).detect(&scene).unwrap();
        assert!(grouped.len() < raw.len());
    }
}
