use serde::{Deserialize, Serialize};

use crate::shared::constants::{MIN_FACE_SIZE, MIN_NEIGHBORS, SCALE_FACTOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Multiscale search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Ratio between successive search scales; must be > 1.
    pub scale_factor: f64,
    /// A candidate survives grouping only with more than this many raw hits.
    pub min_neighbors: u32,
    pub min_size: Size,
    /// `None` bounds the search by the frame itself.
    pub max_size: Option<Size>,
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.scale_factor.is_nan() || self.scale_factor <= 1.0 {
            return Err(format!(
                "scale factor must be greater than 1.0, got {}",
                self.scale_factor
            ));
        }
        if self.min_size.width == 0 || self.min_size.height == 0 {
            return Err("minimum object size must be non-zero".to_string());
        }
        if let Some(max) = self.max_size {
            if max.width < self.min_size.width || max.height < self.min_size.height {
                return Err(format!(
                    "maximum object size {}x{} is smaller than minimum {}x{}",
                    max.width, max.height, self.min_size.width, self.min_size.height
                ));
            }
        }
        Ok(())
    }

    /// Upper size bound for an image of the given dimensions.
    pub fn effective_max_size(&self, image_width: u32, image_height: u32) -> Size {
        self.max_size.unwrap_or(Size::new(image_width, image_height))
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: SCALE_FACTOR,
            min_neighbors: MIN_NEIGHBORS,
            min_size: Size::new(MIN_FACE_SIZE.0, MIN_FACE_SIZE.1),
            max_size: None,
        }
    }
}
