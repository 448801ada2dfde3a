use serde::{Deserialize, Serialize};

use crate::shared::constants::{OUTLINE_THICKNESS, PALETTE};

/// An RGB color, serialized as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// BT.601 luminance, used when drawing onto single-channel frames.
    pub fn luma(&self) -> u8 {
        let y = 0.299 * self.0 as f64 + 0.587 * self.1 as f64 + 0.114 * self.2 as f64;
        y.round().clamp(0.0, 255.0) as u8
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}

/// Ordered, non-empty list of outline colors cycled by detection order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rgb>", into = "Vec<Rgb>")]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, &'static str> {
        if colors.is_empty() {
            return Err("palette must contain at least one color");
        }
        Ok(Self { colors })
    }

    /// Color for the detection at position `index`: `colors[index % len]`.
    pub fn color_for(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: PALETTE.iter().copied().map(Rgb::from).collect(),
        }
    }
}

impl TryFrom<Vec<Rgb>> for Palette {
    type Error = &'static str;

    fn try_from(colors: Vec<Rgb>) -> Result<Self, Self::Error> {
        Palette::new(colors)
    }
}

impl From<Palette> for Vec<Rgb> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

/// How detections are drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub palette: Palette,
    pub thickness: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            thickness: OUTLINE_THICKNESS,
        }
    }
}
