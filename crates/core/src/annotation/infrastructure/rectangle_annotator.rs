use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::annotation::domain::palette::{Palette, RenderStyle, Rgb};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Draws a thick rectangle outline around each region.
///
/// The outline runs from `(x, y)` to `(x + width, y + height)` inclusive and
/// is centered on those edges, so a thickness of 3 covers one pixel on each
/// side. Pixels outside the frame are clipped.
pub struct RectangleAnnotator {
    palette: Palette,
    thickness: u32,
}

impl RectangleAnnotator {
    pub fn new(palette: Palette, thickness: u32) -> Self {
        Self {
            palette,
            thickness: thickness.max(1),
        }
    }

    pub fn from_style(style: &RenderStyle) -> Self {
        Self::new(style.palette.clone(), style.thickness)
    }
}

impl Default for RectangleAnnotator {
    fn default() -> Self {
        Self::from_style(&RenderStyle::default())
    }
}

impl FrameAnnotator for RectangleAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        regions: &[Region],
    ) -> Result<usize, Box<dyn std::error::Error>> {
        if !matches!(frame.channels(), 1 | 3 | 4) {
            return Err(format!("cannot draw on a {}-channel frame", frame.channels()).into());
        }
        for (i, region) in regions.iter().enumerate() {
            draw_outline(frame, region, self.palette.color_for(i), self.thickness);
        }
        Ok(regions.len())
    }
}

fn draw_outline(frame: &mut Frame, region: &Region, color: Rgb, thickness: u32) {
    let fw = frame.width() as i64;
    let fh = frame.height() as i64;
    if fw == 0 || fh == 0 {
        return;
    }
    let half = (thickness / 2) as i64;

    let (x1, y1) = (region.x as i64, region.y as i64);
    let (x2, y2) = (region.right() as i64, region.bottom() as i64);

    let ox1 = (x1 - half).max(0);
    let oy1 = (y1 - half).max(0);
    let ox2 = (x2 + half).min(fw - 1);
    let oy2 = (y2 + half).min(fh - 1);
    if ox1 > ox2 || oy1 > oy2 {
        return;
    }

    let mut pixels = frame.as_ndarray_mut();
    let channels = pixels.shape()[2];
    for py in oy1..=oy2 {
        let inner_row = py > y1 + half && py < y2 - half;
        for px in ox1..=ox2 {
            let inner_col = px > x1 + half && px < x2 - half;
            if inner_row && inner_col {
                continue;
            }
            let (row, col) = (py as usize, px as usize);
            match channels {
                1 => pixels[[row, col, 0]] = color.luma(),
                3 | 4 => {
                    pixels[[row, col, 0]] = color.0;
                    pixels[[row, col, 1]] = color.1;
                    pixels[[row, col, 2]] = color.2;
                }
                _ => {}
            }
        }
    }
}
