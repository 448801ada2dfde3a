use image::GrayImage;
use ndarray::Array2;

/// Summed-area tables of pixel values and squared pixel values, plus the
/// 45° rotated table when tilted features need it.
///
/// Upright tables carry a zero first row and column, so entry `[y, x]` holds
/// the sum over all pixels strictly above and left of `(x, y)`. Tilted entry
/// `[y, x]` holds the sum over the upward triangle whose apex is pixel
/// `(x - 1, y - 1)`.
pub struct IntegralImage {
    sum: Array2<i64>,
    sq_sum: Array2<u64>,
    tilted: Option<Array2<i64>>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage, with_tilted: bool) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let mut sum = Array2::<i64>::zeros((h + 1, w + 1));
        let mut sq_sum = Array2::<u64>::zeros((h + 1, w + 1));

        for (y, row) in gray.as_raw().chunks_exact(w.max(1)).take(h).enumerate() {
            let mut row_sum = 0i64;
            let mut row_sq = 0u64;
            for (x, &p) in row.iter().enumerate() {
                row_sum += p as i64;
                row_sq += (p as u64) * (p as u64);
                sum[[y + 1, x + 1]] = sum[[y, x + 1]] + row_sum;
                sq_sum[[y + 1, x + 1]] = sq_sum[[y, x + 1]] + row_sq;
            }
        }

        Self {
            sum,
            sq_sum,
            tilted: with_tilted.then(|| tilted_table(gray)),
        }
    }

    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        let s = &self.sum;
        s[[y + h, x + w]] - s[[y, x + w]] - s[[y + h, x]] + s[[y, x]]
    }

    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        let s = &self.sq_sum;
        s[[y + h, x + w]] + s[[y, x]] - s[[y, x + w]] - s[[y + h, x]]
    }

    /// Sum over the rectangle rotated by 45° whose top corner is `(x, y)`.
    ///
    /// Requires `x >= h`. Zero when the tilted table was not built.
    pub fn tilted_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        let Some(t) = &self.tilted else {
            return 0;
        };
        t[[y, x]] - t[[y + h, x - h]] - t[[y + w, x + w]] + t[[y + w + h, x + w - h]]
    }

    /// `area * stddev` over the rectangle, or 1 for a flat patch.
    ///
    /// Feature responses are divided by this so that detection is
    /// insensitive to window contrast.
    pub fn variance_norm(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let area = (w * h) as f64;
        let sum = self.rect_sum(x, y, w, h) as f64;
        let sq = self.rect_sq_sum(x, y, w, h) as f64;
        let nf = area * sq - sum * sum;
        if nf > 0.0 {
            nf.sqrt()
        } else {
            1.0
        }
    }
}

/// Built from two diagonal accumulations of row prefix sums: one walking
/// up and right, one walking up and left. Their difference row by row is
/// exactly the triangle's span on that row.
fn tilted_table(gray: &GrayImage) -> Array2<i64> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);

    let mut prefix = Array2::<i64>::zeros((h, w + 1));
    for (y, row) in gray.as_raw().chunks_exact(w.max(1)).take(h).enumerate() {
        for (x, &p) in row.iter().enumerate() {
            prefix[[y, x + 1]] = prefix[[y, x]] + p as i64;
        }
    }

    let mut up_right = Array2::<i64>::zeros((h, w + 1));
    let mut up_left = Array2::<i64>::zeros((h, w + 1));
    for y in 0..h {
        for x in 0..=w {
            let above_right = if y > 0 { up_right[[y - 1, (x + 1).min(w)]] } else { 0 };
            let above_left = if y > 0 && x > 0 { up_left[[y - 1, x - 1]] } else { 0 };
            up_right[[y, x]] = prefix[[y, x]] + above_right;
            up_left[[y, x]] = prefix[[y, x]] + above_left;
        }
    }

    let mut tilted = Array2::<i64>::zeros((h + 1, w + 1));
    for y in 1..=h {
        for x in 0..=w {
            let left = if x > 0 { up_left[[y - 1, x - 1]] } else { 0 };
            tilted[[y, x]] = up_right[[y - 1, x]] - left;
        }
    }
    tilted
}
