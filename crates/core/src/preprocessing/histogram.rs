use image::GrayImage;

/// Spreads intensities over the full 0..=255 range using the cumulative
/// histogram.
///
/// The darkest populated level maps to 0 and the brightest to 255. An image
/// with a single intensity is returned unchanged.
pub fn equalize_histogram(gray: &GrayImage) -> GrayImage {
    let lut = equalization_lut(gray.as_raw());
    let mut out = gray.clone();
    for p in out.iter_mut() {
        *p = lut[*p as usize];
    }
    out
}

fn equalization_lut(pixels: &[u8]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = i as u8;
    }
    if pixels.is_empty() {
        return lut;
    }

    let mut hist = [0u64; 256];
    for &p in pixels {
        hist[p as usize] += 1;
    }
    let total = pixels.len() as u64;

    let first = hist.iter().position(|&c| c > 0).unwrap_or(0);
    if hist[first] == total {
        return lut;
    }

    let scale = 255.0 / (total - hist[first]) as f64;
    let mut sum = 0u64;
    lut[first] = 0;
    for level in (first + 1)..256 {
        sum += hist[level];
        lut[level] = (sum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
