//! Binary dilation with the 4-connected cross structuring element.

use common::bit_buffer2::BitBuffer2;

/// Dilate `mask` once with the 3x3 cross (center plus 4 neighbors).
///
/// Pixels outside the image are treated as background, so the result never
/// grows past the mask's frame.
pub fn dilate_cross(mask: &BitBuffer2) -> BitBuffer2 {
    let width = mask.width();
    let height = mask.height();
    BitBuffer2::from_fn(width, height, |x, y| {
        let (xi, yi) = (x as i64, y as i64);
        mask.get_xy(x, y)
            || mask.get_or_false(xi - 1, yi)
            || mask.get_or_false(xi + 1, yi)
            || mask.get_or_false(xi, yi - 1)
            || mask.get_or_false(xi, yi + 1)
    })
}

/// Apply [`dilate_cross`] `iterations` times.
pub fn dilate_cross_n(mask: &BitBuffer2, iterations: usize) -> BitBuffer2 {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate_cross(&out);
    }
    out
}

/// Foreground pixels with at least one 4-neighbor in the background
/// (outside the frame counts as background).
pub fn inner_boundary(mask: &BitBuffer2) -> BitBuffer2 {
    BitBuffer2::from_fn(mask.width(), mask.height(), |x, y| {
        if !mask.get_xy(x, y) {
            return false;
        }
        let (xi, yi) = (x as i64, y as i64);
        !(mask.get_or_false(xi - 1, yi)
            && mask.get_or_false(xi + 1, yi)
            && mask.get_or_false(xi, yi - 1)
            && mask.get_or_false(xi, yi + 1))
    })
}
