//! Synthetic masks for unit tests.

#![allow(dead_code)]

use common::bit_buffer2::BitBuffer2;

/// Builds a mask from rows of text, `#` is foreground, anything else is
/// background. All rows must have the same length.
pub fn mask_from_ascii(rows: &[&str]) -> BitBuffer2 {
    let height = rows.len();
    let width = rows.first().map_or(0, |r| r.len());
    assert!(
        rows.iter().all(|r| r.len() == width),
        "all rows must have the same length"
    );
    BitBuffer2::from_fn(width, height, |x, y| rows[y].as_bytes()[x] == b'#')
}

/// Filled disk of radius `r` centered on `(cx, cy)`.
pub fn disk(width: usize, height: usize, cx: f64, cy: f64, r: f64) -> BitBuffer2 {
    BitBuffer2::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        dx * dx + dy * dy <= r * r
    })
}

/// Filled rectangle `[x0, x1) x [y0, y1)`.
pub fn rect(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> BitBuffer2 {
    BitBuffer2::from_fn(width, height, |x, y| x >= x0 && x < x1 && y >= y0 && y < y1)
}

/// Pixel-wise OR of two masks of the same shape.
pub fn union(a: &BitBuffer2, b: &BitBuffer2) -> BitBuffer2 {
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    BitBuffer2::from_fn(a.width(), a.height(), |x, y| a.get_xy(x, y) || b.get_xy(x, y))
}
