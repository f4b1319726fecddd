//! Per-region shape primitives operating on a region image cropped to its
//! bounding box.

use std::collections::VecDeque;

use common::bit_buffer2::BitBuffer2;
use glam::DVec2;

use crate::math::{convex_hull, point_in_convex_polygon};
use crate::morphology::inner_boundary;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Tolerance for pixel centers lying on a hull edge.
const HULL_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Perimeter
// ============================================================================

/// Boundary length of the region, weighting each boundary pixel by how its
/// boundary neighbors are arranged.
///
/// Boundary pixels are foreground pixels with a background 4-neighbor. Each one
/// is coded as `1 + 2 * (boundary 4-neighbors) + 10 * (boundary diagonal
/// neighbors)`; straight runs contribute 1, diagonal steps √2 and corners
/// (1 + √2) / 2. Isolated pixels contribute nothing.
pub fn perimeter(image: &BitBuffer2) -> f64 {
    let border = inner_boundary(image);
    let mut total = 0.0;

    for (x, y) in border.iter_ones() {
        let (xi, yi) = (x as i64, y as i64);
        let straight = [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .iter()
            .filter(|(dx, dy)| border.get_or_false(xi + dx, yi + dy))
            .count();
        let diagonal = [(-1, -1), (1, -1), (-1, 1), (1, 1)]
            .iter()
            .filter(|(dx, dy)| border.get_or_false(xi + dx, yi + dy))
            .count();
        total += perimeter_weight(1 + 2 * straight + 10 * diagonal);
    }

    total
}

fn perimeter_weight(code: usize) -> f64 {
    match code {
        5 | 7 | 15 | 17 | 25 | 27 => 1.0,
        21 | 33 => SQRT_2,
        13 | 23 => (1.0 + SQRT_2) / 2.0,
        _ => 0.0,
    }
}

// ============================================================================
// Hole filling
// ============================================================================

/// Region with its holes filled. A hole is background that cannot reach the
/// frame through 4-connected background pixels.
pub fn fill_holes(image: &BitBuffer2) -> BitBuffer2 {
    let width = image.width();
    let height = image.height();
    if image.is_empty() {
        return image.clone();
    }

    // Outside-reachable background, flooded from every frame pixel.
    let mut outside = BitBuffer2::new_default(width, height);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    let seed = |x: usize, y: usize, outside: &mut BitBuffer2, queue: &mut VecDeque<(usize, usize)>| {
        if !image.get_xy(x, y) && !outside.get_xy(x, y) {
            outside.set_xy(x, y, true);
            queue.push_back((x, y));
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, height - 1, &mut outside, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        seed(width - 1, y, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx < width && ny < height {
                seed(nx, ny, &mut outside, &mut queue);
            }
        }
    }

    outside.not()
}

// ============================================================================
// Convex hull image
// ============================================================================

/// Pixels whose centers lie inside or on the convex hull of the region.
///
/// The hull is built from the four edge midpoints of every pixel, so thin
/// regions still get a hull with positive area. Only the leftmost and
/// rightmost pixel of each row can contribute hull vertices.
pub fn convex_image(image: &BitBuffer2) -> BitBuffer2 {
    let width = image.width();
    let height = image.height();

    let mut points = Vec::with_capacity(height * 8);
    for y in 0..height {
        let Some(x_min) = (0..width).find(|&x| image.get_xy(x, y)) else {
            continue;
        };
        let x_max = (0..width).rev().find(|&x| image.get_xy(x, y)).unwrap_or(x_min);
        for x in [x_min, x_max] {
            let c = DVec2::new(x as f64, y as f64);
            points.push(c + DVec2::new(-0.5, 0.0));
            points.push(c + DVec2::new(0.5, 0.0));
            points.push(c + DVec2::new(0.0, -0.5));
            points.push(c + DVec2::new(0.0, 0.5));
        }
    }

    let hull = convex_hull(&points);
    BitBuffer2::from_fn(width, height, |x, y| {
        image.get_xy(x, y)
            || point_in_convex_polygon(&hull, DVec2::new(x as f64, y as f64), HULL_TOLERANCE)
    })
}

// ============================================================================
// Second moments
// ============================================================================

/// Ellipse with the same normalized second central moments as the region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseFit {
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    pub eccentricity: f64,
}

/// Fits the moment ellipse to a set of pixel coordinates.
pub fn ellipse_fit(pixels: &[(usize, usize)]) -> EllipseFit {
    let n = pixels.len() as f64;
    if pixels.is_empty() {
        return EllipseFit {
            major_axis_length: 0.0,
            minor_axis_length: 0.0,
            eccentricity: 0.0,
        };
    }

    let (sx, sy) = pixels
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
    let (mx, my) = (sx / n, sy / n);

    let (mut vxx, mut vyy, mut vxy) = (0.0, 0.0, 0.0);
    for &(x, y) in pixels {
        let dx = x as f64 - mx;
        let dy = y as f64 - my;
        vxx += dx * dx;
        vyy += dy * dy;
        vxy += dx * dy;
    }
    vxx /= n;
    vyy /= n;
    vxy /= n;

    // Eigenvalues of the symmetric inertia tensor, clamped against round-off.
    let mean = (vxx + vyy) / 2.0;
    let spread = (((vxx - vyy) / 2.0).powi(2) + vxy * vxy).sqrt();
    let l1 = (mean + spread).max(0.0);
    let l2 = (mean - spread).max(0.0);

    let eccentricity = if l1 == 0.0 {
        0.0
    } else {
        (1.0 - l2 / l1).max(0.0).sqrt()
    };

    EllipseFit {
        major_axis_length: 4.0 * l1.sqrt(),
        minor_axis_length: 4.0 * l2.sqrt(),
        eccentricity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mask_from_ascii;

    #[test]
    fn test_perimeter_single_pixel_is_zero() {
        assert_eq!(perimeter(&mask_from_ascii(&["#"])), 0.0);
    }

    #[test]
    fn test_perimeter_2x2_square() {
        assert!((perimeter(&mask_from_ascii(&["##", "##"])) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_perimeter_3x3_square() {
        // All eight ring pixels are straight steps; the center is interior.
        let p = perimeter(&mask_from_ascii(&["###", "###", "###"]));
        assert!((p - 8.0).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_perimeter_diagonal_line() {
        // Only the middle pixel has two diagonal neighbors (code 21).
        let p = perimeter(&mask_from_ascii(&["#..", ".#.", "..#"]));
        assert!((p - SQRT_2).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_perimeter_horizontal_line() {
        // End pixels code 3 (weight 0), interior pixels code 5.
        let p = perimeter(&mask_from_ascii(&["#####"]));
        assert!((p - 3.0).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_fill_holes_ring() {
        let ring = mask_from_ascii(&["###", "#.#", "###"]);
        let filled = fill_holes(&ring);
        assert_eq!(filled.count_ones(), 9);
    }

    #[test]
    fn test_fill_holes_keeps_open_notch() {
        let notch = mask_from_ascii(&["#.#", "#.#", "###"]);
        assert_eq!(fill_holes(&notch), notch);
    }

    #[test]
    fn test_fill_holes_diagonal_gap_still_a_hole() {
        // Background only touches the outside diagonally.
        let shape = mask_from_ascii(&[
            ".###", //
            "#..#",
            "#..#",
            "####",
        ]);
        assert_eq!(fill_holes(&shape).count_ones(), 15);
    }

    #[test]
    fn test_convex_image_of_square_is_itself() {
        let square = mask_from_ascii(&["##", "##"]);
        assert_eq!(convex_image(&square), square);
    }

    #[test]
    fn test_convex_image_fills_l_shape() {
        let l = mask_from_ascii(&["#..", "#..", "###"]);
        let hull = convex_image(&l);
        // The hull through the midpoints covers the diagonal pixel (1, 1) but
        // not the far corner (2, 0).
        assert!(hull.get_xy(1, 1));
        assert!(!hull.get_xy(2, 0));
        assert_eq!(hull.count_ones(), 6);
    }

    #[test]
    fn test_convex_image_single_pixel() {
        let one = mask_from_ascii(&["#"]);
        assert_eq!(convex_image(&one).count_ones(), 1);
    }

    #[test]
    fn test_ellipse_fit_single_pixel() {
        let fit = ellipse_fit(&[(3, 3)]);
        assert_eq!(fit.eccentricity, 0.0);
        assert_eq!(fit.minor_axis_length, 0.0);
    }

    #[test]
    fn test_ellipse_fit_square_is_circular() {
        let pixels: Vec<_> = (0..4).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        let fit = ellipse_fit(&pixels);
        assert!(fit.eccentricity.abs() < 1e-12);
        assert!((fit.major_axis_length - fit.minor_axis_length).abs() < 1e-12);
    }

    #[test]
    fn test_ellipse_fit_line_is_degenerate() {
        let pixels: Vec<_> = (0..10).map(|x| (x, 0)).collect();
        let fit = ellipse_fit(&pixels);
        assert!((fit.eccentricity - 1.0).abs() < 1e-12);
        assert_eq!(fit.minor_axis_length, 0.0);
        // Variance of 0..10 is 8.25.
        assert!((fit.major_axis_length - 4.0 * 8.25f64.sqrt()).abs() < 1e-12);
    }
}
