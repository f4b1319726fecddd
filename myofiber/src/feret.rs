//! Minimum caliper width of a region by rotational scan.

use common::bit_buffer2::BitBuffer2;
use glam::{DMat2, DVec2};

/// Angular step of the scan, in radians.
const ANGLE_STEP: f64 = 0.01;

/// Minimum feret diameter of a convex image.
///
/// The boundary is traced at level 0.5 on the image padded by one background
/// pixel, centered, then rotated through `[0, π/2)`. Width and height of the
/// rotated point set are both candidates; a quarter turn covers every
/// orientation because the two axes swap roles. Hulls whose bounding box has a
/// side of 1 or 2 pixels return that side directly.
///
/// The padding makes the result about one pixel wider than a scan over a
/// contour traced on the unpadded image, since the outermost crossings sit on
/// pixel edges rather than pixel centers.
pub fn min_feret_diameter(convex_image: &BitBuffer2) -> f64 {
    let min_side = convex_image.width().min(convex_image.height());
    match min_side {
        0 => return 0.0,
        1 => return 1.0,
        2 => return 2.0,
        _ => {}
    }

    let mut points = contour_points(convex_image);
    if points.is_empty() {
        return 0.0;
    }
    let centroid = points.iter().copied().sum::<DVec2>() / points.len() as f64;
    for p in &mut points {
        *p -= centroid;
    }

    let steps = (std::f64::consts::FRAC_PI_2 / ANGLE_STEP).ceil() as usize;
    (0..steps)
        .map(|i| {
            let rotation = DMat2::from_angle(i as f64 * ANGLE_STEP);
            let (min, max) = points.iter().fold(
                (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
                |(min, max), &p| {
                    let r = rotation * p;
                    (min.min(r), max.max(r))
                },
            );
            let extent = max - min;
            extent.x.min(extent.y)
        })
        .fold(f64::INFINITY, f64::min)
}

/// Iso-line vertices at level 0.5 of the zero-padded image.
///
/// For a binary image every crossing sits halfway between two 4-adjacent
/// pixels of different value, so the vertex set is exactly those midpoints.
/// Coordinates are in the unpadded frame.
fn contour_points(image: &BitBuffer2) -> Vec<DVec2> {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let mut points = Vec::new();

    for y in -1..=height {
        for x in -1..=width {
            let here = image.get_or_false(x, y);
            if x < width && here != image.get_or_false(x + 1, y) {
                points.push(DVec2::new(x as f64 + 0.5, y as f64));
            }
            if y < height && here != image.get_or_false(x, y + 1) {
                points.push(DVec2::new(x as f64, y as f64 + 0.5));
            }
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::float_ext::FloatExt;

    use crate::testing::{disk, mask_from_ascii, rect};

    #[test]
    fn test_thin_shortcuts() {
        assert_eq!(min_feret_diameter(&mask_from_ascii(&["#####"])), 1.0);
        assert_eq!(min_feret_diameter(&mask_from_ascii(&["####", "####"])), 2.0);
        assert_eq!(min_feret_diameter(&mask_from_ascii(&["##", "##", "##"])), 2.0);
    }

    #[test]
    fn test_square_width() {
        // Midpoint contour of a 5x5 block spans 5 pixels edge to edge.
        let square = rect(5, 5, 0, 0, 5, 5);
        let d = min_feret_diameter(&square);
        assert!(d.approximately_eq(5.0), "got {d}");
    }

    #[test]
    fn test_rectangle_takes_short_side() {
        let block = rect(12, 4, 0, 0, 12, 4);
        let d = min_feret_diameter(&block);
        assert!(d.approximately_eq(4.0), "got {d}");
    }

    #[test]
    fn test_disk_close_to_diameter() {
        let d = min_feret_diameter(&disk(21, 21, 10.0, 10.0, 10.0));
        assert!(d > 20.0 && d < 21.0, "got {d}");
    }

    #[test]
    fn test_padded_contour_reaches_pixel_edges() {
        let points = contour_points(&rect(5, 5, 0, 0, 5, 5));
        let min = points.iter().copied().fold(DVec2::INFINITY, DVec2::min);
        let max = points.iter().copied().fold(DVec2::NEG_INFINITY, DVec2::max);
        assert_eq!(min, DVec2::splat(-0.5));
        assert_eq!(max, DVec2::splat(4.5));
    }

    #[test]
    fn test_contour_points_single_pixel() {
        let points = contour_points(&mask_from_ascii(&["#"]));
        assert_eq!(points.len(), 4);
        assert!(points.contains(&DVec2::new(-0.5, 0.0)));
        assert!(points.contains(&DVec2::new(0.5, 0.0)));
        assert!(points.contains(&DVec2::new(0.0, -0.5)));
        assert!(points.contains(&DVec2::new(0.0, 0.5)));
    }
}
