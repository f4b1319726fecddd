//! Convex hull of a point set (Andrew's monotone chain).

use glam::DVec2;

fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

/// Counter-clockwise hull (in a y-up frame) without collinear points.
///
/// Fewer than three distinct points come back as-is (deduplicated, sorted).
pub fn convex_hull(points: &[DVec2]) -> Vec<DVec2> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<DVec2> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Inside-or-on test against a hull produced by [`convex_hull`].
///
/// Degenerate hulls (point or segment) accept points lying on them.
pub fn point_in_convex_polygon(hull: &[DVec2], p: DVec2, tolerance: f64) -> bool {
    match hull.len() {
        0 => false,
        1 => hull[0].distance(p) <= tolerance,
        2 => {
            let (a, b) = (hull[0], hull[1]);
            let ab = b - a;
            let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
            (a + ab * t).distance(p) <= tolerance
        }
        n => (0..n).all(|i| {
            let a = hull[i];
            let b = hull[(i + 1) % n];
            let edge = b - a;
            edge.perp_dot(p - a) >= -tolerance * edge.length()
        }),
    }
}
