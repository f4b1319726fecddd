use super::*;
use crate::config::Connectivity;
use crate::testing::{disk, mask_from_ascii, rect, union};

fn props_of(mask: &BitBuffer2) -> Vec<RegionProps> {
    region_props(&LabelMap::from_mask(mask, Connectivity::Eight))
}

// ============================================================================
// Region measurements
// ============================================================================

#[test]
fn test_two_small_squares() {
    let mask = mask_from_ascii(&[
        "##..........##", //
        "##..........##",
    ]);
    let props = props_of(&mask);
    assert_eq!(props.len(), 2);

    let config = FeatureConfig::default();
    for p in &props {
        assert_eq!(p.area, 4);
        assert_eq!(p.filled_area, 4);
        assert_eq!(p.convex_area, 4);
        assert_eq!(p.convexity(), 1.0);

        let v = FeatureVector::from_region(p, &config);
        assert!((v.area_norm - 0.001).abs() < 1e-15);
    }
}

#[test]
fn test_region_bbox_and_first_pixel() {
    let mask = mask_from_ascii(&[
        "......", //
        "...##.",
        "..###.",
        "......",
    ]);
    let props = props_of(&mask);
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].bbox, Aabb::new(2, 4, 1, 2));
    assert_eq!(props[0].first_pixel(), (3, 1));
    assert_eq!(props[0].image().count_ones(), 5);
}

#[test]
fn test_filled_area_counts_holes() {
    let mask = mask_from_ascii(&[
        ".......", //
        ".#####.",
        ".#...#.",
        ".#...#.",
        ".#####.",
        ".......",
    ]);
    let props = props_of(&mask);
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].area, 14);
    assert_eq!(props[0].filled_area, 20);
    assert_eq!(props[0].convex_area, 20);
    assert_eq!(props[0].convexity(), 1.0);
}

#[test]
fn test_single_pixel_has_zero_circularity() {
    let props = props_of(&mask_from_ascii(&["...", ".#.", "..."]));
    assert_eq!(props[0].perimeter, 0.0);
    assert_eq!(props[0].circularity(), 0.0);
    assert_eq!(props[0].convexity(), 1.0);
}

#[test]
fn test_concave_shape_has_lower_convexity() {
    let mask = mask_from_ascii(&[
        "#######", //
        "#######",
        "##...##",
        "##...##",
        "##...##",
    ]);
    let props = props_of(&mask);
    assert_eq!(props.len(), 1);
    let convexity = props[0].convexity();
    assert!(convexity < 0.8, "U shape convexity {convexity}");
    assert!(convexity > 0.0);
}

#[test]
fn test_disk_is_nearly_circular() {
    let props = props_of(&disk(41, 41, 20.0, 20.0, 15.0));
    assert_eq!(props.len(), 1);
    let p = &props[0];
    assert!(p.eccentricity < 0.05, "eccentricity {}", p.eccentricity);
    assert!(p.circularity() > 0.85, "circularity {}", p.circularity());
    assert!(p.convexity() > 0.95, "convexity {}", p.convexity());
    // Moment ellipse of a disk has axis 2r.
    assert!((p.minor_axis_length - 30.0).abs() < 1.0);
}

#[test]
fn test_elongated_rect_is_eccentric() {
    let props = props_of(&rect(40, 10, 2, 3, 38, 6));
    let p = &props[0];
    assert!(p.eccentricity > 0.99, "eccentricity {}", p.eccentricity);
    assert_eq!(p.convexity(), 1.0);
}

#[test]
fn test_convexity_and_circularity_ranges() {
    let mask = union(
        &union(&disk(60, 40, 12.0, 12.0, 8.0), &rect(60, 40, 30, 5, 55, 9)),
        &rect(60, 40, 40, 30, 41, 31),
    );
    for p in props_of(&mask) {
        let c = p.convexity();
        assert!(c > 0.0 && c <= 1.0, "convexity {c}");
        assert!(p.circularity() >= 0.0);
    }
}

// ============================================================================
// Derived rows
// ============================================================================

#[test]
fn test_feature_row_width() {
    let props = props_of(&rect(10, 10, 2, 2, 6, 6));
    let mut config = FeatureConfig::default();
    let vectors = feature_vectors(&props, &config);
    assert_eq!(feature_matrix(&vectors, &config)[0].len(), 4);

    config.include_minor_axis = true;
    let row = &feature_matrix(&vectors, &config)[0];
    assert_eq!(row.len(), 5);
    assert_eq!(row[4], props[0].minor_axis_length);
}

#[test]
fn test_extended_features_use_pixel_area() {
    let props = props_of(&rect(10, 10, 2, 2, 6, 6));
    let rows = extended_features(&props);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], 16.0);
    assert_eq!(rows[0][2], 1.0);
}

#[test]
fn test_min_feret_diameters_per_region() {
    let mask = union(&rect(30, 30, 2, 2, 3, 12), &rect(30, 30, 10, 10, 20, 20));
    let props = props_of(&mask);
    let ferets = min_feret_diameters(&props);
    assert_eq!(ferets.len(), 2);
    assert_eq!(ferets[0], 1.0);
    assert!((ferets[1] - 10.0).abs() < 0.5, "feret {}", ferets[1]);
}
