//! Per-region geometric descriptors.
//!
//! [`region_props`] measures every region of a [`LabelMap`] once; the
//! classifier inputs ([`FeatureVector`]) and export rows are derived from
//! those measurements without touching the image again.

mod shape;

#[cfg(test)]
mod tests;

pub use shape::{EllipseFit, convex_image, ellipse_fit, fill_holes, perimeter};

use common::bit_buffer2::BitBuffer2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FeatureConfig;
use crate::feret::min_feret_diameter;
use crate::labeling::LabelMap;
use crate::math::Aabb;

// ============================================================================
// RegionProps
// ============================================================================

/// Measurements of one labeled region.
#[derive(Debug, Clone)]
pub struct RegionProps {
    /// Region index, `1..=N`.
    pub label: u32,
    /// Pixel coordinates `(x, y)` in row-major order.
    pub pixels: Vec<(usize, usize)>,
    pub bbox: Aabb,
    /// Pixel count of the region as labeled.
    pub area: usize,
    /// Pixel count with interior holes filled.
    pub filled_area: usize,
    /// Pixel count of the convex image.
    pub convex_area: usize,
    /// Convex hull of the region, cropped to `bbox`.
    pub convex_image: BitBuffer2,
    /// Boundary length of the unfilled region.
    pub perimeter: f64,
    pub eccentricity: f64,
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
}

impl RegionProps {
    /// Measures a region from its pixels. `pixels` must be non-empty.
    pub fn from_pixels(label: u32, pixels: Vec<(usize, usize)>) -> Self {
        assert!(!pixels.is_empty(), "region {label} has no pixels");

        let bbox = bbox_of(&pixels);
        let image = crop_to_bbox(&pixels, &bbox);
        let filled = fill_holes(&image);
        let convex = convex_image(&filled);
        let fit = ellipse_fit(&pixels);

        Self {
            label,
            bbox,
            area: pixels.len(),
            filled_area: filled.count_ones(),
            convex_area: convex.count_ones(),
            convex_image: convex,
            perimeter: perimeter(&image),
            eccentricity: fit.eccentricity,
            major_axis_length: fit.major_axis_length,
            minor_axis_length: fit.minor_axis_length,
            pixels,
        }
    }

    /// Region mask cropped to its bounding box.
    pub fn image(&self) -> BitBuffer2 {
        crop_to_bbox(&self.pixels, &self.bbox)
    }

    /// First pixel in row-major order.
    #[inline]
    pub fn first_pixel(&self) -> (usize, usize) {
        self.pixels[0]
    }

    /// `filled_area / convex_area`, in `(0, 1]`.
    #[inline]
    pub fn convexity(&self) -> f64 {
        self.filled_area as f64 / self.convex_area as f64
    }

    /// `4π · filled_area / perimeter²`; 0 when the perimeter is 0.
    #[inline]
    pub fn circularity(&self) -> f64 {
        if self.perimeter == 0.0 {
            0.0
        } else {
            4.0 * std::f64::consts::PI * self.filled_area as f64
                / (self.perimeter * self.perimeter)
        }
    }

    pub fn min_feret_diameter(&self) -> f64 {
        min_feret_diameter(&self.convex_image)
    }
}

pub(crate) fn bbox_of(pixels: &[(usize, usize)]) -> Aabb {
    let mut bbox = Aabb::empty();
    for &(x, y) in pixels {
        bbox.include(x, y);
    }
    bbox
}

pub(crate) fn crop_to_bbox(pixels: &[(usize, usize)], bbox: &Aabb) -> BitBuffer2 {
    let mut image = BitBuffer2::new_default(bbox.width(), bbox.height());
    for &(x, y) in pixels {
        image.set_xy(x - bbox.x_min, y - bbox.y_min, true);
    }
    image
}

/// Measures every region. Index `i` holds region `i + 1`.
pub fn region_props(labels: &LabelMap) -> Vec<RegionProps> {
    let props: Vec<RegionProps> = labels
        .region_pixels()
        .into_par_iter()
        .enumerate()
        .map(|(i, pixels)| RegionProps::from_pixels(i as u32 + 1, pixels))
        .collect();

    debug!(
        regions = props.len(),
        width = labels.width(),
        height = labels.height(),
        "Measured region properties"
    );
    props
}

// ============================================================================
// Feature vectors
// ============================================================================

/// Classifier input for one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// `filled_area / area_normalization`.
    pub area_norm: f64,
    pub eccentricity: f64,
    pub convexity: f64,
    pub circularity: f64,
    pub minor_axis_length: f64,
}

impl FeatureVector {
    pub fn from_region(props: &RegionProps, config: &FeatureConfig) -> Self {
        Self {
            area_norm: props.filled_area as f64 / config.area_normalization,
            eccentricity: props.eccentricity,
            convexity: props.convexity(),
            circularity: props.circularity(),
            minor_axis_length: props.minor_axis_length,
        }
    }

    /// `[area_norm, eccentricity, convexity, circularity]`, plus the minor
    /// axis when enabled.
    pub fn to_row(&self, config: &FeatureConfig) -> Vec<f64> {
        let mut row = vec![
            self.area_norm,
            self.eccentricity,
            self.convexity,
            self.circularity,
        ];
        if config.include_minor_axis {
            row.push(self.minor_axis_length);
        }
        row
    }
}

pub fn feature_vectors(props: &[RegionProps], config: &FeatureConfig) -> Vec<FeatureVector> {
    props
        .iter()
        .map(|p| FeatureVector::from_region(p, config))
        .collect()
}

/// One classifier row per region, in region order.
pub fn feature_matrix(vectors: &[FeatureVector], config: &FeatureConfig) -> Vec<Vec<f64>> {
    vectors.iter().map(|v| v.to_row(config)).collect()
}

/// `[area_px, eccentricity, convexity, circularity, minor_axis_length]` per
/// region, with area as the raw filled pixel count.
pub fn extended_features(props: &[RegionProps]) -> Vec<[f64; 5]> {
    props
        .iter()
        .map(|p| {
            [
                p.filled_area as f64,
                p.eccentricity,
                p.convexity(),
                p.circularity(),
                p.minor_axis_length,
            ]
        })
        .collect()
}

/// Minimum feret diameter of every region.
pub fn min_feret_diameters(props: &[RegionProps]) -> Vec<f64> {
    props.par_iter().map(RegionProps::min_feret_diameter).collect()
}
