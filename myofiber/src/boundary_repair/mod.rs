//! Splitting of merged fibers by multi-level thresholding.
//!
//! A grayscale image is thresholded at consecutive level pairs. When a large
//! region found at the lower ("loose") level sits inside a region of the
//! higher ("strict") level whose outline is much longer, the two fibers were
//! merged at the higher level; a separator ring is then burned into the image
//! with a sentinel value so that later thresholds keep them apart.


use common::bit_buffer2::BitBuffer2;
use common::buffer2::Buffer2;
use tracing::{debug, info};

use crate::config::{BoundaryRepairConfig, Connectivity};
use crate::features::{bbox_of, crop_to_bbox, perimeter};
use crate::labeling::{LabelMap, clear_border};
use crate::morphology::{dilate_cross, dilate_cross_n};

/// Region pixels plus lazily measured perimeter.
#[derive(Debug)]
struct Outline {
    pixels: Vec<(usize, usize)>,
    perimeter: Option<f64>,
}

impl Outline {
    fn new(pixels: Vec<(usize, usize)>) -> Self {
        Self {
            pixels,
            perimeter: None,
        }
    }

    fn perimeter(&mut self) -> f64 {
        *self.perimeter.get_or_insert_with(|| {
            let bbox = bbox_of(&self.pixels);
            perimeter(&crop_to_bbox(&self.pixels, &bbox))
        })
    }
}

fn label_below(image: &Buffer2<f64>, threshold: f64) -> LabelMap {
    let mask = BitBuffer2::from_buffer(image, |&v| v < threshold);
    LabelMap::from_mask(&mask, Connectivity::Eight)
}

/// Strict-region pixels at cross distance 2 or 3 from the loose region.
///
/// Coordinates are in the full image frame.
fn separator_pixels(loose: &[(usize, usize)], strict: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let bbox = bbox_of(strict);
    let strict_image = crop_to_bbox(strict, &bbox);

    // The loose region lies inside the strict one, so it fits the same frame.
    let loose_image = crop_to_bbox(loose, &bbox);

    let inner = dilate_cross(&loose_image);
    let mut ring = dilate_cross_n(&inner, 2);
    ring.and_not_assign(&inner);
    ring.and_assign(&strict_image);

    ring.iter_ones()
        .map(|(x, y)| (x + bbox.x_min, y + bbox.y_min))
        .collect()
}

/// One repair pass between a loose and a strict threshold.
///
/// Returns a copy of `image` with separator pixels set to `config.sentinel`.
/// Regions failing the area or perimeter-ratio test are left untouched.
pub fn repair_pass(
    image: &Buffer2<f64>,
    loose_threshold: f64,
    strict_threshold: f64,
    config: &BoundaryRepairConfig,
) -> Buffer2<f64> {
    assert!(
        loose_threshold <= strict_threshold,
        "loose threshold ({loose_threshold}) must not exceed strict threshold ({strict_threshold})"
    );

    let loose_labels = label_below(image, loose_threshold);
    let strict_labels = label_below(image, strict_threshold);

    let mut loose: Vec<Outline> = loose_labels
        .region_pixels()
        .into_iter()
        .map(Outline::new)
        .collect();
    let mut strict: Vec<Outline> = strict_labels
        .region_pixels()
        .into_iter()
        .map(Outline::new)
        .collect();

    let mut output = image.clone();
    let mut split_regions = 0usize;
    let mut border_pixels = 0usize;

    for region in loose.iter_mut() {
        if region.pixels.len() <= config.min_region_area {
            continue;
        }

        // Every loose pixel is also below the strict threshold.
        let (x, y) = region.pixels[0];
        let strict_label = strict_labels.label_at(x, y);
        if strict_label == 0 {
            continue;
        }
        let container = &mut strict[strict_label as usize - 1];

        let loose_perimeter = region.perimeter();
        if loose_perimeter == 0.0 {
            continue;
        }
        let ratio = container.perimeter() / loose_perimeter;
        if ratio <= config.perimeter_ratio {
            continue;
        }

        let separator = separator_pixels(&region.pixels, &container.pixels);
        border_pixels += separator.len();
        split_regions += 1;
        for (x, y) in separator {
            output[(x, y)] = config.sentinel;
        }
    }

    debug!(
        loose_threshold,
        strict_threshold,
        loose_regions = loose.len(),
        strict_regions = strict.len(),
        split_regions,
        border_pixels,
        "Boundary repair pass"
    );

    output
}

/// Runs [`repair_pass`] over every consecutive pair of
/// [`BoundaryRepairConfig::thresholds`], each pass feeding the next.
pub fn repair(image: &Buffer2<f64>, config: &BoundaryRepairConfig) -> Buffer2<f64> {
    config.validate();

    let thresholds = config.thresholds();
    let mut current = image.clone();
    for pair in thresholds.windows(2) {
        current = repair_pass(&current, pair[0], pair[1], config);
    }

    let separators = current.iter().filter(|&&v| v == config.sentinel).count();
    info!(
        width = image.width(),
        height = image.height(),
        levels = config.levels,
        separators,
        "Boundary repair finished"
    );
    current
}

/// Binary mask for classification: `image < upper_bound` without sentinel
/// pixels, with border-touching regions removed.
pub fn repaired_mask(image: &Buffer2<f64>, upper_bound: f64, sentinel: f64) -> BitBuffer2 {
    let mask = BitBuffer2::from_buffer(image, |&v| v < upper_bound && v != sentinel);
    clear_border(&mask)
}

/// Ternary marker map: 0 where `v <= low`, 1 where `low < v <= high`, 2 where
/// `v > high`.
pub fn threshold_markers(image: &Buffer2<f64>, low: f64, high: f64) -> Buffer2<u8> {
    image.map(|&v| {
        if v > high {
            2
        } else if v > low {
            1
        } else {
            0
        }
    })
}

/// Rescales to `[0, 1]` when the image maximum exceeds 1. A constant image
/// above 1 maps to all zeros. Images already within range are returned as-is.
pub fn normalize_intensity(image: &Buffer2<f64>) -> Buffer2<f64> {
    let (min, max) = image
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if image.is_empty() || max <= 1.0 {
        return image.clone();
    }

    let range = max - min;
    if range == 0.0 {
        return image.map(|_| 0.0);
    }
    image.map(|&v| (v - min) / range)
}
