//! Connected component labeling using union-find over run-length encoded rows.
//!
//! Each row is split into horizontal runs of foreground pixels. Runs are merged
//! with overlapping runs of the previous row, then provisional labels are
//! flattened into a dense `1..=N` enumeration. Provisional labels are created
//! in row-major order and unions keep the smaller root, so final labels follow
//! the row-major order of each region's first pixel.


use common::bit_buffer2::BitBuffer2;
use common::buffer2::Buffer2;

use crate::config::Connectivity;

// ============================================================================
// Run-Length Encoding
// ============================================================================

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32, // inclusive
    end: u32,   // exclusive
    label: u32,
}

impl Run {
    /// Range of previous-row x coordinates that may touch this run.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

fn extract_runs_from_row(mask: &BitBuffer2, y: usize, runs: &mut Vec<Run>) {
    let width = mask.width();
    let mut x = 0;
    while x < width {
        if !mask.get_xy(x, y) {
            x += 1;
            continue;
        }
        let start = x;
        while x < width && mask.get_xy(x, y) {
            x += 1;
        }
        runs.push(Run {
            start: start as u32,
            end: x as u32,
            label: 0,
        });
    }
}

// ============================================================================
// LabelMap
// ============================================================================

/// A 2D label map: 0 is background, `1..=num_labels` index regions.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Buffer2<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Labels the foreground of `mask`. Never fails; an empty or all-background
    /// mask yields zero regions.
    pub fn from_mask(mask: &BitBuffer2, connectivity: Connectivity) -> Self {
        let width = mask.width();
        let height = mask.height();
        let mut labels = Buffer2::new_filled(width, height, 0u32);

        if width == 0 || height == 0 {
            return Self {
                labels,
                num_labels: 0,
            };
        }

        let num_labels = label_mask(mask, &mut labels, connectivity);
        Self { labels, num_labels }
    }

    /// Number of connected components (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        self.labels.pixels()
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer2<u32> {
        &self.labels
    }

    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[(x, y)]
    }

    /// Label under a possibly out-of-range pixel, `None` outside the image or
    /// on background.
    pub fn label_at_checked(&self, x: i64, y: i64) -> Option<u32> {
        self.labels.get_checked(x, y).copied().filter(|&l| l != 0)
    }

    /// Foreground mask (`label > 0`).
    pub fn to_mask(&self) -> BitBuffer2 {
        BitBuffer2::from_buffer(&self.labels, |&l| l != 0)
    }

    /// Pixel coordinates of every region, in row-major order within each
    /// region. Index `i` holds region `i + 1`.
    pub fn region_pixels(&self) -> Vec<Vec<(usize, usize)>> {
        let mut regions = vec![Vec::new(); self.num_labels];
        let width = self.width();
        for (idx, &label) in self.labels.iter().enumerate() {
            if label != 0 {
                regions[label as usize - 1].push((idx % width, idx / width));
            }
        }
        regions
    }
}

impl std::ops::Index<usize> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

/// Removes every 8-connected region that touches the image border.
pub fn clear_border(mask: &BitBuffer2) -> BitBuffer2 {
    let (width, height) = (mask.width(), mask.height());
    if width == 0 || height == 0 {
        return mask.clone();
    }
    let labels = LabelMap::from_mask(mask, Connectivity::Eight);

    let mut touches = vec![false; labels.num_labels() + 1];
    for x in 0..width {
        touches[labels.label_at(x, 0) as usize] = true;
        touches[labels.label_at(x, height - 1) as usize] = true;
    }
    for y in 0..height {
        touches[labels.label_at(0, y) as usize] = true;
        touches[labels.label_at(width - 1, y) as usize] = true;
    }
    touches[0] = true;

    BitBuffer2::from_buffer(labels.buffer(), |&l| !touches[l as usize])
}

// ============================================================================
// Sequential labeling
// ============================================================================

fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned_label = None;
        let mut check_idx = prev_idx;
        while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
            let prev_run = &prev_runs[check_idx];
            if runs_connected(prev_run, run, connectivity) {
                match assigned_label {
                    Some(label) if label != prev_run.label => uf.union(label, prev_run.label),
                    None => assigned_label = Some(prev_run.label),
                    _ => {}
                }
            }
            check_idx += 1;
        }

        run.label = assigned_label.unwrap_or_else(|| uf.make_set());
    }
}

fn label_mask(mask: &BitBuffer2, labels: &mut Buffer2<u32>, connectivity: Connectivity) -> usize {
    let width = mask.width();
    let height = mask.height();

    let mut uf = UnionFind::new();
    let mut prev_runs: Vec<Run> = Vec::with_capacity(width / 4);
    let mut curr_runs: Vec<Run> = Vec::with_capacity(width / 4);

    for y in 0..height {
        curr_runs.clear();
        extract_runs_from_row(mask, y, &mut curr_runs);

        if curr_runs.is_empty() {
            prev_runs.clear();
            continue;
        }

        merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);

        let row_start = y * width;
        for run in &curr_runs {
            for x in run.start..run.end {
                labels[row_start + x as usize] = run.label;
            }
        }

        std::mem::swap(&mut prev_runs, &mut curr_runs);
    }

    uf.flatten_labels(labels.pixels_mut())
}

// ============================================================================
// Union-Find
// ============================================================================

/// Union-find over provisional labels `1..=n`, `parent[l - 1]` is the parent
/// of label `l`.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    /// Find root with two-pass path compression.
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        loop {
            let parent = self.parent[(root - 1) as usize];
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = label;
        while current != root {
            let idx = (current - 1) as usize;
            let parent = self.parent[idx];
            self.parent[idx] = root;
            current = parent;
        }

        root
    }

    /// Smaller root becomes the parent.
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Rewrites `labels` to dense `1..=n` and returns `n`.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        let len = self.parent.len();
        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }

        for l in labels.iter_mut() {
            if *l != 0 {
                *l = label_map[*l as usize];
            }
        }

        num_labels as usize
    }
}
