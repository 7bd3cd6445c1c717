//! Image-region → fixed-length feature vector.
//!
//! The cascade only sees the [`FeatureExtractor`] contract: given a frame,
//! the target dimensions of a scan level and the ratio to the previous
//! level, produce a vector whose length does not depend on the level.
//! Implementations must be deterministic for identical inputs.
//!
//! [`GridFeatureExtractor`] is the reference implementation: bilinear
//! resample to the level size, Scharr magnitude, then per cell of a
//! `cells × cells` grid the mean intensity followed by the max-pooled
//! gradient magnitude.
pub mod gradient;

use crate::image::{ImageF32, ImageView};
use crate::pyramid::Dims;
use log::trace;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::Range;

use gradient::{scharr_magnitude, SCHARR_MAX_RESPONSE};

pub trait FeatureExtractor {
    /// Length of every vector returned by [`FeatureExtractor::extract`].
    fn feature_len(&self) -> usize;

    /// Drop per-level state built for a previous pyramid.
    fn reset(&mut self) {}

    /// Prepare per-level state ahead of scanning at `dims`.
    fn configure(&mut self, dims: Dims);

    /// Extract the features of `image` at `dims`. `scale` is the ratio of
    /// the previous level's width to this level's width, for extractors that
    /// map positions back to source coordinates.
    fn extract(&mut self, image: &ImageF32, dims: Dims, scale: f32) -> Vec<f32>;
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GridFeatureOptions {
    /// Cells per side of the pooling grid.
    pub cells: usize,
}

impl Default for GridFeatureOptions {
    fn default() -> Self {
        Self { cells: 5 }
    }
}

/// Cell boundaries for one level size.
#[derive(Clone, Debug)]
struct CellLayout {
    cols: Vec<Range<usize>>,
    rows: Vec<Range<usize>>,
}

impl CellLayout {
    fn new(dims: Dims, cells: usize) -> Self {
        Self {
            cols: split_axis(dims.w, cells),
            rows: split_axis(dims.h, cells),
        }
    }
}

/// Split `len` pixels into `parts` contiguous ranges. Every range holds at
/// least one pixel (ranges repeat the last pixel when `len < parts`).
fn split_axis(len: usize, parts: usize) -> Vec<Range<usize>> {
    (0..parts)
        .map(|i| {
            let start = (i * len / parts).min(len.saturating_sub(1));
            let end = ((i + 1) * len / parts).max(start + 1).min(len.max(1));
            start..end
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct GridFeatureExtractor {
    cells: usize,
    layouts: HashMap<Dims, CellLayout>,
}

impl GridFeatureExtractor {
    pub fn new(options: GridFeatureOptions) -> Self {
        Self {
            cells: options.cells.max(1),
            layouts: HashMap::new(),
        }
    }

    /// Number of cached cell layouts.
    pub(crate) fn cached_layouts(&self) -> usize {
        self.layouts.len()
    }

    fn layout(&mut self, dims: Dims) -> CellLayout {
        let cells = self.cells;
        self.layouts
            .entry(dims)
            .or_insert_with(|| CellLayout::new(dims, cells))
            .clone()
    }
}

impl Default for GridFeatureExtractor {
    fn default() -> Self {
        Self::new(GridFeatureOptions::default())
    }
}

impl FeatureExtractor for GridFeatureExtractor {
    fn feature_len(&self) -> usize {
        2 * self.cells * self.cells
    }

    fn reset(&mut self) {
        self.layouts.clear();
    }

    fn configure(&mut self, dims: Dims) {
        let cells = self.cells;
        self.layouts
            .entry(dims)
            .or_insert_with(|| CellLayout::new(dims, cells));
    }

    fn extract(&mut self, image: &ImageF32, dims: Dims, scale: f32) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.feature_len());
        if dims.w == 0 || dims.h == 0 || image.w == 0 || image.h == 0 {
            features.resize(self.feature_len(), 0.0);
            return features;
        }
        let layout = self.layout(dims);
        let level = image.resize_bilinear(dims);
        let mag = scharr_magnitude(&level);
        trace!(
            "GridFeatureExtractor::extract {}x{} scale={:.3}",
            dims.w,
            dims.h,
            scale
        );

        for rows in &layout.rows {
            for cols in &layout.cols {
                let mut sum = 0.0f32;
                let mut peak = 0.0f32;
                for y in rows.clone() {
                    let lrow = &level.row(y)[cols.clone()];
                    let mrow = &mag.row(y)[cols.clone()];
                    sum += lrow.iter().sum::<f32>();
                    peak = mrow.iter().copied().fold(peak, f32::max);
                }
                let count = (rows.len() * cols.len()).max(1) as f32;
                features.push(sum / count);
                features.push((peak / SCHARR_MAX_RESPONSE).min(1.0));
            }
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(w: usize, h: usize) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, x as f32 / (w - 1) as f32);
            }
        }
        img
    }

    #[test]
    fn split_axis_covers_every_pixel_once() {
        let ranges = split_axis(17, 5);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[4].end, 17);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn split_axis_keeps_cells_non_empty_on_tiny_levels() {
        let ranges = split_axis(2, 5);
        assert!(ranges.iter().all(|r| !r.is_empty() && r.end <= 2));
    }

    #[test]
    fn vector_length_is_independent_of_level_size() {
        let img = gradient_image(64, 48);
        let mut ex = GridFeatureExtractor::new(GridFeatureOptions { cells: 4 });
        for dims in [Dims::new(64, 48), Dims::new(32, 24), Dims::new(3, 2)] {
            ex.configure(dims);
            assert_eq!(ex.extract(&img, dims, 1.0).len(), 32);
        }
    }

    #[test]
    fn extraction_is_deterministic_and_bounded() {
        let img = gradient_image(40, 40);
        let mut ex = GridFeatureExtractor::default();
        let a = ex.extract(&img, Dims::new(20, 20), 2.0);
        let b = ex.extract(&img, Dims::new(20, 20), 2.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
        // Mean intensity grows left to right along the first cell row.
        assert!(a[0] < a[2] && a[2] < a[4]);
    }

    #[test]
    fn reset_drops_cached_layouts() {
        let mut ex = GridFeatureExtractor::default();
        ex.configure(Dims::new(64, 48));
        ex.configure(Dims::new(32, 24));
        ex.configure(Dims::new(64, 48));
        assert_eq!(ex.cached_layouts(), 2);
        ex.reset();
        assert_eq!(ex.cached_layouts(), 0);
    }
}
