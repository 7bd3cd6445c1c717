//! Scale pyramid geometry for multi-scale scanning.
//!
//! Purpose
//! - Produce the ordered list of target dimensions a frame is scanned at,
//!   from 100% of the source size down to one `step` above zero.
//!
//! Design
//! - `step = round(100 / stage_count)` percentage points.
//! - Each level stores its scale relative to the previously kept level, so an
//!   implementation that downsamples iteratively (each level from the last
//!   one's output) lands on the same dimensions. Dimensions are
//!   `round(source * cumulative)` with `cumulative` the running product of
//!   relative scales.
//! - Levels whose rounded size would not shrink both axes are skipped and a
//!   level with a zero dimension ends the sequence, so widths and heights are
//!   strictly decreasing and positive.
use crate::error::CascadeError;
use serde::{Deserialize, Serialize};

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub w: usize,
    pub h: usize,
}

impl Dims {
    pub const fn new(w: usize, h: usize) -> Self {
        Self { w, h }
    }

    fn shrinks_from(&self, prev: &Dims) -> bool {
        self.w < prev.w && self.h < prev.h
    }
}

/// One entry of the scan sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleLevel {
    pub index: usize,
    /// Percentage of the source size (100 for the first level).
    pub percent: u32,
    /// Scale relative to the previous level (1.0 for the first level).
    pub relative_scale: f64,
    pub dims: Dims,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalePyramid {
    source: Dims,
    stage_count: usize,
    step: u32,
    levels: Vec<ScaleLevel>,
}

/// Largest stage count whose rounded step is still at least one point.
pub const MAX_STAGE_COUNT: usize = 200;

impl ScalePyramid {
    /// Compute the scan sequence for a `width × height` frame.
    pub fn configure(
        width: usize,
        height: usize,
        stage_count: usize,
    ) -> Result<Self, CascadeError> {
        if width == 0 || height == 0 {
            return Err(CascadeError::EmptyImage { width, height });
        }
        if stage_count == 0 || stage_count > MAX_STAGE_COUNT {
            return Err(CascadeError::InvalidStageCount {
                requested: stage_count,
            });
        }
        let step = (100.0 / stage_count as f64).round() as u32;
        let source = Dims::new(width, height);

        let mut levels: Vec<ScaleLevel> = Vec::with_capacity(stage_count);
        let mut last_scale = 1.0f64;
        let mut cumulative = 1.0f64;
        let mut percent = 100u32;
        while percent >= step {
            let percent_scale = percent as f64 / 100.0;
            let relative_scale = percent_scale / last_scale;
            let candidate = cumulative * relative_scale;
            let dims = Dims::new(
                (width as f64 * candidate).round() as usize,
                (height as f64 * candidate).round() as usize,
            );
            if dims.w == 0 || dims.h == 0 {
                break;
            }
            let keep = levels.last().map_or(true, |prev| dims.shrinks_from(&prev.dims));
            if keep {
                levels.push(ScaleLevel {
                    index: levels.len(),
                    percent,
                    relative_scale,
                    dims,
                });
                last_scale = percent_scale;
                cumulative = candidate;
            }
            percent -= step;
        }

        Ok(Self {
            source,
            stage_count,
            step,
            levels,
        })
    }

    /// True when this pyramid was built for the same frame size and stage count.
    pub fn matches(&self, width: usize, height: usize, stage_count: usize) -> bool {
        self.source == Dims::new(width, height) && self.stage_count == stage_count
    }

    pub fn source(&self) -> Dims {
        self.source
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn levels(&self) -> &[ScaleLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
