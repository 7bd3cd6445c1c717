use crate::pyramid::ScalePyramid;
use serde::{Deserialize, Serialize};

/// Geometry of a single level of the scan pyramid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleLevelReport {
    pub level_index: usize,
    pub percent: u32,
    pub relative_scale: f64,
    pub width: usize,
    pub height: usize,
}

impl ScaleLevelReport {
    pub fn from_pyramid(pyramid: &ScalePyramid) -> Vec<Self> {
        pyramid
            .levels()
            .iter()
            .map(|level| ScaleLevelReport {
                level_index: level.index,
                percent: level.percent,
                relative_scale: level.relative_scale,
                width: level.dims.w,
                height: level.dims.h,
            })
            .collect()
    }
}

/// Pyramid configuration captured by the scan tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidStage {
    pub stage_count: usize,
    pub step: u32,
    pub levels: Vec<ScaleLevelReport>,
}

impl PyramidStage {
    pub fn from_pyramid(pyramid: &ScalePyramid) -> Self {
        Self {
            stage_count: pyramid.stage_count(),
            step: pyramid.step(),
            levels: ScaleLevelReport::from_pyramid(pyramid),
        }
    }
}
