use crate::pyramid::Dims;
use serde::Serialize;

/// Result of extracting (and optionally classifying) one pyramid level.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleObservation {
    pub level_index: usize,
    pub dims: Dims,
    /// Previous level width over this level width.
    pub scale: f32,
    #[serde(skip)]
    pub features: Vec<f32>,
    /// Cascade verdict, present after `detect`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<u8>,
    pub elapsed_ms: f64,
}

/// Output of one multi-scale pass over a frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub source: Dims,
    pub levels: Vec<ScaleObservation>,
    pub total_ms: f64,
    pub average_ms: f64,
}

impl ScanReport {
    pub fn new(source: Dims, levels: Vec<ScaleObservation>, total_ms: f64) -> Self {
        let average_ms = if levels.is_empty() {
            0.0
        } else {
            total_ms / levels.len() as f64
        };
        Self {
            source,
            levels,
            total_ms,
            average_ms,
        }
    }

    /// Levels the cascade classified as present.
    pub fn detections(&self) -> impl Iterator<Item = &ScaleObservation> + '_ {
        self.levels.iter().filter(|obs| obs.verdict == Some(1))
    }

    pub fn any_detection(&self) -> bool {
        self.detections().next().is_some()
    }
}
