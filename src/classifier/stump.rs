//! Decision stump over a single feature.
//!
//! Outputs 1.0 when `(x[feature] >= threshold) == fires_above`, 0.0
//! otherwise. Training scans every feature (in parallel) and every boundary
//! between distinct sorted values for the lowest class-balanced error, where
//! each class carries half of the total weight.
use super::{
    uniform_input_len, Classifier, Example, StageBlob, TrainConfig, TrainOutcome, TrainProgress,
};
use crate::error::CascadeError;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StumpStage {
    feature: usize,
    threshold: f32,
    fires_above: bool,
}

impl Default for StumpStage {
    /// Untrained stumps reject everything.
    fn default() -> Self {
        Self {
            feature: 0,
            threshold: f32::MAX,
            fires_above: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Split {
    feature: usize,
    threshold: f32,
    fires_above: bool,
    error: f32,
}

impl StumpStage {
    pub const KIND: &'static str = "stump";

    pub fn new(feature: usize, threshold: f32, fires_above: bool) -> Self {
        Self {
            feature,
            threshold,
            fires_above,
        }
    }

    pub fn from_blob(blob: &StageBlob) -> Result<Self, CascadeError> {
        Ok(serde_json::from_value(blob.params.clone())?)
    }

    pub fn feature(&self) -> usize {
        self.feature
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

fn best_split_for_feature(
    examples: &[Example<'_>],
    feature: usize,
    w_pos: f32,
    w_neg: f32,
) -> Split {
    let mut samples: Vec<(f32, u8)> = examples
        .iter()
        .map(|ex| (ex.input[feature], ex.expected))
        .collect();
    samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let pos_total: f32 = samples.iter().filter(|s| s.1 != 0).count() as f32 * w_pos;
    let neg_total: f32 = samples.iter().filter(|s| s.1 == 0).count() as f32 * w_neg;

    let n = samples.len();
    let mut best = Split {
        feature,
        threshold: f32::MAX,
        fires_above: true,
        error: f32::INFINITY,
    };
    let mut pos_below = 0.0f32;
    let mut neg_below = 0.0f32;
    for i in 0..=n {
        let boundary = i == 0 || i == n || samples[i - 1].0 < samples[i].0;
        if boundary {
            let threshold = if i == 0 {
                samples[0].0
            } else if i == n {
                samples[n - 1].0 + 1.0
            } else {
                0.5 * (samples[i - 1].0 + samples[i].0)
            };
            // Running sums drift; clamp so a perfect split reads as 0.
            let above_error = (pos_below + (neg_total - neg_below)).max(0.0);
            let below_error = (neg_below + (pos_total - pos_below)).max(0.0);
            if above_error < best.error {
                best = Split {
                    feature,
                    threshold,
                    fires_above: true,
                    error: above_error,
                };
            }
            if below_error < best.error {
                best = Split {
                    feature,
                    threshold,
                    fires_above: false,
                    error: below_error,
                };
            }
        }
        if i < n {
            if samples[i].1 != 0 {
                pos_below += w_pos;
            } else {
                neg_below += w_neg;
            }
        }
    }
    best
}

impl Classifier for StumpStage {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn predict(&self, input: &[f32]) -> f32 {
        match input.get(self.feature) {
            Some(&x) if (x >= self.threshold) == self.fires_above => 1.0,
            _ => 0.0,
        }
    }

    fn train(
        &mut self,
        examples: &[Example<'_>],
        _config: &TrainConfig,
        on_progress: &mut dyn FnMut(&TrainProgress),
    ) -> Result<TrainOutcome, CascadeError> {
        let Some(len) = uniform_input_len(examples)? else {
            return Ok(TrainOutcome::default());
        };
        if len == 0 {
            return Ok(TrainOutcome::default());
        }
        let positives = examples.iter().filter(|ex| ex.expected != 0).count();
        let negatives = examples.len() - positives;
        let w_pos = if positives > 0 { 0.5 / positives as f32 } else { 0.0 };
        let w_neg = if negatives > 0 { 0.5 / negatives as f32 } else { 0.0 };

        let best = (0..len)
            .into_par_iter()
            .map(|feature| best_split_for_feature(examples, feature, w_pos, w_neg))
            .min_by(|a, b| {
                a.error
                    .partial_cmp(&b.error)
                    .unwrap_or(Ordering::Equal)
                    .then(a.feature.cmp(&b.feature))
            });
        let Some(best) = best else {
            return Ok(TrainOutcome::default());
        };

        self.feature = best.feature;
        self.threshold = best.threshold;
        self.fires_above = best.fires_above;
        debug!(
            "StumpStage::train feature={} threshold={:.4} fires_above={} error={:.4}",
            best.feature, best.threshold, best.fires_above, best.error
        );

        let outcome = TrainOutcome {
            iterations: len,
            error: best.error,
        };
        on_progress(&TrainProgress {
            iterations: outcome.iterations,
            error: outcome.error,
        });
        Ok(outcome)
    }

    fn serialize(&self) -> Result<StageBlob, CascadeError> {
        Ok(StageBlob {
            kind: Self::KIND.to_string(),
            params: serde_json::to_value(self)?,
        })
    }
}
