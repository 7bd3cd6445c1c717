//! Single logistic unit `sigmoid(w · x + b)`.
//!
//! Trained by full-batch gradient descent on the cross-entropy loss; the
//! reported error is the mean squared error of the predictions, which is what
//! `TrainConfig::error_thresh` is compared against. Per-example gradients are
//! accumulated in parallel with rayon.
use super::{
    uniform_input_len, Classifier, Example, StageBlob, TrainConfig, TrainOutcome, TrainProgress,
};
use crate::error::CascadeError;
use log::debug;
use nalgebra::DVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticStage {
    weights: DVector<f32>,
    bias: f32,
}

#[inline]
fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticStage {
    pub const KIND: &'static str = "logistic";

    /// Zero-initialized unit over `input_len` features.
    pub fn new(input_len: usize) -> Self {
        Self {
            weights: DVector::zeros(input_len),
            bias: 0.0,
        }
    }

    pub fn from_parts(weights: Vec<f32>, bias: f32) -> Self {
        Self {
            weights: DVector::from_vec(weights),
            bias,
        }
    }

    pub fn from_blob(blob: &StageBlob) -> Result<Self, CascadeError> {
        Ok(serde_json::from_value(blob.params.clone())?)
    }

    pub fn input_len(&self) -> usize {
        self.weights.len()
    }

    fn activation(&self, input: &[f32]) -> f32 {
        let dot: f32 = if input.len() == self.weights.len() {
            self.weights.dot(&DVector::from_column_slice(input))
        } else {
            self.weights.iter().zip(input).map(|(w, x)| w * x).sum()
        };
        dot + self.bias
    }
}

impl Classifier for LogisticStage {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn predict(&self, input: &[f32]) -> f32 {
        sigmoid(self.activation(input))
    }

    fn train(
        &mut self,
        examples: &[Example<'_>],
        config: &TrainConfig,
        on_progress: &mut dyn FnMut(&TrainProgress),
    ) -> Result<TrainOutcome, CascadeError> {
        let Some(len) = uniform_input_len(examples)? else {
            return Ok(TrainOutcome::default());
        };
        if self.weights.is_empty() {
            self.weights = DVector::zeros(len);
        } else if self.weights.len() != len {
            return Err(CascadeError::FeatureLength {
                expected: self.weights.len(),
                found: len,
            });
        }

        let n = examples.len() as f32;
        let mut outcome = TrainOutcome::default();
        for iteration in 1..=config.iterations {
            let this = &*self;
            let (grad_w, grad_b, sq_err) = examples
                .par_iter()
                .map(|ex| {
                    let p = this.predict(ex.input);
                    let diff = p - ex.expected as f32;
                    (DVector::from_column_slice(ex.input) * diff, diff, diff * diff)
                })
                .reduce(
                    || (DVector::zeros(len), 0.0f32, 0.0f32),
                    |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
                );

            outcome = TrainOutcome {
                iterations: iteration,
                error: sq_err / n,
            };
            if config.log_period > 0 && iteration % config.log_period == 0 {
                debug!(
                    "LogisticStage::train iterations={} error={:.5}",
                    iteration, outcome.error
                );
                on_progress(&TrainProgress {
                    iterations: iteration,
                    error: outcome.error,
                });
            }
            if outcome.error < config.error_thresh {
                break;
            }

            let rate = config.learning_rate / n;
            self.weights -= grad_w * rate;
            self.bias -= grad_b * rate;
        }
        Ok(outcome)
    }

    fn serialize(&self) -> Result<StageBlob, CascadeError> {
        Ok(StageBlob {
            kind: Self::KIND.to_string(),
            params: serde_json::to_value(self)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrained_unit_is_undecided() {
        let stage = LogisticStage::new(4);
        assert!((stage.predict(&[1.0, 0.0, 0.3, 0.2]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn learns_a_separable_threshold() {
        let pos: Vec<[f32; 2]> = (0..10).map(|i| [0.7 + i as f32 * 0.03, 0.5]).collect();
        let neg: Vec<[f32; 2]> = (0..10).map(|i| [0.0 + i as f32 * 0.03, 0.5]).collect();
        let mut examples: Vec<Example<'_>> = pos.iter().map(|p| Example::positive(p)).collect();
        examples.extend(neg.iter().map(|n| Example::negative(n)));

        let mut stage = LogisticStage::new(2);
        let config = TrainConfig {
            iterations: 3000,
            error_thresh: 0.01,
            learning_rate: 2.0,
            log_period: 500,
        };
        let mut reports = 0usize;
        let outcome = stage
            .train(&examples, &config, &mut |_| reports += 1)
            .unwrap();
        assert!(outcome.error < 0.05, "error={}", outcome.error);
        for ex in &examples {
            assert_eq!(stage.predict(ex.input).round() as u8, ex.expected);
        }
        assert!(reports <= 3000 / 500);
    }

    #[test]
    fn empty_training_set_leaves_stage_unchanged() {
        let mut stage = LogisticStage::from_parts(vec![1.0, -1.0], 0.25);
        let before = stage.clone();
        let outcome = stage
            .train(&[], &TrainConfig::default(), &mut |_| {})
            .unwrap();
        assert_eq!(outcome, TrainOutcome::default());
        assert_eq!(stage, before);
    }

    #[test]
    fn rejects_examples_of_another_length() {
        let mut stage = LogisticStage::new(3);
        let input = [0.5, 0.5];
        let err = stage
            .train(&[Example::positive(&input)], &TrainConfig::default(), &mut |_| {})
            .unwrap_err();
        assert_eq!(
            err,
            CascadeError::FeatureLength {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn blob_round_trip_preserves_predictions() {
        let stage = LogisticStage::from_parts(vec![2.0, -3.0, 0.5], -0.1);
        let restored = LogisticStage::from_blob(&Classifier::serialize(&stage).unwrap()).unwrap();
        let input = [0.3, 0.1, 0.9];
        assert_eq!(restored.predict(&input), stage.predict(&input));
    }
}
