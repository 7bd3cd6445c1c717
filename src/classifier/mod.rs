//! Trainable binary stages used by the cascade.
//!
//! The cascade depends only on the [`Classifier`] capability: predict a
//! scalar in `[0, 1]` for a feature vector, train incrementally from labeled
//! examples, and serialize into an opaque [`StageBlob`]. Reconstruction from
//! a blob goes through a [`StageDecoder`], so snapshots can be loaded on any
//! thread without knowing the concrete stage types up front.
pub mod logistic;
pub mod stump;

use crate::error::CascadeError;
use serde::{Deserialize, Serialize};

pub use logistic::LogisticStage;
pub use stump::StumpStage;

/// Borrowed labeled feature vector. `expected` is 1 (present) or 0 (absent).
#[derive(Clone, Copy, Debug)]
pub struct Example<'a> {
    pub input: &'a [f32],
    pub expected: u8,
}

impl<'a> Example<'a> {
    pub fn positive(input: &'a [f32]) -> Self {
        Self { input, expected: 1 }
    }

    pub fn negative(input: &'a [f32]) -> Self {
        Self { input, expected: 0 }
    }
}

/// Knobs shared by the built-in stage trainers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Upper bound on training iterations.
    pub iterations: usize,
    /// Stop once the training error drops below this value.
    pub error_thresh: f32,
    pub learning_rate: f32,
    /// Report progress every `log_period` iterations (0 disables reporting).
    pub log_period: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iterations: 2000,
            error_thresh: 0.005,
            learning_rate: 0.5,
            log_period: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainProgress {
    pub iterations: usize,
    pub error: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainOutcome {
    pub iterations: usize,
    pub error: f32,
}

/// Opaque serialized stage: a kind tag plus stage-specific parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageBlob {
    pub kind: String,
    pub params: serde_json::Value,
}

pub trait Classifier: Send {
    /// Tag written into [`StageBlob::kind`].
    fn kind(&self) -> &'static str;

    /// Scalar output in `[0, 1]`; values at or above 0.5 count as present.
    fn predict(&self, input: &[f32]) -> f32;

    fn train(
        &mut self,
        examples: &[Example<'_>],
        config: &TrainConfig,
        on_progress: &mut dyn FnMut(&TrainProgress),
    ) -> Result<TrainOutcome, CascadeError>;

    fn serialize(&self) -> Result<StageBlob, CascadeError>;
}

/// Rebuilds stages from blobs.
pub trait StageDecoder: Send + Sync {
    fn decode(&self, blob: &StageBlob) -> Result<Box<dyn Classifier>, CascadeError>;
}

/// Decodes the stage kinds shipped with this crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinDecoder;

impl StageDecoder for BuiltinDecoder {
    fn decode(&self, blob: &StageBlob) -> Result<Box<dyn Classifier>, CascadeError> {
        match blob.kind.as_str() {
            LogisticStage::KIND => Ok(Box::new(LogisticStage::from_blob(blob)?)),
            StumpStage::KIND => Ok(Box::new(StumpStage::from_blob(blob)?)),
            other => Err(CascadeError::UnknownStageKind(other.to_string())),
        }
    }
}

/// Stage variant selector used by the tools' configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Logistic,
    Stump,
}

impl StageKind {
    /// Fresh untrained stage for vectors of length `input_len`.
    pub fn build(self, input_len: usize) -> Box<dyn Classifier> {
        match self {
            StageKind::Logistic => Box::new(LogisticStage::new(input_len)),
            StageKind::Stump => Box::new(StumpStage::default()),
        }
    }
}

/// Common input-length check for trainers: all examples must share a length.
pub(crate) fn uniform_input_len(examples: &[Example<'_>]) -> Result<Option<usize>, CascadeError> {
    let Some(first) = examples.first() else {
        return Ok(None);
    };
    let expected = first.input.len();
    if let Some(bad) = examples.iter().find(|ex| ex.input.len() != expected) {
        return Err(CascadeError::FeatureLength {
            expected,
            found: bad.input.len(),
        });
    }
    Ok(Some(expected))
}
