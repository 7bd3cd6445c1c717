//! Rejection cascade of binary stages with a single pending candidate.
//!
//! Inference walks the accepted stages in append order. A stage is only
//! consulted while every earlier stage has answered 0; the first stage whose
//! rounded output is 1 ends the walk. Training builds the candidate's data
//! set from the accepted cascade's mistakes:
//!
//! - with no accepted stage every example is relevant;
//! - an example is relevant when the accepted cascade answers 0 or the
//!   example is negative (negatives are always retrained so every stage stays
//!   conservative on false positives);
//! - positives the accepted cascade already gets right are skipped, which
//!   lets the candidate specialize on the remaining positives.
//!
//! The candidate only joins `stages` through [`Cascade::promote`].
use crate::classifier::{
    Classifier, Example, StageBlob, StageDecoder, TrainConfig, TrainOutcome, TrainProgress,
};
use crate::dataset::EvaluationDataset;
use crate::error::CascadeError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Ordered serialized stages. Never contains a candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeSnapshot {
    pub stages: Vec<StageBlob>,
}

impl CascadeSnapshot {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Partition of a training pass and the candidate's own training outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSummary {
    pub relevant_positive: usize,
    pub relevant_negative: usize,
    /// Positives already handled by the accepted stages.
    pub skipped: usize,
    pub outcome: TrainOutcome,
}

impl TrainSummary {
    pub fn relevant(&self) -> usize {
        self.relevant_positive + self.relevant_negative
    }
}

#[derive(Default)]
pub struct Cascade {
    stages: Vec<Box<dyn Classifier>>,
    trainee: Option<Box<dyn Classifier>>,
    process_time_ms: f64,
}

#[inline]
fn round_output(value: f32) -> u8 {
    // Ties round up, matching round-half-away-from-zero on [0, 1].
    value.clamp(0.0, 1.0).round() as u8
}

impl Cascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stages(stages: Vec<Box<dyn Classifier>>) -> Self {
        Self {
            stages,
            trainee: None,
            process_time_ms: 0.0,
        }
    }

    /// Build a cascade from an exported snapshot.
    pub fn from_snapshot(
        snapshot: &CascadeSnapshot,
        decoder: &dyn StageDecoder,
    ) -> Result<Self, CascadeError> {
        let mut cascade = Self::new();
        cascade.import(snapshot, decoder)?;
        Ok(cascade)
    }

    /// Number of accepted stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn has_candidate(&self) -> bool {
        self.trainee.is_some()
    }

    /// Summed stage time of the last [`Cascade::run`], in milliseconds.
    pub fn process_time_ms(&self) -> f64 {
        self.process_time_ms
    }

    /// Classify with the accepted stages only. Returns 0 or 1.
    pub fn run(&mut self, input: &[f32]) -> u8 {
        self.process_time_ms = 0.0;
        let mut result = 0u8;
        for stage in &self.stages {
            if result != 0 {
                break;
            }
            let start = Instant::now();
            result = round_output(stage.predict(input));
            self.process_time_ms += start.elapsed().as_secs_f64() * 1000.0;
        }
        result
    }

    /// Classify as if the pending candidate were already promoted.
    pub fn test_run(&mut self, input: &[f32]) -> u8 {
        let Some(trainee) = self.trainee.as_deref() else {
            return self.run(input);
        };
        let mut result = 0u8;
        for stage in self.stages.iter().map(|s| &**s).chain(Some(trainee)) {
            if result != 0 {
                break;
            }
            result = round_output(stage.predict(input));
        }
        result
    }

    /// Install a candidate stage. Fails if one is already pending.
    pub fn begin_candidate(&mut self, classifier: Box<dyn Classifier>) -> Result<(), CascadeError> {
        if self.trainee.is_some() {
            return Err(CascadeError::CandidatePending);
        }
        debug!("Cascade::begin_candidate kind={}", classifier.kind());
        self.trainee = Some(classifier);
        Ok(())
    }

    /// Append the candidate to the accepted stages. Returns the new stage count.
    pub fn promote(&mut self) -> Result<usize, CascadeError> {
        let trainee = self.trainee.take().ok_or(CascadeError::NoCandidate)?;
        self.stages.push(trainee);
        info!("Promoted candidate to stage {}", self.stages.len());
        Ok(self.stages.len())
    }

    /// Drop the candidate without promoting it.
    pub fn discard(&mut self) -> Result<Box<dyn Classifier>, CascadeError> {
        let trainee = self.trainee.take().ok_or(CascadeError::NoCandidate)?;
        debug!("Cascade::discard kind={}", trainee.kind());
        Ok(trainee)
    }

    /// Train the candidate on the examples the accepted stages mishandle,
    /// plus every negative.
    pub fn train(
        &mut self,
        dataset: &EvaluationDataset,
        config: &TrainConfig,
        on_progress: &mut dyn FnMut(&TrainProgress),
    ) -> Result<TrainSummary, CascadeError> {
        if self.trainee.is_none() {
            return Err(CascadeError::NoCandidate);
        }

        let mut relevant: Vec<Example<'_>> = Vec::with_capacity(dataset.len());
        let mut summary = TrainSummary::default();
        let first_stage = self.stages.is_empty();
        if first_stage {
            debug!("Candidate is the first stage, training on all {} examples", dataset.len());
        }
        for example in dataset.examples() {
            let keep = if first_stage {
                true
            } else {
                let result = self.run(example.input);
                result == 0 || example.expected == 0 || result != example.expected
            };
            if keep {
                if example.expected == 0 {
                    summary.relevant_negative += 1;
                } else {
                    summary.relevant_positive += 1;
                }
                relevant.push(example);
            } else {
                summary.skipped += 1;
            }
        }
        if summary.skipped > 0 {
            info!(
                "Accepted stages already recognize {} positives; candidate specializes on the remaining {}",
                summary.skipped,
                dataset.positive.len() - summary.skipped
            );
        }

        let trainee = self.trainee.as_mut().ok_or(CascadeError::NoCandidate)?;
        summary.outcome = trainee.train(&relevant, config, on_progress)?;
        debug!(
            "Cascade::train relevant={} skipped={} iterations={} error={:.5}",
            summary.relevant(),
            summary.skipped,
            summary.outcome.iterations,
            summary.outcome.error
        );
        Ok(summary)
    }

    /// Serialize the accepted stages in order.
    pub fn export(&self) -> Result<CascadeSnapshot, CascadeError> {
        let stages = self
            .stages
            .iter()
            .map(|stage| stage.serialize())
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Exported cascade with {} stages", stages.len());
        Ok(CascadeSnapshot { stages })
    }

    /// Append the snapshot's stages. Either every stage decodes and is
    /// appended, or the cascade is left untouched.
    pub fn import(
        &mut self,
        snapshot: &CascadeSnapshot,
        decoder: &dyn StageDecoder,
    ) -> Result<(), CascadeError> {
        let decoded = snapshot
            .stages
            .iter()
            .map(|blob| decoder.decode(blob))
            .collect::<Result<Vec<_>, _>>()?;
        self.stages.extend(decoded);
        debug!("Imported cascade, now {} stages", self.stages.len());
        Ok(())
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.kind()).collect::<Vec<_>>(),
            )
            .field("trainee", &self.trainee.as_ref().map(|t| t.kind()))
            .field("process_time_ms", &self.process_time_ms)
            .finish()
    }
}
