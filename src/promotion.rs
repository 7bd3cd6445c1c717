//! Keeps the best known score and decides the fate of each candidate stage.
use crate::cascade::Cascade;
use crate::dataset::EvaluationDataset;
use crate::error::CascadeError;
use crate::scoring::{AccuracyScorer, ScoreResult};
use log::info;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum PromotionDecision {
    /// Candidate joined the cascade, which now has `stages` stages.
    Promoted { score: f64, stages: usize },
    /// Candidate was dropped; `best` is the score it failed to beat.
    Discarded { score: f64, best: f64 },
}

impl PromotionDecision {
    pub fn promoted(&self) -> bool {
        matches!(self, PromotionDecision::Promoted { .. })
    }

    pub fn score(&self) -> f64 {
        match *self {
            PromotionDecision::Promoted { score, .. }
            | PromotionDecision::Discarded { score, .. } => score,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StagePromoter {
    scorer: AccuracyScorer,
    best: f64,
}

impl StagePromoter {
    /// Seed the best score from the accepted stages of `cascade`. An empty
    /// cascade rejects everything and is scored like any other.
    pub fn with_baseline(
        scorer: AccuracyScorer,
        cascade: &mut Cascade,
        dataset: &EvaluationDataset,
    ) -> Result<(Self, ScoreResult), CascadeError> {
        if cascade.has_candidate() {
            return Err(CascadeError::CandidatePending);
        }
        let baseline = scorer.evaluate(cascade, dataset)?;
        info!(
            "Baseline score {:.3} with {} stages",
            baseline.score,
            cascade.len()
        );
        Ok((
            Self {
                scorer,
                best: baseline.score,
            },
            baseline,
        ))
    }

    pub fn best_score(&self) -> f64 {
        self.best
    }

    /// Score the pending candidate, then promote it if it strictly improves
    /// the best score, otherwise discard it.
    pub fn review(
        &mut self,
        cascade: &mut Cascade,
        dataset: &EvaluationDataset,
    ) -> Result<(PromotionDecision, ScoreResult), CascadeError> {
        if !cascade.has_candidate() {
            return Err(CascadeError::NoCandidate);
        }
        let result = self.scorer.evaluate(cascade, dataset)?;
        let score = result.score;
        let best = self.best;
        let decision = if score > best {
            let stages = cascade.promote()?;
            self.best = score;
            info!("Promoted candidate: score {score:.3}, {stages} stages");
            PromotionDecision::Promoted { score, stages }
        } else {
            cascade.discard()?;
            info!("Discarded candidate: score {score:.3} does not beat {best:.3}");
            PromotionDecision::Discarded { score, best }
        };
        Ok((decision, result))
    }
}
