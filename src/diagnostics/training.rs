use super::timing::TimingBreakdown;
use crate::cascade::TrainSummary;
use crate::classifier::StageKind;
use crate::promotion::PromotionDecision;
use crate::scoring::ScoreResult;
use serde::Serialize;

/// Evaluation statistics kept in reports (the per-example detail is dropped).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub score: f64,
    pub success_rate: f64,
    pub fail_count: usize,
    pub positive_fail_count: usize,
    pub negative_fail_count: usize,
    pub positive_accuracy: f64,
    pub negative_accuracy: f64,
    pub average_latency_ms: f64,
}

impl From<&ScoreResult> for ScoreSummary {
    fn from(result: &ScoreResult) -> Self {
        Self {
            score: result.score,
            success_rate: result.success_rate,
            fail_count: result.fail_count,
            positive_fail_count: result.positive_fail_count,
            negative_fail_count: result.negative_fail_count,
            positive_accuracy: result.positive_accuracy,
            negative_accuracy: result.negative_accuracy,
            average_latency_ms: result.average_latency_ms,
        }
    }
}

/// One train / score / promote round of the training tool.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRoundReport {
    pub round: usize,
    pub stage_kind: StageKind,
    pub train: TrainSummary,
    pub evaluation: ScoreSummary,
    pub decision: PromotionDecision,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub feature_len: usize,
    pub training_examples: usize,
    pub evaluation_examples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<ScoreSummary>,
    pub rounds: Vec<TrainingRoundReport>,
    pub final_stages: usize,
    pub best_score: f64,
    pub timings: TimingBreakdown,
}

impl TrainingReport {
    pub fn promoted_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.decision.promoted()).count()
    }
}
