//! Accuracy scoring of a cascade (optionally with its pending candidate)
//! against a labeled evaluation set.
//!
//! Every correct example adds 1 to the score. A miss subtracts the
//! class-imbalance weight of its class: the size of the larger class over
//! the size of its own class when its class is the minority, 1 otherwise.
//! A cascade that is perfect on the minority class is therefore not
//! outscored by one that only handles the majority class.
use crate::cascade::Cascade;
use crate::dataset::EvaluationDataset;
use crate::error::CascadeError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScoreOptions {
    /// Log each example's verdict at debug level and the summary at info level.
    pub logging: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleClass {
    Positive,
    Negative,
}

impl ExampleClass {
    pub fn expected(self) -> u8 {
        match self {
            ExampleClass::Positive => 1,
            ExampleClass::Negative => 0,
        }
    }
}

/// Verdict for one example; `index` is its position within its class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleOutcome {
    pub class: ExampleClass,
    pub index: usize,
    pub verdict: u8,
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: f64,
    /// Percentage of all examples classified correctly.
    pub success_rate: f64,
    pub fail_count: usize,
    pub positive_fail_count: usize,
    pub negative_fail_count: usize,
    pub positive_accuracy: f64,
    pub negative_accuracy: f64,
    pub average_latency_ms: f64,
    #[serde(skip)]
    pub execution_times_ms: Vec<f64>,
    #[serde(skip)]
    pub outcomes: Vec<ExampleOutcome>,
}

impl ScoreResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AccuracyScorer {
    options: ScoreOptions,
}

/// Penalty for a miss in a class of `own` examples when the other class has
/// `other`.
fn imbalance_weight(own: usize, other: usize) -> f64 {
    if own < other {
        other as f64 / own as f64
    } else {
        1.0
    }
}

impl AccuracyScorer {
    pub fn new(options: ScoreOptions) -> Self {
        Self { options }
    }

    /// Score `cascade` on `dataset`. When a candidate is pending the
    /// evaluation runs with it (`test_run`), otherwise with the accepted
    /// stages only.
    pub fn evaluate(
        &self,
        cascade: &mut Cascade,
        dataset: &EvaluationDataset,
    ) -> Result<ScoreResult, CascadeError> {
        dataset.require_both_classes()?;
        let with_candidate = cascade.has_candidate();
        let n_pos = dataset.positive.len();
        let n_neg = dataset.negative.len();

        let mut score = 0.0f64;
        let mut positive_fail_count = 0usize;
        let mut negative_fail_count = 0usize;
        let mut execution_times_ms = Vec::with_capacity(dataset.len());
        let mut outcomes = Vec::with_capacity(dataset.len());

        let classes = [
            (ExampleClass::Positive, &dataset.positive, imbalance_weight(n_pos, n_neg)),
            (ExampleClass::Negative, &dataset.negative, imbalance_weight(n_neg, n_pos)),
        ];
        for (class, inputs, weight) in classes {
            let expected = class.expected();
            for (index, input) in inputs.iter().enumerate() {
                let start = Instant::now();
                let verdict = if with_candidate {
                    cascade.test_run(input)
                } else {
                    cascade.run(input)
                };
                execution_times_ms.push(start.elapsed().as_secs_f64() * 1000.0);
                if self.options.logging {
                    debug!("Should output [{expected}] -> [{verdict}]");
                }
                let passed = verdict == expected;
                if passed {
                    score += 1.0;
                } else {
                    score -= weight;
                    match class {
                        ExampleClass::Positive => positive_fail_count += 1,
                        ExampleClass::Negative => negative_fail_count += 1,
                    }
                }
                outcomes.push(ExampleOutcome {
                    class,
                    index,
                    verdict,
                    passed,
                });
            }
        }

        let total = dataset.len();
        let fail_count = positive_fail_count + negative_fail_count;
        let success_rate = 100.0 * (total - fail_count) as f64 / total as f64;
        let average_latency_ms = execution_times_ms.iter().sum::<f64>() / total as f64;
        let result = ScoreResult {
            score,
            success_rate,
            fail_count,
            positive_fail_count,
            negative_fail_count,
            positive_accuracy: 100.0 * (n_pos - positive_fail_count) as f64 / n_pos as f64,
            negative_accuracy: 100.0 * (n_neg - negative_fail_count) as f64 / n_neg as f64,
            average_latency_ms,
            execution_times_ms,
            outcomes,
        };
        if self.options.logging {
            info!("Success rate: {:.2}%", result.success_rate);
            info!("Average execution time: {:.4}ms", result.average_latency_ms);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StumpStage;

    /// Positives carry 1.0 in feature 0, negatives 0.0.
    fn dataset(n_pos: usize, n_neg: usize) -> EvaluationDataset {
        EvaluationDataset::new(vec![vec![1.0]; n_pos], vec![vec![0.0]; n_neg])
    }

    fn perfect_cascade() -> Cascade {
        Cascade::with_stages(vec![Box::new(StumpStage::new(0, 0.5, true))])
    }

    #[test]
    fn all_correct_scores_one_per_example() {
        let mut cascade = perfect_cascade();
        let result = AccuracyScorer::default()
            .evaluate(&mut cascade, &dataset(10, 5))
            .unwrap();
        assert_eq!(result.score, 15.0);
        assert_eq!(result.success_rate, 100.0);
        assert_eq!(result.fail_count, 0);
        assert_eq!(result.positive_fail_count, 0);
        assert_eq!(result.negative_fail_count, 0);
        assert_eq!(result.total(), 15);
        assert_eq!(result.execution_times_ms.len(), 15);
    }

    #[test]
    fn minority_miss_costs_the_imbalance_weight() {
        let mut cascade = perfect_cascade();
        let mut ds = dataset(10, 5);
        ds.negative[2] = vec![1.0];
        let result = AccuracyScorer::default()
            .evaluate(&mut cascade, &ds)
            .unwrap();
        assert_eq!(result.fail_count, 1);
        assert_eq!(result.negative_fail_count, 1);
        assert_eq!(result.positive_fail_count, 0);
        assert!((result.score - 12.0).abs() < 1e-12);
        assert!((result.negative_accuracy - 80.0).abs() < 1e-12);
        let failed: Vec<_> = result.outcomes.iter().filter(|o| !o.passed).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].class, ExampleClass::Negative);
        assert_eq!(failed[0].index, 2);
    }

    #[test]
    fn majority_miss_costs_one() {
        let mut cascade = perfect_cascade();
        let mut ds = dataset(10, 5);
        ds.positive[0] = vec![0.0];
        let result = AccuracyScorer::default()
            .evaluate(&mut cascade, &ds)
            .unwrap();
        assert_eq!(result.positive_fail_count, 1);
        assert!((result.score - 13.0).abs() < 1e-12);
        assert!((result.success_rate - 100.0 * 14.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn missing_class_is_a_data_error() {
        let mut cascade = perfect_cascade();
        let err = AccuracyScorer::default()
            .evaluate(&mut cascade, &dataset(4, 0))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
        assert!(AccuracyScorer::default()
            .evaluate(&mut cascade, &dataset(0, 0))
            .is_err());
    }

    #[test]
    fn pending_candidate_is_evaluated() {
        let mut cascade = Cascade::new();
        let ds = dataset(3, 3);
        let without = AccuracyScorer::default()
            .evaluate(&mut cascade, &ds)
            .unwrap();
        assert_eq!(without.positive_fail_count, 3);

        cascade
            .begin_candidate(Box::new(StumpStage::new(0, 0.5, true)))
            .unwrap();
        let with = AccuracyScorer::new(ScoreOptions { logging: true })
            .evaluate(&mut cascade, &ds)
            .unwrap();
        assert_eq!(with.fail_count, 0);
        assert!(cascade.has_candidate());
    }
}
