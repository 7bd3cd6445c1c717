//! Labeled feature vectors split into positives (expected 1) and negatives
//! (expected 0), plus loading from image directories.
use crate::classifier::Example;
use crate::error::CascadeError;
use crate::features::FeatureExtractor;
use crate::image::io::{list_image_files, load_grayscale_image};
use crate::pyramid::Dims;
use log::info;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationDataset {
    pub positive: Vec<Vec<f32>>,
    pub negative: Vec<Vec<f32>>,
}

impl EvaluationDataset {
    pub fn new(positive: Vec<Vec<f32>>, negative: Vec<Vec<f32>>) -> Self {
        Self { positive, negative }
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positives first, then negatives, each in stored order.
    pub fn examples(&self) -> impl Iterator<Item = Example<'_>> + '_ {
        self.positive
            .iter()
            .map(|v| Example::positive(v))
            .chain(self.negative.iter().map(|v| Example::negative(v)))
    }

    /// Scoring divides by both class sizes, so both must be populated.
    pub fn require_both_classes(&self) -> Result<(), CascadeError> {
        if self.positive.is_empty() || self.negative.is_empty() {
            return Err(CascadeError::MissingClass {
                positive: self.positive.len(),
                negative: self.negative.len(),
            });
        }
        Ok(())
    }
}

/// Extract one feature vector per image file of `positive_dir` and
/// `negative_dir`, at `window` dimensions and scale 1.
pub fn load_image_dataset<E: FeatureExtractor>(
    positive_dir: &Path,
    negative_dir: &Path,
    window: Dims,
    extractor: &mut E,
) -> Result<EvaluationDataset, String> {
    extractor.configure(window);
    let positive = load_dir(positive_dir, window, extractor)?;
    let negative = load_dir(negative_dir, window, extractor)?;
    info!(
        "Loaded data set: {} positive from {}, {} negative from {}",
        positive.len(),
        positive_dir.display(),
        negative.len(),
        negative_dir.display()
    );
    Ok(EvaluationDataset::new(positive, negative))
}

fn load_dir<E: FeatureExtractor>(
    dir: &Path,
    window: Dims,
    extractor: &mut E,
) -> Result<Vec<Vec<f32>>, String> {
    list_image_files(dir)?
        .iter()
        .map(|path| {
            let gray = load_grayscale_image(path)?;
            Ok(extractor.extract(&gray.to_f32(), window, 1.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_keep_class_order_and_labels() {
        let ds = EvaluationDataset::new(vec![vec![1.0], vec![2.0]], vec![vec![3.0]]);
        let labels: Vec<(f32, u8)> = ds.examples().map(|e| (e.input[0], e.expected)).collect();
        assert_eq!(labels, vec![(1.0, 1), (2.0, 1), (3.0, 0)]);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn missing_class_is_reported_with_counts() {
        let ds = EvaluationDataset::new(vec![vec![1.0]], Vec::new());
        assert_eq!(
            ds.require_both_classes(),
            Err(CascadeError::MissingClass {
                positive: 1,
                negative: 0
            })
        );
        assert!(EvaluationDataset::default().require_both_classes().is_err());
    }
}
