#![doc = include_str!("../README.md")]

// Core: the cascade state machine, scan geometry and scoring.
pub mod cascade;
pub mod pyramid;
pub mod scanner;
pub mod scoring;

// Contracts and their reference implementations.
pub mod classifier;
pub mod features;
pub mod image;

// Training support, parallel inference and tooling.
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod promotion;
pub mod workers;

// --- High-level re-exports -------------------------------------------------

pub use crate::cascade::{Cascade, CascadeSnapshot, TrainSummary};
pub use crate::classifier::{BuiltinDecoder, Classifier, StageBlob, StageDecoder, StageKind};
pub use crate::dataset::EvaluationDataset;
pub use crate::error::{CascadeError, ErrorKind};
pub use crate::features::{FeatureExtractor, GridFeatureExtractor};
pub use crate::promotion::{PromotionDecision, StagePromoter};
pub use crate::pyramid::{Dims, ScalePyramid};
pub use crate::scanner::MultiScaleScanner;
pub use crate::scoring::{AccuracyScorer, ScoreOptions, ScoreResult};
pub use crate::workers::WorkerPool;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use cascade_detector::prelude::*;
///
/// # fn main() -> Result<(), CascadeError> {
/// let frame = ImageF32::new(320, 240);
/// let mut cascade = Cascade::new();
/// let mut scanner = MultiScaleScanner::new(GridFeatureExtractor::default());
/// scanner.configure(frame.w, frame.h, 10)?;
///
/// let report = scanner.detect(&frame, &mut cascade)?;
/// println!("detections={} total_ms={:.3}", report.detections().count(), report.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, ImageU8};
    pub use crate::{
        AccuracyScorer, BuiltinDecoder, Cascade, CascadeError, EvaluationDataset,
        GridFeatureExtractor, MultiScaleScanner, StageKind,
    };
}
