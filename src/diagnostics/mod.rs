//! Serializable reports produced by the scanner and the command-line tools.
//!
//! `ScanReport` is returned by every multi-scale pass; `TrainingReport` is
//! assembled by `train_cascade` from the per-round summaries.

pub mod pyramid;
pub mod scan;
pub mod timing;
pub mod training;

pub use pyramid::{PyramidStage, ScaleLevelReport};
pub use scan::{ScaleObservation, ScanReport};
pub use timing::{StageTiming, TimingBreakdown};
pub use training::{ScoreSummary, TrainingReport, TrainingRoundReport};
