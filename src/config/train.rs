use super::{read_config, SampleDirs};
use crate::classifier::{StageKind, TrainConfig};
use crate::features::GridFeatureOptions;
use crate::pyramid::Dims;
use crate::scoring::ScoreOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TrainToolConfig {
    pub training: SampleDirs,
    /// Held-out samples used to score candidates. Defaults to `training`.
    #[serde(default)]
    pub evaluation: Option<SampleDirs>,
    /// Size every sample is resampled to before feature extraction.
    #[serde(default = "default_window")]
    pub window: Dims,
    #[serde(default)]
    pub features: GridFeatureOptions,
    #[serde(default)]
    pub stages: StageSchedule,
    #[serde(default)]
    pub score: ScoreOptions,
    /// Previously exported cascade to continue from.
    #[serde(default)]
    pub initial_cascade: Option<PathBuf>,
    pub output: TrainOutputConfig,
}

fn default_window() -> Dims {
    Dims::new(24, 24)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StageSchedule {
    /// Candidate kind per round; the last entry repeats once the list runs out.
    pub kinds: Vec<StageKind>,
    /// Number of train / score / promote rounds.
    pub rounds: usize,
    pub train: TrainConfig,
}

impl Default for StageSchedule {
    fn default() -> Self {
        Self {
            kinds: vec![StageKind::Logistic],
            rounds: 4,
            train: TrainConfig::default(),
        }
    }
}

impl StageSchedule {
    pub fn kind_for_round(&self, round: usize) -> StageKind {
        self.kinds
            .get(round)
            .or_else(|| self.kinds.last())
            .copied()
            .unwrap_or(StageKind::Logistic)
    }
}

#[derive(Debug, Deserialize)]
pub struct TrainOutputConfig {
    pub cascade_json: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<TrainToolConfig, String> {
    read_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let json = r#"{
            "training": {"positive_dir": "pos", "negative_dir": "neg"},
            "output": {"cascade_json": "out/cascade.json"}
        }"#;
        let config: TrainToolConfig = serde_json::from_str(json).unwrap();
        assert!(config.evaluation.is_none());
        assert_eq!(config.window, Dims::new(24, 24));
        assert_eq!(config.features.cells, 5);
        assert_eq!(config.stages.rounds, 4);
        assert_eq!(config.stages.train.iterations, 2000);
        assert!(config.output.report_json.is_none());
    }

    #[test]
    fn stage_kinds_repeat_the_last_entry() {
        let json = r#"{
            "training": {"positive_dir": "p", "negative_dir": "n"},
            "window": {"w": 32, "h": 16},
            "stages": {"kinds": ["stump", "logistic"], "rounds": 5,
                       "train": {"iterations": 50}},
            "output": {"cascade_json": "c.json", "report_json": "r.json"}
        }"#;
        let config: TrainToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.window, Dims::new(32, 16));
        assert_eq!(config.stages.kind_for_round(0), StageKind::Stump);
        assert_eq!(config.stages.kind_for_round(1), StageKind::Logistic);
        assert_eq!(config.stages.kind_for_round(4), StageKind::Logistic);
        assert_eq!(config.stages.train.iterations, 50);
        assert_eq!(config.stages.train.log_period, 100);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_config(Path::new("/nonexistent/train.json")).unwrap_err();
        assert!(err.contains("Failed to read config"));
    }
}
