use super::read_config;
use crate::features::GridFeatureOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ScanToolConfig {
    pub input: PathBuf,
    /// Cascade exported by `train_cascade`.
    pub cascade: PathBuf,
    #[serde(default)]
    pub scan: ScanParams,
    #[serde(default)]
    pub features: GridFeatureOptions,
    #[serde(default)]
    pub output: ScanOutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Number of pyramid levels requested (1..=200).
    pub stage_count: usize,
    /// Worker threads classifying the levels; 1 classifies in process.
    pub threads: usize,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            stage_count: 10,
            threads: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanOutputConfig {
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<ScanToolConfig, String> {
    read_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_section_defaults() {
        let json = r#"{"input": "frame.png", "cascade": "cascade.json"}"#;
        let config: ScanToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scan.stage_count, 10);
        assert_eq!(config.scan.threads, 1);
        assert!(config.output.report_json.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let json = r#"{
            "input": "frame.png", "cascade": "cascade.json",
            "scan": {"stage_count": 4, "threads": 3},
            "features": {"cells": 3},
            "output": {"report_json": "scan.json"}
        }"#;
        let config: ScanToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scan.stage_count, 4);
        assert_eq!(config.scan.threads, 3);
        assert_eq!(config.features.cells, 3);
        assert_eq!(
            config.output.report_json.as_deref(),
            Some(Path::new("scan.json"))
        );
    }
}
