//! JSON configuration of the command-line tools.
//!
//! Each tool reads one file given as its first argument. Sections marked
//! `#[serde(default)]` may be omitted.

pub mod scan;
pub mod train;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Pair of directories holding positive and negative sample images.
#[derive(Clone, Debug, Deserialize)]
pub struct SampleDirs {
    pub positive_dir: PathBuf,
    pub negative_dir: PathBuf,
}

pub(crate) fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
