pub mod artifacts;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use crate::{config::Config, error::AppResult};

pub use artifacts::{read_hype_mapping, read_model, write_hype_mapping, write_model};
pub use tables::{read_anime_table, read_ratings, write_anime_table, write_ratings};

/// Locations of every file the pipeline reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir, &config.model_dir)
    }

    /// Normalized catalog before enrichment
    pub fn raw_anime(&self) -> PathBuf {
        self.data_dir.join("raw_anime_data.csv")
    }

    /// Catalog with hype scores
    pub fn processed_anime(&self) -> PathBuf {
        self.data_dir.join("processed_anime_data.csv")
    }

    pub fn ratings(&self) -> PathBuf {
        self.data_dir.join("synthetic_user_ratings.csv")
    }

    pub fn model(&self) -> PathBuf {
        self.model_dir.join("collaborative_filter.json")
    }

    pub fn hype_mapping(&self) -> PathBuf {
        self.model_dir.join("hype_data_mapping.json")
    }
}

/// Creates the parent directory of `path` if it does not exist yet
pub(crate) fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("anime-hype-{}", uuid::Uuid::new_v4()))
}
