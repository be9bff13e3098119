use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CLUSTER_GAP_MINUTES, DEFAULT_MAX_LINK_GAP_DAYS, DEFAULT_MIN_LINK_GAP_DAYS,
    DEFAULT_SIMILARITY_THRESHOLD, MS_PER_DAY, MS_PER_MINUTE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("similarity threshold must be between -1.0 and 1.0, got {0}")]
    Threshold(f64),
    #[error("cluster gap must be at least one minute")]
    ClusterGap,
    #[error("minimum link gap ({min} days) exceeds maximum link gap ({max} days)")]
    LinkWindow { min: u32, max: u32 },
}

/// Tunables for clustering and chain linking.
///
/// Missing fields in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Max gap between consecutive photos of one cluster.
    pub cluster_gap_minutes: u32,
    /// Inclusive lower bound on the gap between linked clusters.
    pub min_link_gap_days: u32,
    /// Inclusive upper bound on the gap between linked clusters.
    pub max_link_gap_days: u32,
    /// Minimum best-pair cosine similarity for a link.
    pub similarity_threshold: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            cluster_gap_minutes: DEFAULT_CLUSTER_GAP_MINUTES,
            min_link_gap_days: DEFAULT_MIN_LINK_GAP_DAYS,
            max_link_gap_days: DEFAULT_MAX_LINK_GAP_DAYS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl GroupingConfig {
    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Threshold(self.similarity_threshold));
        }
        if self.cluster_gap_minutes == 0 {
            return Err(ConfigError::ClusterGap);
        }
        if self.min_link_gap_days > self.max_link_gap_days {
            return Err(ConfigError::LinkWindow {
                min: self.min_link_gap_days,
                max: self.max_link_gap_days,
            });
        }
        Ok(())
    }

    pub fn cluster_gap_ms(&self) -> i64 {
        self.cluster_gap_minutes as i64 * MS_PER_MINUTE
    }

    pub fn min_link_gap_ms(&self) -> i64 {
        self.min_link_gap_days as i64 * MS_PER_DAY
    }

    pub fn max_link_gap_ms(&self) -> i64 {
        self.max_link_gap_days as i64 * MS_PER_DAY
    }
}
