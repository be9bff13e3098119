use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::ingest_photos_use_case::IngestResult;
use crate::shared::photo_record::{FailedPhoto, PhotoRecord};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no photo {0} in manifest")]
    UnknownPhoto(PathBuf),
}

/// The analyzed photo set, persisted so grouping and review can re-run
/// without repeating detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub photos: Vec<PhotoRecord>,
    #[serde(default)]
    pub failed: Vec<FailedPhoto>,
}

impl From<IngestResult> for Manifest {
    fn from(result: IngestResult) -> Self {
        Self {
            photos: result.records,
            failed: result.failed,
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ManifestError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes pretty-printed JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flips the face flag of the photo at `photo`; returns its new value.
    pub fn toggle_face(&mut self, photo: &Path) -> Result<bool, ManifestError> {
        let record = self
            .photos
            .iter_mut()
            .find(|r| r.path() == photo)
            .ok_or_else(|| ManifestError::UnknownPhoto(photo.to_path_buf()))?;
        record.toggle_face();
        log::info!(
            "Marked {} as {}",
            photo.display(),
            if record.has_face() { "face" } else { "no face" }
        );
        Ok(record.has_face())
    }
}
