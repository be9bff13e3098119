use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single face found by the detection collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    pub embedding: Vec<f32>,
    pub confidence: f64,
}

/// Face state of a photo.
///
/// `Pending` only exists between ingestion and detection. A record carries an
/// embedding only in the `Face` state; `MarkedFace` is a user correction that
/// flags a face the detector missed, so there is nothing to compare against.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FaceState {
    #[default]
    Pending,
    NoFace,
    Face {
        embedding: Vec<f32>,
        confidence: f64,
    },
    MarkedFace,
}

/// Uniform per-photo record consumed by grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub path: PathBuf,
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub face: FaceState,
}

impl PhotoRecord {
    /// Creates a record awaiting detection.
    pub fn new(path: impl Into<PathBuf>, timestamp: Option<NaiveDateTime>) -> Self {
        Self {
            path: path.into(),
            timestamp,
            face: FaceState::Pending,
        }
    }

    /// Creates a record with a known detection outcome.
    pub fn detected(
        path: impl Into<PathBuf>,
        timestamp: Option<NaiveDateTime>,
        detection: Option<FaceDetection>,
    ) -> Self {
        let mut record = Self::new(path, timestamp);
        record.face = face_state_for(detection);
        record
    }

    /// Stores the detection collaborator's outcome.
    ///
    /// A failed detection is a definitive "no face". Only a pending record
    /// accepts a result; later calls are ignored.
    pub fn apply_detection<E: Display>(&mut self, outcome: Result<Option<FaceDetection>, E>) {
        if !self.is_pending() {
            log::warn!(
                "Ignoring repeated detection result for {}",
                self.path.display()
            );
            return;
        }
        self.face = match outcome {
            Ok(detection) => face_state_for(detection),
            Err(e) => {
                log::warn!("Face detection failed for {}: {e}", self.path.display());
                FaceState::NoFace
            }
        };
    }

    /// Flips the face flag as a manual correction.
    ///
    /// Turning the flag off discards any embedding. Turning it on marks a
    /// face without an embedding.
    pub fn toggle_face(&mut self) {
        self.face = if self.has_face() {
            FaceState::NoFace
        } else {
            FaceState::MarkedFace
        };
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.face, FaceState::Pending)
    }

    /// Pending records count as face-less.
    pub fn has_face(&self) -> bool {
        matches!(self.face, FaceState::Face { .. } | FaceState::MarkedFace)
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        match &self.face {
            FaceState::Face { embedding, .. } => Some(embedding),
            _ => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match &self.face {
            FaceState::Face { confidence, .. } => *confidence,
            _ => 0.0,
        }
    }
}

/// A photo that could not be decoded; never enters grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedPhoto {
    pub path: PathBuf,
    pub error: String,
}

fn face_state_for(detection: Option<FaceDetection>) -> FaceState {
    match detection {
        Some(FaceDetection {
            embedding,
            confidence,
        }) => FaceState::Face {
            embedding,
            confidence: confidence.clamp(0.0, 1.0),
        },
        None => FaceState::NoFace,
    }
}
