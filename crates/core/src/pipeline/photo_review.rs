use std::fmt;
use std::str::FromStr;

use crate::shared::photo_record::{FailedPhoto, FaceState, PhotoRecord};

/// Which photos to show for manual review.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReviewFilter {
    #[default]
    All,
    Face,
    NoFace,
    Failed,
}

impl FromStr for ReviewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "face" => Ok(Self::Face),
            "no-face" | "noface" => Ok(Self::NoFace),
            "failed" => Ok(Self::Failed),
            other => Err(format!(
                "unknown filter '{other}' (expected all, face, no-face or failed)"
            )),
        }
    }
}

impl fmt::Display for ReviewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Face => "face",
            Self::NoFace => "no-face",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Photos selected for review, most doubtful first.
#[derive(Debug, Default)]
pub struct Review<'a> {
    pub photos: Vec<&'a PhotoRecord>,
    pub failed: Vec<&'a FailedPhoto>,
}

/// Distance of the detector confidence from a coin flip; smaller is less certain.
pub fn certainty(record: &PhotoRecord) -> f64 {
    (record.confidence() - 0.5).abs()
}

/// Applies `filter` and orders the photos by ascending [`certainty`].
/// The sort is stable, so equally certain photos keep manifest order.
pub fn review<'a>(
    records: &'a [PhotoRecord],
    failed: &'a [FailedPhoto],
    filter: ReviewFilter,
) -> Review<'a> {
    if filter == ReviewFilter::Failed {
        return Review {
            photos: Vec::new(),
            failed: failed.iter().collect(),
        };
    }

    let mut photos: Vec<&PhotoRecord> = records
        .iter()
        .filter(|r| match filter {
            ReviewFilter::Face => r.has_face(),
            ReviewFilter::NoFace => !r.has_face(),
            _ => true,
        })
        .collect();
    photos.sort_by(|a, b| certainty(a).total_cmp(&certainty(b)));

    Review {
        photos,
        failed: Vec::new(),
    }
}

/// Face counts over an analyzed photo set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceStats {
    pub total: usize,
    /// Detected or manually marked.
    pub with_face: usize,
    pub without_face: usize,
    /// Subset of `with_face` marked by hand.
    pub marked: usize,
    pub undated: usize,
    pub failed: usize,
}

impl FaceStats {
    pub fn collect(records: &[PhotoRecord], failed: &[FailedPhoto]) -> Self {
        let mut stats = Self {
            total: records.len(),
            failed: failed.len(),
            ..Self::default()
        };
        for record in records {
            if record.has_face() {
                stats.with_face += 1;
            } else {
                stats.without_face += 1;
            }
            if record.face == FaceState::MarkedFace {
                stats.marked += 1;
            }
            if record.timestamp.is_none() {
                stats.undated += 1;
            }
        }
        stats
    }
}

impl fmt::Display for FaceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} photos: {} with a face ({} marked by hand), {} without, {} undated, {} failed",
            self.total, self.with_face, self.marked, self.without_face, self.undated, self.failed
        )
    }
}
