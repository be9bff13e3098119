use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grouping::domain::result_partitioner::{GroupLink, GroupRecord, MatchResult};
use crate::shared::photo_record::PhotoRecord;

/// Conventional file name of the export document.
pub const EXPORT_FILE_NAME: &str = "group-info.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write export to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("group {from} links to unknown group {to}")]
    DanglingLink { from: u32, to: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPhoto {
    pub path: String,
    pub timestamp: Option<NaiveDateTime>,
    pub has_face: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMatch {
    pub group_id: u32,
    pub similarity: f64,
    pub photos: Vec<ExportedPhoto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedGroup {
    pub id: u32,
    pub has_face: bool,
    pub has_matches: bool,
    pub photos: Vec<ExportedPhoto>,
    /// Chain neighbours: the previous group, then the next one.
    pub matches: Vec<ExportedMatch>,
}

/// The `group-info.json` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupExport {
    pub groups: Vec<ExportedGroup>,
}

impl GroupExport {
    /// Builds the document from a grouping result, matched groups first.
    pub fn from_result(result: &MatchResult<'_>) -> Result<Self, ExportError> {
        let groups = result
            .groups()
            .map(|group| export_group(result, group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(ExportError::Serialize)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, self.to_json()?).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn export_group(result: &MatchResult<'_>, group: &GroupRecord<'_>) -> Result<ExportedGroup, ExportError> {
    let links = group
        .chain
        .iter()
        .flat_map(|position| [position.previous, position.next])
        .flatten();

    let mut matches = Vec::new();
    for GroupLink {
        group_id,
        similarity,
    } in links
    {
        let target = result.group(group_id).ok_or(ExportError::DanglingLink {
            from: group.id,
            to: group_id,
        })?;
        matches.push(ExportedMatch {
            group_id,
            similarity,
            photos: export_photos(target.photos()),
        });
    }

    Ok(ExportedGroup {
        id: group.id,
        has_face: group.has_face(),
        has_matches: !matches.is_empty(),
        photos: export_photos(group.photos()),
        matches,
    })
}

fn export_photos(photos: &[&PhotoRecord]) -> Vec<ExportedPhoto> {
    photos
        .iter()
        .map(|photo| ExportedPhoto {
            path: photo.path().to_string_lossy().into_owned(),
            timestamp: photo.timestamp,
            has_face: photo.has_face(),
        })
        .collect()
}
