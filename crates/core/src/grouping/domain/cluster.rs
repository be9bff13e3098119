use chrono::NaiveDateTime;

use crate::shared::photo_record::PhotoRecord;

/// A maximal run of time-adjacent photos, treated as one event.
///
/// Borrows its members from the caller's record set. Every member has a
/// timestamp, and members are kept in chronological order.
#[derive(Clone, Debug)]
pub struct Cluster<'a> {
    photos: Vec<&'a PhotoRecord>,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl<'a> Cluster<'a> {
    /// Returns `None` if `photos` is empty or any member lacks a timestamp.
    pub fn from_photos(photos: Vec<&'a PhotoRecord>) -> Option<Self> {
        let mut stamps = photos.iter().map(|p| p.timestamp);
        let first = stamps.next()??;
        let (start, end) = stamps.try_fold((first, first), |(lo, hi), ts| {
            ts.map(|t| (lo.min(t), hi.max(t)))
        })?;
        Some(Self { photos, start, end })
    }

    pub fn photos(&self) -> &[&'a PhotoRecord] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Earliest timestamp over all members.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Latest timestamp over all members.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn has_face(&self) -> bool {
        self.photos.iter().any(|p| p.has_face())
    }

    pub fn has_non_face(&self) -> bool {
        self.photos.iter().any(|p| !p.has_face())
    }

    /// Both face and non-face photos present.
    pub fn is_mixed(&self) -> bool {
        self.has_face() && self.has_non_face()
    }

    pub fn face_count(&self) -> usize {
        self.photos.iter().filter(|p| p.has_face()).count()
    }

    /// Embeddings of the face-bearing members. Manually marked faces
    /// contribute `None`.
    pub fn face_embeddings(&self) -> Vec<Option<&'a [f32]>> {
        self.photos
            .iter()
            .filter(|p| p.has_face())
            .map(|p| p.embedding())
            .collect()
    }
}
