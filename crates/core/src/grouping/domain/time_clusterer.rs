use chrono::{NaiveDateTime, TimeDelta};

use crate::grouping::domain::cluster::Cluster;
use crate::shared::photo_record::PhotoRecord;

/// Output of [`TimeClusterer::cluster`].
#[derive(Debug, Default)]
pub struct Clustering<'a> {
    /// Chronological clusters covering every timestamped record once.
    pub clusters: Vec<Cluster<'a>>,
    /// Records without a timestamp, in input order.
    pub unclustered: Vec<&'a PhotoRecord>,
}

/// Splits a record set into runs of time-adjacent photos.
///
/// A photo joins the current run when its gap to the previous photo (not
/// the run's first photo) is within `max_gap_ms`.
pub struct TimeClusterer {
    max_gap: TimeDelta,
}

impl TimeClusterer {
    pub fn new(max_gap_ms: i64) -> Self {
        Self {
            max_gap: TimeDelta::milliseconds(max_gap_ms),
        }
    }

    pub fn cluster<'a>(&self, records: &'a [PhotoRecord]) -> Clustering<'a> {
        let mut unclustered = Vec::new();
        let mut timed: Vec<(NaiveDateTime, &'a PhotoRecord)> = Vec::with_capacity(records.len());
        for record in records {
            match record.timestamp {
                Some(ts) => timed.push((ts, record)),
                None => unclustered.push(record),
            }
        }

        // Stable: identical timestamps keep ingestion order.
        timed.sort_by_key(|(ts, _)| *ts);

        let mut clusters = Vec::new();
        let mut current: Vec<&'a PhotoRecord> = Vec::new();
        let mut previous: Option<NaiveDateTime> = None;

        for (ts, record) in timed {
            if let Some(prev) = previous {
                if ts - prev > self.max_gap {
                    clusters.extend(Cluster::from_photos(std::mem::take(&mut current)));
                }
            }
            current.push(record);
            previous = Some(ts);
        }
        clusters.extend(Cluster::from_photos(current));

        log::debug!(
            "Clustered {} photos into {} clusters ({} without timestamp)",
            records.len() - unclustered.len(),
            clusters.len(),
            unclustered.len()
        );

        Clustering {
            clusters,
            unclustered,
        }
    }
}
