use crate::grouping::domain::chain_builder::{build_chains, LinkRule};
use crate::grouping::domain::cluster_filter::retain_mixed;
use crate::grouping::domain::grouping_config::{ConfigError, GroupingConfig};
use crate::grouping::domain::result_partitioner::{partition, MatchResult};
use crate::grouping::domain::time_clusterer::TimeClusterer;
use crate::shared::photo_record::PhotoRecord;

/// Groups analyzed photos into events and chains events showing the same
/// person across a week-to-year gap.
///
/// Runs time clustering, the mixed-cluster filter, greedy chaining and
/// partitioning in sequence. Pure and deterministic: the same records and
/// config always produce the same result, and the records are not touched.
pub struct GroupPhotosUseCase {
    clusterer: TimeClusterer,
    rule: LinkRule,
}

impl GroupPhotosUseCase {
    /// Rejects an inconsistent config up front.
    pub fn new(config: &GroupingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &GroupingConfig) -> Self {
        Self {
            clusterer: TimeClusterer::new(config.cluster_gap_ms()),
            rule: LinkRule::new(config),
        }
    }

    pub fn execute<'a>(&self, records: &'a [PhotoRecord]) -> MatchResult<'a> {
        let clustering = self.clusterer.cluster(records);
        let total_clusters = clustering.clusters.len();
        let mixed = retain_mixed(clustering.clusters);
        log::info!(
            "{} photos → {total_clusters} clusters, {} mixed, {} without timestamp",
            records.len(),
            mixed.len(),
            clustering.unclustered.len()
        );

        let chains = build_chains(mixed, &self.rule);
        let mut result = partition(chains);
        result.unclustered = clustering.unclustered;

        log::info!(
            "{} chains over {} matched groups, {} unmatched groups",
            result.chain_count(),
            result.matched.len(),
            result.unmatched.len()
        );
        result
    }
}

impl Default for GroupPhotosUseCase {
    fn default() -> Self {
        Self::from_config(&GroupingConfig::default())
    }
}

/// Groups `records` with the default config.
pub fn group_photos(records: &[PhotoRecord]) -> MatchResult<'_> {
    GroupPhotosUseCase::default().execute(records)
}
