use crate::grouping::domain::cluster::Cluster;

/// Keeps only mixed clusters, in chronological order.
///
/// Homogeneous clusters (all faces or no faces) carry no linking signal and
/// are dropped from grouping entirely.
pub fn retain_mixed(clusters: Vec<Cluster<'_>>) -> Vec<Cluster<'_>> {
    let before = clusters.len();
    let mut mixed: Vec<Cluster<'_>> = clusters.into_iter().filter(Cluster::is_mixed).collect();
    // Members are sorted, so the first photo's timestamp is the start.
    mixed.sort_by_key(Cluster::start);
    log::debug!(
        "Kept {} of {before} clusters with both face and non-face photos",
        mixed.len()
    );
    mixed
}
