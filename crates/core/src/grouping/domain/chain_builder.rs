//! Greedy forward chaining of clusters.
//!
//! Clusters are visited in chronological order. Each unclaimed cluster starts
//! a chain and claims, in index order, every later unclaimed cluster that
//! links to the chain's current tail. A claimed cluster is never revisited,
//! so a cluster taken early cannot move to a later chain with a stronger
//! match. Output is deterministic for a given input order.

use chrono::TimeDelta;

use crate::grouping::domain::cluster::Cluster;
use crate::grouping::domain::grouping_config::GroupingConfig;
use crate::grouping::domain::similarity::max_similarity;

/// Chronological clusters linked pairwise by face similarity.
#[derive(Clone, Debug)]
pub struct Chain<'a> {
    clusters: Vec<Cluster<'a>>,
    /// `similarities[i]` justifies the link from `clusters[i]` to `clusters[i + 1]`.
    similarities: Vec<f64>,
}

impl<'a> Chain<'a> {
    fn start(first: Cluster<'a>) -> Self {
        Self {
            clusters: vec![first],
            similarities: Vec::new(),
        }
    }

    fn push(&mut self, next: Cluster<'a>, similarity: f64) {
        self.clusters.push(next);
        self.similarities.push(similarity);
    }

    fn tail(&self) -> &Cluster<'a> {
        // Never empty: created with one cluster, only grows.
        &self.clusters[self.clusters.len() - 1]
    }

    pub fn clusters(&self) -> &[Cluster<'a>] {
        &self.clusters
    }

    pub fn similarities(&self) -> &[f64] {
        &self.similarities
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Cluster<'a>>, Vec<f64>) {
        (self.clusters, self.similarities)
    }
}

/// Decides whether two clusters show the same person at distinct events.
pub struct LinkRule {
    min_gap: TimeDelta,
    max_gap: TimeDelta,
    threshold: f64,
}

impl LinkRule {
    pub fn new(config: &GroupingConfig) -> Self {
        Self {
            min_gap: TimeDelta::milliseconds(config.min_link_gap_ms()),
            max_gap: TimeDelta::milliseconds(config.max_link_gap_ms()),
            threshold: config.similarity_threshold,
        }
    }

    /// Returns the justifying similarity when `after` links to `before`.
    ///
    /// The time window uses every photo of both clusters, while similarity
    /// only compares face-bearing photos. Clusters without a face never link.
    pub fn link(&self, before: &Cluster<'_>, after: &Cluster<'_>) -> Option<f64> {
        let gap = after.start() - before.end();
        if gap < self.min_gap || gap > self.max_gap {
            return None;
        }

        let best = max_similarity(&before.face_embeddings(), &after.face_embeddings())?;
        (best >= self.threshold).then_some(best)
    }
}

/// Assembles chains from mixed clusters sorted by start time.
pub fn build_chains<'a>(clusters: Vec<Cluster<'a>>, rule: &LinkRule) -> Vec<Chain<'a>> {
    let mut slots: Vec<Option<Cluster<'a>>> = clusters.into_iter().map(Some).collect();
    let mut chains = Vec::new();

    for i in 0..slots.len() {
        let Some(first) = slots[i].take() else {
            continue;
        };
        let mut chain = Chain::start(first);

        for slot in slots.iter_mut().skip(i + 1) {
            let Some(similarity) = slot
                .as_ref()
                .and_then(|candidate| rule.link(chain.tail(), candidate))
            else {
                continue;
            };
            if let Some(next) = slot.take() {
                log::debug!(
                    "Chain {}: linked cluster starting {} (similarity {similarity:.4})",
                    chains.len() + 1,
                    next.start()
                );
                chain.push(next, similarity);
            }
        }

        chains.push(chain);
    }

    chains
}
