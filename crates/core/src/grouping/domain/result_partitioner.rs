use crate::grouping::domain::chain_builder::Chain;
use crate::grouping::domain::cluster::Cluster;
use crate::shared::photo_record::PhotoRecord;

/// Reference from one group to a neighbour in its chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupLink {
    pub group_id: u32,
    /// Best face similarity between the two groups.
    pub similarity: f64,
}

/// Position of a matched group inside its chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainPosition {
    pub chain_id: u32,
    pub is_first: bool,
    pub previous: Option<GroupLink>,
    pub next: Option<GroupLink>,
}

/// One cluster in the final result.
#[derive(Clone, Debug)]
pub struct GroupRecord<'a> {
    pub id: u32,
    pub cluster: Cluster<'a>,
    /// `None` for unmatched groups.
    pub chain: Option<ChainPosition>,
}

impl<'a> GroupRecord<'a> {
    pub fn photos(&self) -> &[&'a PhotoRecord] {
        self.cluster.photos()
    }

    pub fn has_face(&self) -> bool {
        self.cluster.has_face()
    }

    /// Similarity justifying the link to the next group; `None` for the
    /// last group of a chain and for unmatched groups.
    pub fn similarity(&self) -> Option<f64> {
        self.chain.and_then(|c| c.next).map(|n| n.similarity)
    }
}

/// Final grouping output.
#[derive(Debug, Default)]
pub struct MatchResult<'a> {
    /// Groups from chains of two or more clusters, chain by chain.
    pub matched: Vec<GroupRecord<'a>>,
    /// Groups whose cluster linked to nothing.
    pub unmatched: Vec<GroupRecord<'a>>,
    /// Records left out of grouping because they have no timestamp.
    pub unclustered: Vec<&'a PhotoRecord>,
}

impl<'a> MatchResult<'a> {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.unmatched.is_empty()
    }

    /// Matched groups first, then unmatched.
    pub fn groups(&self) -> impl Iterator<Item = &GroupRecord<'a>> {
        self.matched.iter().chain(self.unmatched.iter())
    }

    pub fn group(&self, id: u32) -> Option<&GroupRecord<'a>> {
        self.groups().find(|g| g.id == id)
    }

    pub fn chain_count(&self) -> usize {
        self.matched
            .iter()
            .filter(|g| g.chain.is_some_and(|c| c.is_first))
            .count()
    }
}

/// Splits chains into matched and unmatched groups and numbers them.
///
/// Ids are sequential from 1: matched groups in chain order first, then
/// unmatched groups, so the two sets never collide. Chain ids count matched
/// chains from 1.
pub fn partition<'a>(chains: Vec<Chain<'a>>) -> MatchResult<'a> {
    let (multi, single): (Vec<Chain<'a>>, Vec<Chain<'a>>) =
        chains.into_iter().partition(|c| c.len() > 1);

    let mut next_id: u32 = 1;
    let mut matched = Vec::new();

    for (chain_index, chain) in multi.into_iter().enumerate() {
        let chain_id = chain_index as u32 + 1;
        let first_id = next_id;
        let (clusters, similarities) = chain.into_parts();
        let count = clusters.len();

        for (pos, cluster) in clusters.into_iter().enumerate() {
            let id = first_id + pos as u32;
            let previous = (pos > 0).then(|| GroupLink {
                group_id: id - 1,
                similarity: similarities[pos - 1],
            });
            let next = (pos + 1 < count).then(|| GroupLink {
                group_id: id + 1,
                similarity: similarities[pos],
            });
            matched.push(GroupRecord {
                id,
                cluster,
                chain: Some(ChainPosition {
                    chain_id,
                    is_first: pos == 0,
                    previous,
                    next,
                }),
            });
        }
        next_id += count as u32;
    }

    let unmatched = single
        .into_iter()
        .flat_map(|chain| chain.into_parts().0)
        .map(|cluster| {
            let id = next_id;
            next_id += 1;
            GroupRecord {
                id,
                cluster,
                chain: None,
            }
        })
        .collect();

    MatchResult {
        matched,
        unmatched,
        unclustered: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::domain::chain_builder::{build_chains, LinkRule};
    use crate::grouping::domain::grouping_config::GroupingConfig;
    use crate::shared::photo_record::FaceDetection;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::collections::HashSet;

    fn at_day(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 2, 1)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    /// Mixed event on `day` whose face embedding points at `angle`.
    fn event(day: i64, angle: f64) -> Vec<PhotoRecord> {
        vec![
            PhotoRecord::detected(
                format!("face-{day}.jpg"),
                Some(at_day(day)),
                Some(FaceDetection {
                    embedding: vec![angle.cos() as f32, angle.sin() as f32],
                    confidence: 0.9,
                }),
            ),
            PhotoRecord::detected(format!("scene-{day}.jpg"), Some(at_day(day)), None),
        ]
    }

    fn chains_for(events: &[Vec<PhotoRecord>]) -> Vec<Chain<'_>> {
        let clusters = events
            .iter()
            .map(|e| Cluster::from_photos(e.iter().collect()).unwrap())
            .collect();
        build_chains(clusters, &LinkRule::new(&GroupingConfig::default()))
    }

    #[test]
    fn test_empty() {
        let result = partition(Vec::new());
        assert!(result.is_empty());
        assert_eq!(result.chain_count(), 0);
    }

    #[test]
    fn test_pair_becomes_two_matched_groups() {
        let events = [event(0, 0.0), event(10, 0.0)];

        let result = partition(chains_for(&events));

        assert_eq!(result.matched.len(), 2);
        assert!(result.unmatched.is_empty());
        let first = &result.matched[0];
        let second = &result.matched[1];
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        let first_pos = first.chain.unwrap();
        let second_pos = second.chain.unwrap();
        assert!(first_pos.is_first);
        assert!(!second_pos.is_first);
        assert_eq!(first_pos.chain_id, second_pos.chain_id);
        assert_eq!(first_pos.next.unwrap().group_id, 2);
        assert!(first_pos.previous.is_none());
        assert_eq!(second_pos.previous.unwrap().group_id, 1);
        assert!(second_pos.next.is_none());
        assert!(first.similarity().is_some());
        assert!(second.similarity().is_none());
    }

    #[test]
    fn test_singletons_are_unmatched() {
        let events = [event(0, 0.0), event(2, 0.0)];

        let result = partition(chains_for(&events));

        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched.len(), 2);
        assert_eq!(result.unmatched[0].id, 1);
        assert_eq!(result.unmatched[1].id, 2);
        assert!(result.unmatched.iter().all(|g| g.chain.is_none()));
        assert!(result.unmatched[0].cluster.start() < result.unmatched[1].cluster.start());
    }

    #[test]
    fn test_unmatched_ids_continue_after_matched() {
        // Chains: [0, 10, 20] and [3, 13]; 5 is alone.
        let events = [
            event(0, 0.0),
            event(3, 2.0),
            event(5, -2.0),
            event(10, 0.0),
            event(13, 2.0),
            event(20, 0.0),
        ];

        let result = partition(chains_for(&events));

        let matched_ids: Vec<u32> = result.matched.iter().map(|g| g.id).collect();
        let unmatched_ids: Vec<u32> = result.unmatched.iter().map(|g| g.id).collect();
        assert_eq!(matched_ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(unmatched_ids, vec![6]);
        assert_eq!(result.chain_count(), 2);

        let chain_ids: Vec<u32> = result
            .matched
            .iter()
            .map(|g| g.chain.unwrap().chain_id)
            .collect();
        assert_eq!(chain_ids, vec![1, 1, 1, 2, 2]);
        assert_eq!(result.unmatched[0].cluster.start(), at_day(5));
    }

    #[test]
    fn test_ids_unique_and_lookup_works() {
        let events: Vec<Vec<PhotoRecord>> =
            (0..20).map(|k| event(k * 4, (k % 4) as f64)).collect();

        let result = partition(chains_for(&events));

        let ids: HashSet<u32> = result.groups().map(|g| g.id).collect();
        assert_eq!(ids.len(), events.len());
        for id in ids {
            assert_eq!(result.group(id).unwrap().id, id);
        }
    }

    #[test]
    fn test_next_link_points_at_following_group() {
        let events = [event(0, 0.0), event(10, 0.05), event(20, 0.1)];

        let result = partition(chains_for(&events));

        for group in &result.matched {
            if let Some(next) = group.chain.unwrap().next {
                let target = result.group(next.group_id).unwrap();
                assert!(target.cluster.start() > group.cluster.start());
                assert_eq!(target.chain.unwrap().previous.unwrap().group_id, group.id);
                assert_eq!(
                    target.chain.unwrap().previous.unwrap().similarity,
                    next.similarity
                );
            }
        }
    }
}
