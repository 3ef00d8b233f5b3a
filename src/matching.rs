//! Brute-force Hamming matching with cross-check filtering.

use crate::features::Descriptor;

/// A template-to-frame correspondence.
///
/// `query_idx` indexes the template descriptors, `train_idx` the frame
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// Exhaustively matches `query` against `train`.
///
/// A pair survives only when each descriptor is the other's nearest
/// neighbor (cross-check). The result is sorted ascending by distance,
/// ties broken by query index so the ordering is stable.
pub fn match_descriptors(query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let forward: Vec<(usize, u32)> = query.iter().map(|q| nearest(q, train)).collect();
    let backward: Vec<(usize, u32)> = train.iter().map(|t| nearest(t, query)).collect();

    let mut matches: Vec<FeatureMatch> = forward
        .iter()
        .enumerate()
        .filter_map(|(query_idx, &(train_idx, distance))| {
            if backward[train_idx].0 == query_idx {
                Some(FeatureMatch {
                    query_idx,
                    train_idx,
                    distance,
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then(a.query_idx.cmp(&b.query_idx))
    });
    matches
}

fn nearest(desc: &Descriptor, pool: &[Descriptor]) -> (usize, u32) {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (idx, other) in pool.iter().enumerate() {
        let d = desc.distance(other);
        if d < best_dist {
            best_dist = d;
            best_idx = idx;
        }
    }
    (best_idx, best_dist)
}
