//! Cross-checked Hamming matching and the similarity score.

use rayon::prelude::*;
use tracing::debug;

use super::orb::{Descriptor, DescriptorSet};

/// A mutual nearest-neighbour pair: `live[query]` ↔ `reference[train]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

#[inline]
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// For every descriptor in `from`, the index of its nearest neighbour in `to`
/// (lowest index on ties) and the distance.
fn nearest_neighbours(from: &[Descriptor], to: &[Descriptor]) -> Vec<(usize, u32)> {
    from.par_iter()
        .map(|d| {
            to.iter()
                .enumerate()
                .map(|(j, t)| (j, hamming(d, t)))
                .min_by_key(|&(j, dist)| (dist, j))
                .unwrap_or((usize::MAX, u32::MAX))
        })
        .collect()
}

/// Pairs that are each other's nearest neighbour in both directions.
pub fn cross_check_matches(live: &DescriptorSet, reference: &DescriptorSet) -> Vec<Match> {
    let a: Vec<Descriptor> = live.descriptors().copied().collect();
    let b: Vec<Descriptor> = reference.descriptors().copied().collect();
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let forward = nearest_neighbours(&a, &b);
    let backward = nearest_neighbours(&b, &a);
    forward
        .into_iter()
        .enumerate()
        .filter(|&(i, (j, _))| backward.get(j).is_some_and(|&(back, _)| back == i))
        .map(|(i, (j, distance))| Match {
            query: i,
            train: j,
            distance,
        })
        .collect()
}

/// `mutual matches / max(|live|, |reference|)`, or 0.0 when either set is empty.
pub fn similarity_score(live: &DescriptorSet, reference: &DescriptorSet) -> f32 {
    if live.is_empty() || reference.is_empty() {
        debug!(
            live = live.len(),
            reference = reference.len(),
            "empty descriptor set, score 0"
        );
        return 0.0;
    }
    let matches = cross_check_matches(live, reference);
    let score = matches.len() as f32 / live.len().max(reference.len()) as f32;
    debug!(
        live = live.len(),
        reference = reference.len(),
        matches = matches.len(),
        score,
        "scored descriptor sets"
    );
    score
}

/// Authentic when the unrounded score is strictly above `threshold`.
pub fn is_authentic(score: f32, threshold: f32) -> bool {
    score > threshold
}

/// Round to 4 decimal places for reporting.
pub fn round_score(score: f32) -> f32 {
    ((score as f64 * 10_000.0).round() / 10_000.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::orb::{Feature, Keypoint};

    fn set(descriptors: &[Descriptor]) -> DescriptorSet {
        DescriptorSet {
            features: descriptors
                .iter()
                .map(|&descriptor| Feature {
                    keypoint: Keypoint {
                        x: 0.0,
                        y: 0.0,
                        size: 31.0,
                        angle: 0.0,
                        response: 0.0,
                        octave: 0,
                    },
                    descriptor,
                })
                .collect(),
        }
    }

    fn desc(byte: u8) -> Descriptor {
        let mut d = [0u8; 32];
        d[0] = byte;
        d
    }

    #[test]
    fn hamming_counts_bits() {
        assert_eq!(hamming(&[0u8; 32], &[0u8; 32]), 0);
        assert_eq!(hamming(&[0u8; 32], &[0xFF; 32]), 256);
        assert_eq!(hamming(&desc(0b1010), &desc(0b0110)), 2);
    }

    #[test]
    fn empty_sets_score_zero() {
        let some = set(&[desc(1)]);
        let none = DescriptorSet::default();
        assert_eq!(similarity_score(&none, &some), 0.0);
        assert_eq!(similarity_score(&some, &none), 0.0);
        assert_eq!(similarity_score(&none, &none), 0.0);
    }

    #[test]
    fn identical_sets_match_fully() {
        let a = set(&[desc(0x00), desc(0x0F), desc(0xFF)]);
        assert_eq!(similarity_score(&a, &a), 1.0);
    }

    #[test]
    fn score_normalizes_by_larger_set() {
        let a = set(&[desc(0x00), desc(0xFF)]);
        let b = set(&[desc(0x00), desc(0xFF), desc(0x0F), desc(0xF0)]);
        let matches = cross_check_matches(&a, &b);
        assert_eq!(matches.len(), 2);
        assert_eq!(similarity_score(&a, &b), 0.5);
        assert_eq!(similarity_score(&b, &a), 0.5);
    }

    #[test]
    fn non_mutual_pairs_are_dropped() {
        // both live descriptors prefer reference[0]; only the closer one is mutual
        let live = set(&[desc(0b0000_0001), desc(0b0000_0111)]);
        let reference = set(&[desc(0b0000_0000), desc(0xFF)]);
        let matches = cross_check_matches(&live, &reference);
        assert_eq!(matches, vec![Match { query: 0, train: 0, distance: 1 }]);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let live = set(&[desc(0)]);
        let reference = set(&[desc(1), desc(2)]);
        let matches = cross_check_matches(&live, &reference);
        assert_eq!(matches[0].train, 0);
    }

    #[test]
    fn decision_uses_strict_threshold() {
        assert!(!is_authentic(0.20, 0.20));
        assert!(is_authentic(0.2001, 0.20));
        assert_eq!(round_score(0.123_456), 0.1235);
        assert_eq!(round_score(1.0 / 3.0), 0.3333);
    }
}
