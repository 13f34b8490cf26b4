use crate::align::AlignmentPath;
use crate::features::MotionSample;
use crate::mask::{resize_nearest, CanonicalMask};
use std::borrow::Cow;

/// `|A and B| / |A or B|`, defined as 0 when both masks are empty
pub fn intersection_over_union(a: &CanonicalMask, b: &CanonicalMask) -> f64 {
    let b = if a.dimensions() == b.dimensions() {
        Cow::Borrowed(b)
    } else {
        Cow::Owned(resize_nearest(b, a.width(), a.height()))
    };

    let mut intersection = 0usize;
    let mut union = 0usize;
    for (&pa, &pb) in a.grid().iter().zip(b.grid().iter()) {
        intersection += (pa && pb) as usize;
        union += (pa || pb) as usize;
    }

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Aggregate similarity of two aligned sequences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScores {
    pub spatial_similarity: f64,
    pub motion_similarity: f64,
    pub max_delay: usize,
    /// Mean candidate-to-reference flow magnitude ratio over motion pairs;
    /// 1.0 means the same speed
    pub speed_ratio: f64,
    /// Mean absolute flow magnitude difference over motion pairs
    pub flow_difference: f64,
}

/// Scores spatial overlap and motion agreement along an alignment path
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    epsilon: f64,
}

impl SimilarityScorer {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Score two sequences along `path`
    ///
    /// Motion slices hold one sample per transition, so path index `i`
    /// maps to motion sample `i - 1` and pairs touching frame 0 are skipped.
    /// A metric with no eligible pairs is 0.
    pub fn score(
        &self,
        ref_masks: &[CanonicalMask],
        cand_masks: &[CanonicalMask],
        ref_motion: &[MotionSample],
        cand_motion: &[MotionSample],
        path: &AlignmentPath,
    ) -> SimilarityScores {
        let _span = tracing::debug_span!("score").entered();

        let mut spatial_total = 0.0;
        for &(i, j) in path.pairs() {
            assert!(
                i < ref_masks.len() && j < cand_masks.len(),
                "alignment pair ({}, {}) outside sequences of length {} and {}",
                i,
                j,
                ref_masks.len(),
                cand_masks.len()
            );
            spatial_total += intersection_over_union(&ref_masks[i], &cand_masks[j]);
        }

        let mut motion_total = 0.0;
        let mut speed_total = 0.0;
        let mut difference_total = 0.0;
        let mut motion_pairs = 0usize;
        for &(i, j) in path.pairs().iter().filter(|&&(i, j)| i > 0 && j > 0) {
            assert!(
                i <= ref_motion.len() && j <= cand_motion.len(),
                "alignment pair ({}, {}) has no motion sample",
                i,
                j
            );
            let (reference, candidate) = (&ref_motion[i - 1], &cand_motion[j - 1]);
            motion_total += self.motion_agreement(reference, candidate);
            speed_total += self.speed_ratio(reference, candidate);
            difference_total += (reference.mean_magnitude - candidate.mean_magnitude).abs();
            motion_pairs += 1;
        }

        let spatial_similarity = if path.is_empty() {
            0.0
        } else {
            spatial_total / path.len() as f64
        };
        let (motion_similarity, speed_ratio, flow_difference) = if motion_pairs == 0 {
            (0.0, 1.0, 0.0)
        } else {
            let pairs = motion_pairs as f64;
            (motion_total / pairs, speed_total / pairs, difference_total / pairs)
        };

        SimilarityScores {
            spatial_similarity,
            motion_similarity,
            max_delay: path.max_delay(),
            speed_ratio,
            flow_difference,
        }
    }

    fn motion_agreement(&self, reference: &MotionSample, candidate: &MotionSample) -> f64 {
        let (a, b) = (reference.mean_magnitude, candidate.mean_magnitude);
        1.0 - (a - b).abs() / a.max(b).max(self.epsilon)
    }

    /// A still reference gives no scale to measure against, so it counts as 1.0
    fn speed_ratio(&self, reference: &MotionSample, candidate: &MotionSample) -> f64 {
        if reference.mean_magnitude > self.epsilon {
            candidate.mean_magnitude / reference.mean_magnitude
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: u32, x1: u32) -> CanonicalMask {
        CanonicalMask::from_fn(10, 10, |x, y| x >= x0 && x < x1 && y < 5)
    }

    fn motion(mean_magnitude: f64) -> MotionSample {
        MotionSample {
            mean_magnitude,
            mean_angle: 0.0,
        }
    }

    #[test]
    fn iou_conventions() {
        let a = rect(0, 4);
        assert_eq!(intersection_over_union(&a, &a), 1.0);

        let empty = CanonicalMask::empty(10, 10);
        assert_eq!(intersection_over_union(&empty, &empty), 0.0);
        assert_eq!(intersection_over_union(&a, &empty), 0.0);

        let b = rect(2, 6);
        let iou = intersection_over_union(&a, &b);
        assert!((iou - 10.0 / 30.0).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&iou));
    }

    #[test]
    fn scores_along_path() {
        let ref_masks = vec![rect(0, 4), rect(1, 5), rect(2, 6)];
        let cand_masks = vec![rect(0, 4), rect(2, 6)];
        let ref_motion = vec![motion(1.0), motion(1.0)];
        let cand_motion = vec![motion(0.5)];
        let path = AlignmentPath::new(vec![(0, 0), (1, 1), (2, 1)], 3, 2, 0.0);

        let scores = SimilarityScorer::new(0.001).score(
            &ref_masks,
            &cand_masks,
            &ref_motion,
            &cand_motion,
            &path,
        );

        let expected_spatial = (1.0 + 15.0 / 25.0 + 1.0) / 3.0;
        assert!((scores.spatial_similarity - expected_spatial).abs() < 1e-12);
        assert!((scores.motion_similarity - 0.5).abs() < 1e-12);
        assert_eq!(scores.max_delay, 1);
        assert!((scores.speed_ratio - 0.5).abs() < 1e-12);
        assert!((scores.flow_difference - 0.5).abs() < 1e-12);
    }

    #[test]
    fn still_sequences_count_as_matching_motion() {
        let scorer = SimilarityScorer::new(0.001);
        assert_eq!(scorer.motion_agreement(&motion(0.0), &motion(0.0)), 1.0);
    }

    #[test]
    fn single_frames_have_no_motion_pairs() {
        let masks = vec![rect(0, 4)];
        let path = AlignmentPath::new(vec![(0, 0)], 1, 1, 0.0);
        let scores = SimilarityScorer::new(0.001).score(&masks, &masks, &[], &[], &path);
        assert_eq!(scores.spatial_similarity, 1.0);
        assert_eq!(scores.motion_similarity, 0.0);
        assert_eq!(scores.max_delay, 0);
        assert_eq!(scores.speed_ratio, 1.0);
        assert_eq!(scores.flow_difference, 0.0);
    }

    #[test]
    fn still_reference_has_unit_speed_ratio() {
        let scorer = SimilarityScorer::new(0.001);
        assert_eq!(scorer.speed_ratio(&motion(0.0), &motion(2.0)), 1.0);
        assert!((scorer.speed_ratio(&motion(2.0), &motion(3.0)) - 1.5).abs() < 1e-12);
    }
}
