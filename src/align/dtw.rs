use crate::error::{ComparisonError, Result, SequenceRole};
use crate::features::ShapeFeature;

/// Monotonic frame correspondence from `(0, 0)` to `(last_ref, last_cand)`
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPath {
    pairs: Vec<(usize, usize)>,
    distance: f64,
}

impl AlignmentPath {
    /// Build a path, asserting that it is a valid warping path for sequences of
    /// the given lengths. An invalid path means the aligner is broken.
    pub fn new(pairs: Vec<(usize, usize)>, ref_len: usize, cand_len: usize, distance: f64) -> Self {
        assert!(!pairs.is_empty(), "alignment path is empty");
        assert_eq!(pairs[0], (0, 0), "alignment path must start at (0, 0)");
        assert_eq!(
            pairs[pairs.len() - 1],
            (ref_len - 1, cand_len - 1),
            "alignment path must end at the last index of both sequences"
        );
        for step in pairs.windows(2) {
            let (a, b) = (step[0], step[1]);
            let di = b.0.checked_sub(a.0);
            let dj = b.1.checked_sub(a.1);
            assert!(
                matches!((di, dj), (Some(0), Some(1)) | (Some(1), Some(0)) | (Some(1), Some(1))),
                "alignment path step {:?} -> {:?} is not monotonic unit advance",
                a,
                b
            );
        }
        Self { pairs, distance }
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Total cumulative cost along the path
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Largest `|ref_idx - cand_idx|` over the path, in frames
    pub fn max_delay(&self) -> usize {
        self.pairs.iter().map(|&(i, j)| i.abs_diff(j)).max().unwrap_or(0)
    }
}

/// Dynamic time warping over shape-feature sequences
///
/// The full cost table is filled row by row; each cell depends on its left,
/// upper and upper-left neighbours, so the fill stays sequential.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceAligner;

impl SequenceAligner {
    pub fn new() -> Self {
        Self
    }

    pub fn align(&self, reference: &[ShapeFeature], candidate: &[ShapeFeature]) -> Result<AlignmentPath> {
        let _span = tracing::debug_span!("align").entered();

        match (reference.is_empty(), candidate.is_empty()) {
            (true, true) => return Err(ComparisonError::BothSequencesEmpty),
            (true, false) => {
                return Err(ComparisonError::EmptySequence {
                    role: SequenceRole::Reference,
                })
            }
            (false, true) => {
                return Err(ComparisonError::EmptySequence {
                    role: SequenceRole::Candidate,
                })
            }
            (false, false) => {}
        }

        let n = reference.len();
        let m = candidate.len();
        let mut table = CostTable::new(n, m);

        for i in 0..n {
            for j in 0..m {
                let cost = reference[i].distance(&candidate[j]);
                let best = if i == 0 && j == 0 {
                    0.0
                } else {
                    let diag = table.get(i, j, -1, -1);
                    let up = table.get(i, j, -1, 0);
                    let left = table.get(i, j, 0, -1);
                    diag.min(up).min(left)
                };
                table.set(i, j, cost + best);
            }
        }

        let pairs = table.backtrack();
        let distance = table.at(n - 1, m - 1);
        tracing::debug!(
            "Aligned {} reference and {} candidate frames over {} steps (distance {:.3})",
            n,
            m,
            pairs.len(),
            distance
        );
        Ok(AlignmentPath::new(pairs, n, m, distance))
    }
}

struct CostTable {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl CostTable {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![f64::INFINITY; rows * cols],
        }
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.cols + j]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.cells[i * self.cols + j] = value;
    }

    /// Neighbour of `(i, j)` at the given offset, infinite outside the table
    fn get(&self, i: usize, j: usize, di: isize, dj: isize) -> f64 {
        let (Some(ni), Some(nj)) = (i.checked_add_signed(di), j.checked_add_signed(dj)) else {
            return f64::INFINITY;
        };
        if ni >= self.rows || nj >= self.cols {
            return f64::INFINITY;
        }
        self.at(ni, nj)
    }

    /// Walk back from the last cell, preferring the diagonal on ties, then the
    /// reference-advancing step
    fn backtrack(&self) -> Vec<(usize, usize)> {
        let (mut i, mut j) = (self.rows - 1, self.cols - 1);
        let mut pairs = vec![(i, j)];

        while (i, j) != (0, 0) {
            if i == 0 {
                j -= 1;
            } else if j == 0 {
                i -= 1;
            } else {
                let diag = self.at(i - 1, j - 1);
                let up = self.at(i - 1, j);
                let left = self.at(i, j - 1);
                if diag <= up && diag <= left {
                    i -= 1;
                    j -= 1;
                } else if up <= left {
                    i -= 1;
                } else {
                    j -= 1;
                }
            }
            pairs.push((i, j));
        }

        pairs.reverse();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(xs: &[f64]) -> Vec<ShapeFeature> {
        xs.iter()
            .map(|&x| ShapeFeature {
                centroid_x: x,
                ..ShapeFeature::zero()
            })
            .collect()
    }

    #[test]
    fn identical_sequences_align_diagonally() {
        let seq = features(&[1.0, 2.0, 3.0, 4.0]);
        let path = SequenceAligner::new().align(&seq, &seq).unwrap();
        assert_eq!(path.pairs(), &[(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(path.max_delay(), 0);
        assert_eq!(path.distance(), 0.0);
    }

    #[test]
    fn constant_sequences_prefer_diagonal() {
        let seq = features(&[5.0; 4]);
        let path = SequenceAligner::new().align(&seq, &seq).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.max_delay(), 0);
    }

    #[test]
    fn repeated_frames_are_absorbed() {
        let reference = features(&[0.0, 1.0, 2.0, 3.0]);
        let candidate = features(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        let path = SequenceAligner::new().align(&reference, &candidate).unwrap();
        assert_eq!(
            path.pairs(),
            &[(0, 0), (0, 1), (0, 2), (1, 3), (2, 4), (3, 5)]
        );
        assert_eq!(path.max_delay(), 2);
    }

    #[test]
    fn unequal_lengths_reach_both_ends() {
        let reference = features(&[0.0, 3.0, 1.0, 7.0, 2.0]);
        let candidate = features(&[4.0, 0.5]);
        let path = SequenceAligner::new().align(&reference, &candidate).unwrap();
        assert_eq!(path.pairs()[0], (0, 0));
        assert_eq!(*path.pairs().last().unwrap(), (4, 1));
        for step in path.pairs().windows(2) {
            assert!(step[1].0 >= step[0].0 && step[1].1 >= step[0].1);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let seq = features(&[1.0]);
        let aligner = SequenceAligner::new();
        assert_eq!(
            aligner.align(&seq, &[]),
            Err(ComparisonError::EmptySequence {
                role: SequenceRole::Candidate
            })
        );
        assert_eq!(
            aligner.align(&[], &seq),
            Err(ComparisonError::EmptySequence {
                role: SequenceRole::Reference
            })
        );
        assert_eq!(aligner.align(&[], &[]), Err(ComparisonError::BothSequencesEmpty));
    }

    #[test]
    #[should_panic(expected = "not monotonic")]
    fn backwards_path_is_fatal() {
        AlignmentPath::new(vec![(0, 0), (1, 1), (0, 2), (1, 2)], 2, 3, 0.0);
    }
}
