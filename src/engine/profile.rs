use crate::features::{MotionSample, ShapeFeature};
use crate::mask::CanonicalMask;

/// Everything derived from one mask sequence that the comparison consumes.
/// Immutable once built, so a reference profile can be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceProfile {
    pub masks: Vec<CanonicalMask>,
    pub features: Vec<ShapeFeature>,
    /// One sample per transition: `masks.len() - 1` entries
    pub motion: Vec<MotionSample>,
}

impl SequenceProfile {
    pub fn frame_count(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn duration_seconds(&self, seconds_per_frame: f64) -> f64 {
        self.frame_count() as f64 * seconds_per_frame
    }
}
