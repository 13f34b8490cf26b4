use super::flow::FarnebackFlow;
use crate::config::FlowParams;
use crate::error::{Fallback, Outcome};
use crate::mask::{resize_nearest, CanonicalMask};
use ndarray::Array2;
use rayon::prelude::*;

/// Summary of the flow field between mask `i - 1` and mask `i`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub mean_magnitude: f64,
    pub mean_angle: f64,
}

impl MotionSample {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Dense-flow motion statistics between consecutive canonical masks
pub struct MotionFieldEstimator {
    flow: FarnebackFlow,
}

impl MotionFieldEstimator {
    pub fn new(params: FlowParams) -> Self {
        Self {
            flow: FarnebackFlow::new(params),
        }
    }

    /// Estimate the motion from `prev` to `next`
    ///
    /// `next` is brought to the size of `prev` with the nearest-neighbour policy
    /// when they differ. Never fails: unusable input yields a zero sample.
    pub fn estimate(&self, prev: &CanonicalMask, next: &CanonicalMask) -> Outcome<MotionSample> {
        let _span = tracing::debug_span!("estimate_motion").entered();

        let (width, height) = prev.dimensions();
        if width == 0 || height == 0 || next.width() == 0 || next.height() == 0 {
            return Outcome::degraded(MotionSample::zero(), Fallback::EmptyInput);
        }

        let resized;
        let next = if next.dimensions() != prev.dimensions() {
            tracing::debug!(
                "Resizing next mask {:?} to {:?} before flow",
                next.dimensions(),
                prev.dimensions()
            );
            resized = resize_nearest(next, width, height);
            &resized
        } else {
            next
        };

        let field = self.flow.compute(&two_level_plane(prev), &two_level_plane(next));
        if !field.is_finite() {
            return Outcome::degraded(MotionSample::zero(), Fallback::NonFiniteFlow);
        }

        let (mean_magnitude, mean_angle) = field.polar_means();
        Outcome::Success(MotionSample {
            mean_magnitude,
            mean_angle,
        })
    }

    /// Motion samples for every consecutive pair: `masks.len() - 1` entries,
    /// entry `k` describing the transition `k -> k + 1`
    ///
    /// Transitions are estimated in parallel on the current rayon pool.
    pub fn estimate_sequence(&self, masks: &[CanonicalMask]) -> Vec<MotionSample> {
        masks
            .par_windows(2)
            .map(|pair| self.estimate(&pair[0], &pair[1]).into_value("motion"))
            .collect()
    }
}

fn two_level_plane(mask: &CanonicalMask) -> Array2<f32> {
    mask.grid().mapv(|v| if v { 255.0 } else { 0.0 })
}
