use crate::mask::RawMask;
use anyhow::Result;
use image::RgbImage;

/// Trait for per-frame subject mask producers
/// Allows swapping between detector/segmenter backends
///
/// When several subjects are present, an implementation must return the
/// region of the first detection in raster order of its bounding-box centre
/// (top-to-bottom, then left-to-right).
pub trait MaskProducer {
    /// Mask of the primary subject at the frame's native resolution
    ///
    /// # Returns
    /// * `Some(mask)` with layout (height, width), non-zero meaning foreground
    /// * `None` when no subject was found in the frame
    fn segment(&mut self, frame: &RgbImage) -> Result<Option<RawMask>>;

    /// Reset internal state (for producers that track across frames)
    ///
    /// Call this before starting a new sequence
    fn reset_state(&mut self) {
        // Default implementation: no-op for stateless producers
    }
}
