use super::types::{CanonicalMask, RawMask};
use crate::error::{Fallback, Outcome};
use image::{imageops, GrayImage, Luma};
use ndarray::{ArrayView2, Axis, Ix2};

/// A 3-D mask whose last (or first) axis is at most this long is read as
/// carrying a channel axis there
const MAX_CHANNELS: usize = 4;

/// Gray level above which a resized pixel counts as foreground
const FOREGROUND_THRESHOLD: u8 = 127;

/// Brings raw producer masks into the common canonical coordinate space
#[derive(Debug, Clone, Copy)]
pub struct MaskNormalizer {
    target_width: u32,
    target_height: u32,
}

impl MaskNormalizer {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Normalize a raw mask to the canonical size
    ///
    /// Steps:
    /// 1. Collapse a redundant channel axis by taking the first channel
    /// 2. Render as a two-level image
    /// 3. Nearest-neighbour resize to the target dimensions
    /// 4. Re-threshold so the result is strictly boolean
    ///
    /// Never fails: unusable input becomes an all-false canonical mask.
    pub fn normalize(&self, raw: &RawMask) -> Outcome<CanonicalMask> {
        let _span = tracing::debug_span!("normalize").entered();

        if raw.is_empty() {
            return Outcome::degraded(self.blank(), Fallback::EmptyInput);
        }

        let plane = match collapse_to_plane(raw) {
            Some(plane) => plane,
            None => {
                tracing::debug!("Unsupported raw mask shape {:?}", raw.shape());
                return Outcome::degraded(self.blank(), Fallback::MalformedShape);
            }
        };

        let (height, width) = plane.dim();
        let image = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([if plane[[y as usize, x as usize]] != 0 { 255 } else { 0 }])
        });

        let mask = CanonicalMask::from_gray_image(&image, FOREGROUND_THRESHOLD);
        Outcome::Success(resize_nearest(&mask, self.target_width, self.target_height))
    }

    fn blank(&self) -> CanonicalMask {
        CanonicalMask::empty(self.target_width, self.target_height)
    }
}

/// Nearest-neighbour resize of a boolean mask; a no-op when sizes already match
pub fn resize_nearest(mask: &CanonicalMask, width: u32, height: u32) -> CanonicalMask {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }

    let resized = imageops::resize(
        &mask.to_gray_image(),
        width,
        height,
        imageops::FilterType::Nearest,
    );
    CanonicalMask::from_gray_image(&resized, FOREGROUND_THRESHOLD)
}

fn collapse_to_plane(raw: &RawMask) -> Option<ArrayView2<'_, u8>> {
    let view = raw.view();
    match view.ndim() {
        2 => view.into_dimensionality::<Ix2>().ok(),
        3 => {
            let shape = view.shape();
            let axis = if shape[2] <= MAX_CHANNELS {
                Axis(2)
            } else if shape[0] <= MAX_CHANNELS {
                Axis(0)
            } else {
                return None;
            };
            view.index_axis_move(axis, 0).into_dimensionality::<Ix2>().ok()
        }
        _ => None,
    }
}
