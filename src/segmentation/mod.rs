mod matte;
pub mod types;

pub use matte::MatteThreshold;
pub use types::MaskProducer;

use crate::capture::FrameSource;
use crate::mask::{empty_raw_mask, RawMask};
use anyhow::{Context, Result};
use image::RgbImage;

/// Run a producer over one frame; "no subject" and producer failures both
/// become an all-false mask at the frame's native resolution
pub fn mask_for_frame<P>(producer: &mut P, frame: &RgbImage, index: usize) -> RawMask
where
    P: MaskProducer + ?Sized,
{
    let (width, height) = frame.dimensions();
    match producer.segment(frame) {
        Ok(Some(mask)) => mask,
        Ok(None) => {
            tracing::debug!("No subject in frame {}", index);
            empty_raw_mask(width, height)
        }
        Err(e) => {
            tracing::warn!("Segmentation failed on frame {}: {:#}", index, e);
            empty_raw_mask(width, height)
        }
    }
}

/// Masks for a sequence of frames, in the order given
pub fn masks_from_frames<P, I>(producer: &mut P, frames: I) -> Vec<RawMask>
where
    P: MaskProducer + ?Sized,
    I: IntoIterator<Item = RgbImage>,
{
    producer.reset_state();
    frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| mask_for_frame(producer, &frame, index))
        .collect()
}

/// Drain a frame source through a producer
///
/// Source errors abort; per-frame producer errors do not.
pub fn masks_from_source<S, P>(source: &mut S, producer: &mut P) -> Result<Vec<RawMask>>
where
    S: FrameSource + ?Sized,
    P: MaskProducer + ?Sized,
{
    producer.reset_state();
    let mut masks = Vec::with_capacity(source.remaining().unwrap_or(0));
    while let Some(frame) = source
        .next_frame()
        .with_context(|| format!("Failed to read frame {}", masks.len()))?
    {
        masks.push(mask_for_frame(producer, &frame, masks.len()));
    }
    Ok(masks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::Rgb;

    /// Finds the subject in odd frames, fails on every third frame
    struct Scripted {
        calls: usize,
    }

    impl MaskProducer for Scripted {
        fn segment(&mut self, frame: &RgbImage) -> Result<Option<RawMask>> {
            self.calls += 1;
            let (w, h) = frame.dimensions();
            match self.calls % 3 {
                0 => Err(anyhow!("detector crashed")),
                1 => Ok(None),
                _ => {
                    let mut mask = empty_raw_mask(w, h);
                    mask[[0, 0]] = 1;
                    Ok(Some(mask))
                }
            }
        }
    }

    #[test]
    fn missing_subjects_and_failures_become_blank_masks() {
        let frames = vec![RgbImage::from_pixel(5, 2, Rgb([0, 0, 0])); 3];
        let masks = masks_from_frames(&mut Scripted { calls: 0 }, frames);
        assert_eq!(masks.len(), 3);
        assert!(masks.iter().all(|m| m.shape() == &[2, 5]));
        assert_eq!(masks[0].sum(), 0);
        assert_eq!(masks[1].sum(), 1);
        assert_eq!(masks[2].sum(), 0);
    }
}
