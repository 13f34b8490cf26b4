use super::types::MaskProducer;
use crate::mask::{raw_mask_from_gray, RawMask};
use anyhow::Result;
use image::{imageops, RgbImage};

/// Producer for frames that already are rendered mattes or masks
///
/// The whole foreground is taken as the subject; luma above `threshold` is
/// foreground.
#[derive(Debug, Clone, Copy)]
pub struct MatteThreshold {
    threshold: u8,
}

impl MatteThreshold {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Default for MatteThreshold {
    fn default() -> Self {
        Self::new(127)
    }
}

impl MaskProducer for MatteThreshold {
    fn segment(&mut self, frame: &RgbImage) -> Result<Option<RawMask>> {
        let _span = tracing::debug_span!("matte_threshold").entered();

        let luma = imageops::grayscale(frame);
        let mask = raw_mask_from_gray(&luma, self.threshold);
        if mask.iter().all(|&v| v == 0) {
            return Ok(None);
        }
        Ok(Some(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn bright_pixels_become_foreground() {
        let mut frame = RgbImage::new(4, 3);
        frame.put_pixel(1, 2, Rgb([255, 255, 255]));
        let mask = MatteThreshold::default().segment(&frame).unwrap().unwrap();
        assert_eq!(mask.shape(), &[3, 4]);
        assert_eq!(mask[[2, 1]], 1);
        assert_eq!(mask.iter().filter(|&&v| v != 0).count(), 1);
    }

    #[test]
    fn dark_frame_has_no_subject() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([40, 40, 40]));
        assert!(MatteThreshold::default().segment(&frame).unwrap().is_none());
    }
}
