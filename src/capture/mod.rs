mod directory;

pub use directory::ImageDirectory;

use anyhow::Result;
use image::RgbImage;

/// Trait for ordered frame sources
pub trait FrameSource {
    /// Next frame in time order, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Frames not yet returned, when known
    fn remaining(&self) -> Option<usize> {
        None
    }
}
