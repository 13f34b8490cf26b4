use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayD, IxDyn};

/// Mask as handed over by a producer: any non-zero value is foreground.
/// Layout is (height, width), optionally with a leading or trailing channel axis.
pub type RawMask = ArrayD<u8>;

/// All-false raw mask at the given native resolution
pub fn empty_raw_mask(width: u32, height: u32) -> RawMask {
    ArrayD::zeros(IxDyn(&[height as usize, width as usize]))
}

/// Raw mask from a grayscale image, foreground where luma exceeds `threshold`
pub fn raw_mask_from_gray(image: &GrayImage, threshold: u8) -> RawMask {
    let (width, height) = image.dimensions();
    let mut mask = empty_raw_mask(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] > threshold {
            mask[[y as usize, x as usize]] = 1;
        }
    }
    mask
}

/// Boolean occupancy grid at the configured canonical resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMask {
    grid: Array2<bool>,
}

impl CanonicalMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            grid: Array2::from_elem((height as usize, width as usize), false),
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        let grid = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f(x as u32, y as u32)
        });
        Self { grid }
    }

    /// Foreground wherever the image luma is above `threshold`
    pub fn from_gray_image(image: &GrayImage, threshold: u8) -> Self {
        let (width, height) = image.dimensions();
        Self::from_fn(width, height, |x, y| image.get_pixel(x, y)[0] > threshold)
    }

    pub fn width(&self) -> u32 {
        self.grid.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.grid.nrows() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.grid[[y as usize, x as usize]]
    }

    pub fn grid(&self) -> &Array2<bool> {
        &self.grid
    }

    pub fn foreground_count(&self) -> usize {
        self.grid.iter().filter(|&&v| v).count()
    }

    pub fn has_foreground(&self) -> bool {
        self.grid.iter().any(|&v| v)
    }

    /// Two-level rendering: 255 for foreground, 0 for background
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}
