mod normalize;
pub mod types;

pub use normalize::{resize_nearest, MaskNormalizer};
pub use types::{empty_raw_mask, raw_mask_from_gray, CanonicalMask, RawMask};
