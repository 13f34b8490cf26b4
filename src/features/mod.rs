pub mod flow;
mod motion;
mod shape;

pub use flow::{FarnebackFlow, FlowField};
pub use motion::{MotionFieldEstimator, MotionSample};
pub use shape::{ShapeFeature, ShapeFeatureExtractor};
