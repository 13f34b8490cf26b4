//! Silhouette sequence comparison.
//!
//! Compares a reference performance against a learner performance of the same
//! exercise, both given as per-frame binary subject masks. Masks are brought to
//! a canonical size, reduced to shape features and dense-flow motion samples,
//! aligned with dynamic time warping and scored for spatial overlap, motion
//! agreement, temporal lag and estimated energy expenditure.
//!
//! ```no_run
//! use silhouette_compare::{ComparisonEngine, EngineConfig, RawMask};
//!
//! # fn load() -> Vec<RawMask> { Vec::new() }
//! let engine = ComparisonEngine::new(EngineConfig::default())?;
//! let reference: Vec<RawMask> = load();
//! let learner: Vec<RawMask> = load();
//! let report = engine.compare(&reference, &learner)?;
//! println!("similarity {:.2}, lag {} frames", report.average_similarity, report.max_delay);
//! # Ok::<(), silhouette_compare::ComparisonError>(())
//! ```

pub mod align;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod mask;
pub mod output;
pub mod scoring;
pub mod segmentation;

pub use align::{AlignmentPath, SequenceAligner};
pub use config::{EngineConfig, FeedbackThresholds, FlowParams};
pub use engine::{ComparisonEngine, ComparisonResult, ReferenceCache, SequenceProfile};
pub use error::{ComparisonError, Fallback, Outcome, Result, SequenceRole};
pub use features::{MotionFieldEstimator, MotionSample, ShapeFeature, ShapeFeatureExtractor};
pub use mask::{CanonicalMask, MaskNormalizer, RawMask};
pub use scoring::{
    intersection_over_union, EnergyEstimator, Feedback, FeedbackAdvisor, MotionPace, SimilarityScorer,
    SimilarityScores,
};
