mod energy;
mod feedback;
mod similarity;

pub use energy::EnergyEstimator;
pub use feedback::{Feedback, FeedbackAdvisor, MotionPace};
pub use similarity::{intersection_over_union, SimilarityScorer, SimilarityScores};
