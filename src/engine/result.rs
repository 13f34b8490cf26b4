use crate::scoring::Feedback;
use serde::{Deserialize, Serialize};

/// Report of one reference/candidate comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Mean IoU along the alignment path, in `[0, 1]`
    pub average_similarity: f64,
    /// Mean motion-magnitude agreement along the path, in `[0, 1]`
    pub flow_similarity: f64,
    /// Largest frame offset between matched frames
    pub max_delay: usize,
    pub ideal_calories: f64,
    pub actual_calories: f64,
    /// Learner guidance; omitted from JSON when there is none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<Feedback>,
}
