use crate::error::{ComparisonError, Result};

/// Parameters of the Farneback dense-flow estimate
#[derive(Debug, Clone, PartialEq)]
pub struct FlowParams {
    /// Scale between consecutive pyramid levels (< 1)
    pub pyr_scale: f32,
    /// Number of pyramid levels including the full-resolution one
    pub levels: usize,
    /// Side of the averaging window used when solving for displacement
    pub window_size: usize,
    /// Displacement refinements per pyramid level
    pub iterations: usize,
    /// Side of the neighbourhood used for the polynomial expansion
    pub poly_n: usize,
    /// Gaussian sigma weighting the polynomial neighbourhood
    pub poly_sigma: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            window_size: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
        }
    }
}

/// Cut-offs that turn comparison metrics into learner feedback
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackThresholds {
    /// Average similarity below this asks for better form
    pub min_similarity: f64,
    /// Lag in frames above this asks the learner to keep pace
    pub max_delay: usize,
    /// Speed ratio below this means the learner moves too slowly
    pub slow_speed_ratio: f64,
    /// Speed ratio above this means the learner moves too fast
    pub fast_speed_ratio: f64,
    /// Mean magnitude difference above this flags a mismatched movement pattern
    pub max_flow_difference: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            min_similarity: 0.7,
            max_delay: 10,
            slow_speed_ratio: 0.8,
            fast_speed_ratio: 1.2,
            max_flow_difference: 0.5,
        }
    }
}

/// Tunable constants of a comparison
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub canonical_width: u32,
    pub canonical_height: u32,
    /// Sampling interval between consecutive masks
    pub seconds_per_frame: f64,
    /// Resting metabolic rate in calories per minute
    pub resting_rate: f64,
    /// Maps mean flow magnitude to a dimensionless intensity multiplier
    pub intensity_scale: f64,
    pub intensity_min: f64,
    pub intensity_max: f64,
    /// Floor for the flow-similarity denominator
    pub epsilon: f64,
    /// Per-frame worker threads; `None` uses one per core
    pub worker_threads: Option<usize>,
    pub flow: FlowParams,
    pub feedback: FeedbackThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canonical_width: 480,
            canonical_height: 480,
            seconds_per_frame: 3.0,
            resting_rate: 1.2,
            intensity_scale: 8.0,
            intensity_min: 1.0,
            intensity_max: 5.0,
            epsilon: 0.001,
            worker_threads: None,
            flow: FlowParams::default(),
            feedback: FeedbackThresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_canonical_size(mut self, width: u32, height: u32) -> Self {
        self.canonical_width = width;
        self.canonical_height = height;
        self
    }

    pub fn with_seconds_per_frame(mut self, seconds: f64) -> Self {
        self.seconds_per_frame = seconds;
        self
    }

    pub fn canonical_size(&self) -> (u32, u32) {
        (self.canonical_width, self.canonical_height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(ComparisonError::InvalidConfig(format!(
                "canonical size must be non-zero, got {}x{}",
                self.canonical_width, self.canonical_height
            )));
        }
        if !(self.seconds_per_frame.is_finite() && self.seconds_per_frame > 0.0) {
            return Err(ComparisonError::InvalidConfig(format!(
                "seconds per frame must be positive, got {}",
                self.seconds_per_frame
            )));
        }
        if !(self.resting_rate.is_finite() && self.resting_rate >= 0.0) {
            return Err(ComparisonError::InvalidConfig(format!(
                "resting rate must be non-negative, got {}",
                self.resting_rate
            )));
        }
        if !(self.intensity_scale.is_finite() && self.intensity_scale >= 0.0) {
            return Err(ComparisonError::InvalidConfig(format!(
                "intensity scale must be non-negative, got {}",
                self.intensity_scale
            )));
        }
        if !(self.intensity_min.is_finite() && self.intensity_min >= 0.0 && self.intensity_max.is_finite()) {
            return Err(ComparisonError::InvalidConfig(format!(
                "intensity bounds must be finite and non-negative: [{}, {}]",
                self.intensity_min, self.intensity_max
            )));
        }
        if !(self.intensity_min <= self.intensity_max) {
            return Err(ComparisonError::InvalidConfig(format!(
                "intensity bounds inverted: [{}, {}]",
                self.intensity_min, self.intensity_max
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ComparisonError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(ComparisonError::InvalidConfig(
                "worker thread count must be at least 1".to_string(),
            ));
        }
        let flow = &self.flow;
        if !(flow.pyr_scale > 0.0 && flow.pyr_scale < 1.0)
            || flow.levels == 0
            || flow.window_size == 0
            || flow.iterations == 0
            || flow.poly_n < 3
            || flow.poly_n % 2 == 0
            || !(flow.poly_sigma > 0.0)
        {
            return Err(ComparisonError::InvalidConfig(format!(
                "invalid flow parameters: {:?}",
                flow
            )));
        }
        let feedback = &self.feedback;
        if !(feedback.min_similarity.is_finite()
            && feedback.slow_speed_ratio.is_finite()
            && feedback.fast_speed_ratio.is_finite()
            && feedback.max_flow_difference.is_finite()
            && feedback.slow_speed_ratio <= feedback.fast_speed_ratio)
        {
            return Err(ComparisonError::InvalidConfig(format!(
                "invalid feedback thresholds: {:?}",
                feedback
            )));
        }
        Ok(())
    }
}
