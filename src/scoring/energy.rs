use crate::config::EngineConfig;
use crate::features::MotionSample;

/// Calorie heuristic driven by mean flow magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyEstimator {
    resting_rate: f64,
    intensity_scale: f64,
    intensity_min: f64,
    intensity_max: f64,
}

impl EnergyEstimator {
    pub fn new(resting_rate: f64, intensity_scale: f64, intensity_min: f64, intensity_max: f64) -> Self {
        Self {
            resting_rate,
            intensity_scale,
            intensity_min,
            intensity_max,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.resting_rate,
            config.intensity_scale,
            config.intensity_min,
            config.intensity_max,
        )
    }

    /// Dimensionless multiplier on the resting rate
    pub fn intensity_factor(&self, samples: &[MotionSample]) -> f64 {
        let avg_magnitude = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.mean_magnitude).sum::<f64>() / samples.len() as f64
        };
        (1.0 + avg_magnitude * self.intensity_scale).clamp(self.intensity_min, self.intensity_max)
    }

    /// Estimated calories for a performance lasting `duration_seconds`
    pub fn estimate(&self, samples: &[MotionSample], duration_seconds: f64) -> f64 {
        let _span = tracing::debug_span!("estimate_energy").entered();
        let calories_per_minute = self.resting_rate * self.intensity_factor(samples);
        calories_per_minute * (duration_seconds / 60.0)
    }
}

impl Default for EnergyEstimator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
