use crate::config::FeedbackThresholds;
use crate::engine::ComparisonResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Learner guidance derived from one comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    ImproveForm,
    KeepPace,
    TooSlow,
    TooFast,
    PatternMismatch,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Feedback::ImproveForm => "Your form needs improvement",
            Feedback::KeepPace => "Try to keep up with the trainer's pace",
            Feedback::TooSlow => "Your movements are too slow",
            Feedback::TooFast => "Your movements are too fast",
            Feedback::PatternMismatch => "Your movement patterns don't match the trainer's",
        };
        f.write_str(text)
    }
}

/// Relative movement metrics along the alignment path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPace {
    pub speed_ratio: f64,
    pub flow_difference: f64,
}

impl Default for MotionPace {
    fn default() -> Self {
        Self {
            speed_ratio: 1.0,
            flow_difference: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackAdvisor {
    thresholds: FeedbackThresholds,
}

impl FeedbackAdvisor {
    pub fn new(thresholds: FeedbackThresholds) -> Self {
        Self { thresholds }
    }

    /// Feedback items in a fixed order: form, pace, speed, pattern
    pub fn advise(&self, result: &ComparisonResult, pace: &MotionPace) -> Vec<Feedback> {
        let t = &self.thresholds;
        let mut feedback = Vec::new();

        if result.average_similarity < t.min_similarity {
            feedback.push(Feedback::ImproveForm);
        }
        if result.max_delay > t.max_delay {
            feedback.push(Feedback::KeepPace);
        }
        if pace.speed_ratio < t.slow_speed_ratio {
            feedback.push(Feedback::TooSlow);
        } else if pace.speed_ratio > t.fast_speed_ratio {
            feedback.push(Feedback::TooFast);
        }
        if pace.flow_difference > t.max_flow_difference {
            feedback.push(Feedback::PatternMismatch);
        }

        feedback
    }
}

impl Default for FeedbackAdvisor {
    fn default() -> Self {
        Self::new(FeedbackThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(average_similarity: f64, max_delay: usize) -> ComparisonResult {
        ComparisonResult {
            average_similarity,
            flow_similarity: 1.0,
            max_delay,
            ideal_calories: 0.3,
            actual_calories: 0.3,
            feedback: Vec::new(),
        }
    }

    fn pace(speed_ratio: f64, flow_difference: f64) -> MotionPace {
        MotionPace {
            speed_ratio,
            flow_difference,
        }
    }

    #[test]
    fn matching_performance_needs_no_feedback() {
        let advisor = FeedbackAdvisor::default();
        assert!(advisor.advise(&result(1.0, 0), &MotionPace::default()).is_empty());
    }

    #[test]
    fn form_threshold_is_strict() {
        let advisor = FeedbackAdvisor::default();
        let ok = MotionPace::default();
        assert!(advisor.advise(&result(0.7, 0), &ok).is_empty());
        assert_eq!(advisor.advise(&result(0.699, 0), &ok), vec![Feedback::ImproveForm]);
    }

    #[test]
    fn delay_threshold_is_strict() {
        let advisor = FeedbackAdvisor::default();
        let ok = MotionPace::default();
        assert!(advisor.advise(&result(1.0, 10), &ok).is_empty());
        assert_eq!(advisor.advise(&result(1.0, 11), &ok), vec![Feedback::KeepPace]);
    }

    #[test]
    fn speed_ratio_band() {
        let advisor = FeedbackAdvisor::default();
        let r = result(1.0, 0);
        assert!(advisor.advise(&r, &pace(0.8, 0.0)).is_empty());
        assert!(advisor.advise(&r, &pace(1.2, 0.0)).is_empty());
        assert_eq!(advisor.advise(&r, &pace(0.79, 0.0)), vec![Feedback::TooSlow]);
        assert_eq!(advisor.advise(&r, &pace(1.21, 0.0)), vec![Feedback::TooFast]);
    }

    #[test]
    fn flow_difference_threshold_is_strict() {
        let advisor = FeedbackAdvisor::default();
        let r = result(1.0, 0);
        assert!(advisor.advise(&r, &pace(1.0, 0.5)).is_empty());
        assert_eq!(
            advisor.advise(&r, &pace(1.0, 0.51)),
            vec![Feedback::PatternMismatch]
        );
    }

    #[test]
    fn every_item_in_fixed_order() {
        let advisor = FeedbackAdvisor::default();
        assert_eq!(
            advisor.advise(&result(0.2, 12), &pace(0.1, 3.0)),
            vec![
                Feedback::ImproveForm,
                Feedback::KeepPace,
                Feedback::TooSlow,
                Feedback::PatternMismatch
            ]
        );
    }

    #[test]
    fn custom_thresholds_apply() {
        let advisor = FeedbackAdvisor::new(FeedbackThresholds {
            max_delay: 1,
            ..FeedbackThresholds::default()
        });
        assert_eq!(
            advisor.advise(&result(1.0, 2), &MotionPace::default()),
            vec![Feedback::KeepPace]
        );
    }

    #[test]
    fn serializes_as_snake_case_codes() {
        let json = serde_json::to_string(&vec![Feedback::TooFast, Feedback::KeepPace]).unwrap();
        assert_eq!(json, r#"["too_fast","keep_pace"]"#);
        assert_eq!(Feedback::TooSlow.to_string(), "Your movements are too slow");
    }
}
