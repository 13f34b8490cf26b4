use ndarray::{ArrayD, IxDyn};
use silhouette_compare::{
    ComparisonEngine, ComparisonError, EngineConfig, RawMask, SequenceAligner, SequenceRole,
    ShapeFeature,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const SIZE: usize = 10;

fn blank() -> RawMask {
    ArrayD::zeros(IxDyn(&[SIZE, SIZE]))
}

/// 4x4 filled square with its left edge at column `x0`
fn square(x0: usize) -> RawMask {
    let mut mask = blank();
    for y in 3..7 {
        for x in x0..x0 + 4 {
            mask[[y, x]] = 1;
        }
    }
    mask
}

fn sliding(frames: usize) -> Vec<RawMask> {
    (0..frames).map(|k| square(1 + k)).collect()
}

fn engine_with(seconds_per_frame: f64) -> ComparisonEngine {
    let config = EngineConfig {
        worker_threads: Some(2),
        ..EngineConfig::default()
            .with_canonical_size(SIZE as u32, SIZE as u32)
            .with_seconds_per_frame(seconds_per_frame)
    };
    ComparisonEngine::new(config).unwrap()
}

#[test]
fn identical_static_sequences_match_perfectly() {
    let engine = engine_with(3.0);
    let reference = vec![square(3); 5];
    let candidate = reference.clone();

    let result = engine.compare(&reference, &candidate).unwrap();
    assert_eq!(result.average_similarity, 1.0);
    assert_eq!(result.max_delay, 0);
    assert_eq!(result.flow_similarity, 1.0);
    // No motion: resting rate over 15 seconds
    assert!((result.ideal_calories - 1.2 * 15.0 / 60.0).abs() < 1e-12);
    assert_eq!(result.ideal_calories, result.actual_calories);
}

#[test]
fn delayed_candidate_reports_lag() {
    let engine = engine_with(3.0);
    let reference = sliding(5);
    let mut candidate = vec![blank(), blank()];
    candidate.extend(reference[..3].iter().cloned());

    let result = engine.compare(&reference, &candidate).unwrap();
    assert_eq!(result.max_delay, 2);
    assert!(result.average_similarity < 1.0);
    assert!(result.average_similarity > 0.0);
    assert!((0.0..=1.0).contains(&result.flow_similarity));
}

#[test]
fn empty_candidate_fails_before_scoring() {
    let features = vec![ShapeFeature::zero(); 3];
    assert_eq!(
        SequenceAligner::new().align(&features, &[]),
        Err(ComparisonError::EmptySequence {
            role: SequenceRole::Candidate
        })
    );

    let engine = engine_with(3.0);
    assert_eq!(
        engine.compare(&sliding(3), &[]),
        Err(ComparisonError::EmptySequence {
            role: SequenceRole::Candidate
        })
    );
}

#[test]
fn self_comparison_of_moving_sequence() {
    let engine = engine_with(3.0);
    let reference = sliding(5);

    let result = engine.compare(&reference, &reference.clone()).unwrap();
    assert_eq!(result.average_similarity, 1.0);
    assert_eq!(result.max_delay, 0);
    assert_eq!(result.flow_similarity, 1.0);
    assert_eq!(result.ideal_calories, result.actual_calories);
    assert!(result.ideal_calories >= 1.2 * 15.0 / 60.0);
}

#[test]
fn calories_are_linear_in_sampling_interval() {
    let reference = sliding(5);
    let candidate = sliding(5);

    let short = engine_with(3.0).compare(&reference, &candidate).unwrap();
    let long = engine_with(6.0).compare(&reference, &candidate).unwrap();

    assert!((long.ideal_calories - 2.0 * short.ideal_calories).abs() < 1e-9);
    assert!((long.actual_calories - 2.0 * short.actual_calories).abs() < 1e-9);
    assert_eq!(long.average_similarity, short.average_similarity);
}

#[test]
fn masks_of_any_native_size_are_canonicalized() {
    let engine = engine_with(3.0);
    let reference = sliding(4);
    // Same scene at twice the resolution with a trailing channel axis
    let candidate: Vec<RawMask> = reference
        .iter()
        .map(|mask| {
            ArrayD::from_shape_fn(IxDyn(&[SIZE * 2, SIZE * 2, 1]), |idx| {
                mask[[idx[0] / 2, idx[1] / 2]]
            })
        })
        .collect();

    let result = engine.compare(&reference, &candidate).unwrap();
    assert_eq!(result.average_similarity, 1.0);
    assert_eq!(result.max_delay, 0);
}

#[test]
fn malformed_frames_degrade_scores_without_failing() {
    let engine = engine_with(3.0);
    let clean = sliding(5);
    let mut mixed = clean.clone();
    mixed[2] = ArrayD::ones(IxDyn(&[2, 2, 2, 2]));
    mixed[3] = ArrayD::zeros(IxDyn(&[0, SIZE]));

    let profile = engine.profile(&mixed);
    assert_eq!(profile.frame_count(), 5);
    assert_eq!(profile.motion.len(), 4);
    assert!(!profile.masks[2].has_foreground());
    assert!(!profile.masks[3].has_foreground());
    assert_eq!(profile.masks[3].dimensions(), (SIZE as u32, SIZE as u32));
    assert_eq!(profile.features[2], ShapeFeature::zero());

    let result = engine.compare(&clean, &mixed).unwrap();
    assert!(result.average_similarity < 1.0);
    assert!(result.average_similarity > 0.0);
    assert!(result.max_delay <= 4);
    assert!((0.0..=1.0).contains(&result.flow_similarity));
    assert!(result.actual_calories.is_finite());
    assert!(result.actual_calories >= 1.2 * 15.0 / 60.0);
}

#[test]
fn concurrent_learners_share_one_reference_profile() {
    let engine = engine_with(3.0);
    let reference = sliding(5);
    let loads = AtomicUsize::new(0);

    let learners: Vec<Vec<RawMask>> = vec![sliding(5), sliding(4), vec![square(2); 5], sliding(5)];

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = learners
            .iter()
            .map(|learner| {
                let (engine, reference, loads) = (&engine, &reference, &loads);
                scope.spawn(move || {
                    engine.compare_with_reference(
                        "instructor",
                        || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            reference.clone()
                        },
                        learner,
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0], results[3]);
    assert_eq!(results[0].average_similarity, 1.0);
    assert!(engine.cache().get("instructor").is_some());
}
