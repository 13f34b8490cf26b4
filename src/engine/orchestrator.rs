use super::cache::ReferenceCache;
use super::profile::SequenceProfile;
use super::result::ComparisonResult;
use crate::align::SequenceAligner;
use crate::config::EngineConfig;
use crate::error::{ComparisonError, Result, SequenceRole};
use crate::features::{MotionFieldEstimator, ShapeFeatureExtractor};
use crate::mask::{MaskNormalizer, RawMask};
use crate::scoring::{EnergyEstimator, FeedbackAdvisor, MotionPace, SimilarityScorer};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Compares learner mask sequences against reference sequences
///
/// Owns the per-frame worker pool and the reference cache, so several
/// comparisons against one reference can run concurrently from different
/// threads through a shared `&ComparisonEngine`.
pub struct ComparisonEngine {
    config: EngineConfig,
    normalizer: MaskNormalizer,
    extractor: ShapeFeatureExtractor,
    motion: MotionFieldEstimator,
    aligner: SequenceAligner,
    scorer: SimilarityScorer,
    energy: EnergyEstimator,
    advisor: FeedbackAdvisor,
    cache: ReferenceCache,
    pool: ThreadPool,
}

impl ComparisonEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("frame-worker-{}", i));
        if let Some(threads) = config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| ComparisonError::InvalidConfig(format!("worker pool: {}", e)))?;

        tracing::debug!(
            "Comparison engine ready: canonical {}x{}, {} workers",
            config.canonical_width,
            config.canonical_height,
            pool.current_num_threads()
        );

        Ok(Self {
            normalizer: MaskNormalizer::new(config.canonical_width, config.canonical_height),
            extractor: ShapeFeatureExtractor::new(),
            motion: MotionFieldEstimator::new(config.flow.clone()),
            aligner: SequenceAligner::new(),
            scorer: SimilarityScorer::new(config.epsilon),
            energy: EnergyEstimator::from_config(&config),
            advisor: FeedbackAdvisor::new(config.feedback.clone()),
            cache: ReferenceCache::new(),
            pool,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Normalize a raw sequence and derive its shape features and motion samples
    ///
    /// Frames and transitions are processed on the worker pool; output order
    /// always follows frame order.
    pub fn profile(&self, raw: &[RawMask]) -> SequenceProfile {
        let _span = tracing::debug_span!("profile", frames = raw.len()).entered();

        self.pool.install(|| {
            let masks: Vec<_> = raw
                .par_iter()
                .map(|mask| self.normalizer.normalize(mask).into_value("normalize"))
                .collect();

            let features = masks
                .par_iter()
                .map(|mask| self.extractor.extract(mask).into_value("shape"))
                .collect();

            let motion = self.motion.estimate_sequence(&masks);

            SequenceProfile {
                masks,
                features,
                motion,
            }
        })
    }

    /// Compare two raw mask sequences
    pub fn compare(&self, reference: &[RawMask], candidate: &[RawMask]) -> Result<ComparisonResult> {
        ensure_non_empty(reference.len(), candidate.len())?;
        let reference = self.profile(reference);
        let candidate = self.profile(candidate);
        self.compare_profiles(&reference, &candidate)
    }

    /// Compare a candidate against a cached reference
    ///
    /// `load_reference` runs at most once per key across all callers; an empty
    /// reference is dropped from the cache so a later call can reload it.
    pub fn compare_with_reference<F>(
        &self,
        reference_key: &str,
        load_reference: F,
        candidate: &[RawMask],
    ) -> Result<ComparisonResult>
    where
        F: FnOnce() -> Vec<RawMask>,
    {
        let reference = self.reference_profile(reference_key, load_reference);
        if reference.is_empty() {
            self.cache.invalidate(reference_key);
        }
        ensure_non_empty(reference.frame_count(), candidate.len())?;

        let candidate = self.profile(candidate);
        self.compare_profiles(&reference, &candidate)
    }

    pub fn reference_profile<F>(&self, reference_key: &str, load_reference: F) -> Arc<SequenceProfile>
    where
        F: FnOnce() -> Vec<RawMask>,
    {
        self.cache
            .get_or_compute(reference_key, || self.profile(&load_reference()))
    }

    /// Align, score and estimate energy for two prepared profiles
    pub fn compare_profiles(
        &self,
        reference: &SequenceProfile,
        candidate: &SequenceProfile,
    ) -> Result<ComparisonResult> {
        let _span = tracing::debug_span!("compare").entered();

        let path = self.aligner.align(&reference.features, &candidate.features)?;

        let scores = self.scorer.score(
            &reference.masks,
            &candidate.masks,
            &reference.motion,
            &candidate.motion,
            &path,
        );

        let spf = self.config.seconds_per_frame;
        let ideal_calories = self
            .energy
            .estimate(&reference.motion, reference.duration_seconds(spf));
        let actual_calories = self
            .energy
            .estimate(&candidate.motion, candidate.duration_seconds(spf));

        let mut result = ComparisonResult {
            average_similarity: scores.spatial_similarity,
            flow_similarity: scores.motion_similarity,
            max_delay: scores.max_delay,
            ideal_calories,
            actual_calories,
            feedback: Vec::new(),
        };
        let pace = MotionPace {
            speed_ratio: scores.speed_ratio,
            flow_difference: scores.flow_difference,
        };
        result.feedback = self.advisor.advise(&result, &pace);

        tracing::info!(
            "Compared {} reference / {} candidate frames: similarity={:.3}, flow={:.3}, max_delay={}, calories={:.2}/{:.2}",
            reference.frame_count(),
            candidate.frame_count(),
            result.average_similarity,
            result.flow_similarity,
            result.max_delay,
            result.ideal_calories,
            result.actual_calories
        );
        for item in &result.feedback {
            tracing::debug!("Feedback: {}", item);
        }

        Ok(result)
    }
}

fn ensure_non_empty(reference_len: usize, candidate_len: usize) -> Result<()> {
    match (reference_len, candidate_len) {
        (0, 0) => Err(ComparisonError::BothSequencesEmpty),
        (0, _) => Err(ComparisonError::EmptySequence {
            role: SequenceRole::Reference,
        }),
        (_, 0) => Err(ComparisonError::EmptySequence {
            role: SequenceRole::Candidate,
        }),
        _ => Ok(()),
    }
}
