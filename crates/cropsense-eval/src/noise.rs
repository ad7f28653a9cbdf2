//! Noise injection engine
//!
//! Each run perturbs N, P and K by independently drawn relative magnitudes
//! with independent random signs, clips to the nutrient domain and classifies
//! the rebuilt vector. All perturbations are drawn up front from the injected
//! RNG so a seeded run is reproducible regardless of how the classifications
//! are scheduled; classification then fans out over a bounded set of blocking
//! workers.

use crate::config::{check_magnitude_range, NoiseConfig};
use crate::report::{Distribution, NoiseLevelReport, NoiseReport};
use cropsense_core::{Error, Feature, InputRecord, Result, NUTRIENT_MAX, NUTRIENT_MIN};
use cropsense_models::{ModelId, ModelRegistry, SharedRegistry};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Inclusive range of relative perturbation magnitudes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeRange {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        check_magnitude_range(min, max)?;
        Ok(Self { min, max })
    }

    /// Symmetric level: magnitudes drawn from [0, level]
    pub fn up_to(level: f64) -> Result<Self> {
        Self::new(0.0, level)
    }
}

/// Signed relative change for each of N, P, K
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    factors: [f64; 3],
}

impl Perturbation {
    pub fn draw(rng: &mut impl Rng, range: MagnitudeRange) -> Self {
        let mut factors = [0.0; 3];
        for factor in factors.iter_mut() {
            let magnitude = rng.gen_range(range.min..=range.max);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            *factor = sign * magnitude;
        }
        Self { factors }
    }

    /// Perturb the nutrients of an already zero-substituted record
    pub fn apply(&self, record: &InputRecord) -> InputRecord {
        let mut next = record.clone();
        for (feature, factor) in Feature::NUTRIENTS.iter().zip(self.factors) {
            next = next.with(*feature, perturb(record.get(*feature), factor));
        }
        next
    }

    /// Relative change each nutrient actually receives after clipping
    pub fn applied_magnitudes(&self, record: &InputRecord) -> [f64; 3] {
        let mut applied = [0.0; 3];
        for ((slot, feature), factor) in applied
            .iter_mut()
            .zip(Feature::NUTRIENTS)
            .zip(self.factors)
        {
            let base = record.get(feature);
            if base > 0.0 {
                *slot = (perturb(base, factor) - base).abs() / base;
            }
        }
        applied
    }
}

fn perturb(value: f64, factor: f64) -> f64 {
    (value * (1.0 + factor)).clamp(NUTRIENT_MIN, NUTRIENT_MAX)
}

#[derive(Debug, Clone)]
pub struct NoiseEngine {
    config: NoiseConfig,
}

impl NoiseEngine {
    pub fn new(config: NoiseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// RNG for one evaluation: seeded when configured, otherwise from entropy
    pub fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Worker count for a given number of runs
    fn workers(&self, runs: usize) -> usize {
        self.config
            .max_concurrency
            .min(num_cpus::get())
            .min(runs)
            .max(1)
    }

    /// Evaluate with the configured magnitude range
    pub async fn evaluate(
        &self,
        registry: &SharedRegistry,
        record: &InputRecord,
        model: ModelId,
        runs: usize,
        rng: &mut StdRng,
    ) -> Result<NoiseReport> {
        let range = MagnitudeRange::new(self.config.min_magnitude, self.config.max_magnitude)?;
        self.evaluate_with_range(registry, record, model, runs, range, rng)
            .await
    }

    /// Evaluate with an explicit magnitude range
    pub async fn evaluate_with_range(
        &self,
        registry: &SharedRegistry,
        record: &InputRecord,
        model: ModelId,
        runs: usize,
        range: MagnitudeRange,
        rng: &mut StdRng,
    ) -> Result<NoiseReport> {
        if runs == 0 {
            return Err(Error::invalid_parameter(
                "runs must be at least 1 to compute a stability score",
            ));
        }

        let handle = registry.get(model)?;
        let baseline = handle.predict(&registry.feature_builder().build(record)?)?;

        let perturbations: Vec<Perturbation> =
            (0..runs).map(|_| Perturbation::draw(rng, range)).collect();

        let resolved = Arc::new(record.with_soil_defaults());
        let noise_percentage = perturbations
            .iter()
            .flat_map(|p| p.applied_magnitudes(&resolved))
            .sum::<f64>()
            / (runs * Feature::NUTRIENTS.len()) as f64
            * 100.0;
        let workers = self.workers(runs);
        let chunk_size = runs.div_ceil(workers);
        debug!(
            "Noise evaluation: {} runs on {} workers ({} per worker)",
            runs, workers, chunk_size
        );

        let tasks: Vec<_> = perturbations
            .chunks(chunk_size)
            .map(|chunk| {
                let chunk = chunk.to_vec();
                let registry = Arc::clone(registry);
                let resolved = Arc::clone(&resolved);
                tokio::task::spawn_blocking(move || {
                    classify_chunk(&registry, model, &resolved, &chunk)
                })
            })
            .collect();

        let mut distribution = Distribution::new();
        for joined in join_all(tasks).await {
            let counts = joined
                .map_err(|e| Error::internal(format!("noise worker panicked: {}", e)))??;
            for (label, count) in counts {
                *distribution.entry(label).or_insert(0) += count;
            }
        }

        let matches = distribution.get(&baseline.label).copied().unwrap_or(0);
        let rss = matches as f64 / runs as f64;

        info!(
            model = %model,
            rss,
            runs,
            "Noise evaluation complete: baseline {}",
            baseline.label
        );

        Ok(NoiseReport {
            predicted_crop: baseline.label.clone(),
            baseline_crop: baseline.label,
            rss,
            matches,
            prediction_changes: runs - matches,
            total_runs: runs,
            noise_percentage,
            prediction_distribution: distribution,
        })
    }

    /// Run once per fixed noise level, magnitudes drawn from [0, level]
    pub async fn evaluate_levels(
        &self,
        registry: &SharedRegistry,
        record: &InputRecord,
        model: ModelId,
        levels: &[f64],
        runs_per_level: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<NoiseLevelReport>> {
        let mut reports = Vec::with_capacity(levels.len());
        for &level in levels {
            let range = MagnitudeRange::up_to(level)?;
            let report = self
                .evaluate_with_range(registry, record, model, runs_per_level, range, rng)
                .await?;
            reports.push(NoiseLevelReport { level, report });
        }
        Ok(reports)
    }
}

/// Classify one worker's share of perturbations into a local count map
fn classify_chunk(
    registry: &ModelRegistry,
    model: ModelId,
    resolved: &InputRecord,
    chunk: &[Perturbation],
) -> Result<HashMap<String, usize>> {
    let handle = registry.get(model)?;
    let builder = registry.feature_builder();
    let mut counts = HashMap::new();

    for perturbation in chunk {
        let vector = builder.build(&perturbation.apply(resolved))?;
        let prediction = handle.predict(&vector)?;
        *counts.entry(prediction.label).or_insert(0) += 1;
    }
    Ok(counts)
}
