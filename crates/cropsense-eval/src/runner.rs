//! Evaluation runner
//!
//! Exposes the four evaluation operations. A full evaluation computes the
//! baseline, fans out to the noise, missing-feature and agreement axes under
//! a per-axis timeout, then aggregates whatever completed. The runner keeps
//! no state between calls.

use crate::agreement::ModelComparator;
use crate::config::EvaluationConfig;
use crate::confidence::ConfidenceAggregator;
use crate::missing::MissingFeatureSimulator;
use crate::noise::NoiseEngine;
use crate::report::{
    AgreementReport, Axis, AxisFailure, EvaluationReport, MissingFeatureReport, NoiseLevelReport,
    NoiseReport,
};
use cropsense_core::{Error, InputRecord, Result};
use cropsense_models::{Prediction, SharedRegistry};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct EvaluationRunner {
    registry: SharedRegistry,
    config: EvaluationConfig,
    noise: NoiseEngine,
    missing: MissingFeatureSimulator,
    comparator: ModelComparator,
    aggregator: ConfidenceAggregator,
}

impl EvaluationRunner {
    /// Create a runner over a loaded registry
    pub fn new(registry: SharedRegistry, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        if !registry.has_model(config.base_model) {
            return Err(Error::model_unavailable(format!(
                "base model '{}' is not loaded",
                config.base_model
            )));
        }

        Ok(Self {
            noise: NoiseEngine::new(config.noise.clone())?,
            missing: MissingFeatureSimulator::new(),
            comparator: ModelComparator::new(),
            aggregator: ConfidenceAggregator::new(&config.confidence),
            registry,
            config,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Noise stability of the base model
    pub async fn noise(&self, record: &InputRecord) -> Result<NoiseReport> {
        self.instrumented("noise", self.run_noise(record)).await
    }

    /// Noise stability at each configured fixed level
    pub async fn noise_levels(&self, record: &InputRecord) -> Result<Vec<NoiseLevelReport>> {
        let mut rng = self.noise.rng();
        let future = self.noise.evaluate_levels(
            &self.registry,
            record,
            self.config.base_model,
            &self.config.noise.levels,
            self.config.noise.runs,
            &mut rng,
        );
        self.instrumented("noise_levels", future).await
    }

    /// Sensitivity of the base model to missing inputs
    pub async fn missing(&self, record: &InputRecord) -> Result<MissingFeatureReport> {
        self.instrumented("missing", self.run_missing(record)).await
    }

    /// Agreement across every registered model
    pub async fn agreement(&self, record: &InputRecord) -> Result<AgreementReport> {
        self.instrumented("agreement", self.run_agreement(record))
            .await
    }

    /// Best-effort evaluation across all axes
    pub async fn full(&self, record: &InputRecord) -> Result<EvaluationReport> {
        self.instrumented("full", self.run_full(record)).await
    }

    async fn run_noise(&self, record: &InputRecord) -> Result<NoiseReport> {
        let mut rng = self.noise.rng();
        self.noise
            .evaluate(
                &self.registry,
                record,
                self.config.base_model,
                self.config.noise.runs,
                &mut rng,
            )
            .await
    }

    async fn run_missing(&self, record: &InputRecord) -> Result<MissingFeatureReport> {
        let registry = Arc::clone(&self.registry);
        let simulator = self.missing;
        let model = self.config.base_model;
        let record = record.clone();

        tokio::task::spawn_blocking(move || simulator.evaluate(&registry, &record, model))
            .await
            .map_err(|e| Error::internal(format!("missing-feature worker panicked: {}", e)))?
    }

    async fn run_agreement(&self, record: &InputRecord) -> Result<AgreementReport> {
        self.comparator.evaluate(&self.registry, record).await
    }

    /// Base-model prediction on the unperturbed record, under the axis budget
    async fn baseline(&self, record: &InputRecord) -> Result<Prediction> {
        let handle = self.registry.get(self.config.base_model)?.clone();
        let vector = self.registry.feature_builder().build(record)?;

        let task = tokio::task::spawn_blocking(move || handle.predict(&vector));
        let budget = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(budget, task).await {
            Ok(joined) => joined
                .map_err(|e| Error::internal(format!("baseline worker panicked: {}", e)))?,
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn run_full(&self, record: &InputRecord) -> Result<EvaluationReport> {
        let baseline = self.baseline(record).await?;

        let (noise, missing, agreement) = tokio::join!(
            self.run_axis(Axis::Noise, self.run_noise(record)),
            self.run_axis(Axis::MissingFeature, self.run_missing(record)),
            self.run_axis(Axis::ModelAgreement, self.run_agreement(record)),
        );

        let mut failures = Vec::new();
        let noise = noise.map_err(|f| failures.push(f)).ok();
        let missing = missing.map_err(|f| failures.push(f)).ok();
        let agreement = agreement.map_err(|f| failures.push(f)).ok();

        let stability = noise.as_ref().map(|r| r.rss);
        let agreement_ratio = agreement.as_ref().map(|r| r.agreement_ratio);
        let score =
            self.aggregator
                .aggregate_partial(Some(baseline.probability), agreement_ratio, stability);

        info!(
            confidence = score.confidence,
            level = %score.confidence_level,
            failed_axes = failures.len(),
            "Full evaluation complete: {}",
            baseline.label
        );

        Ok(EvaluationReport {
            predicted_crop: baseline.label,
            confidence: score.confidence,
            confidence_level: score.confidence_level,
            probability: baseline.probability,
            stability,
            agreement: agreement_ratio,
            rss_score: stability,
            missing_feature_stability: missing.as_ref().map(|r| r.stability_score),
            model_agreement_ratio: agreement_ratio,
            noise_test: noise,
            missing_feature_test: missing,
            model_agreement_test: agreement,
            failures,
        })
    }

    /// Run one axis under the configured timeout, converting errors to a diagnostic
    async fn run_axis<T>(
        &self,
        axis: Axis,
        future: impl Future<Output = Result<T>>,
    ) -> std::result::Result<T, AxisFailure> {
        let budget = Duration::from_millis(self.config.timeout_ms);
        let result = match tokio::time::timeout(budget, future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        };

        result.map_err(|e| {
            let failure = AxisFailure::new(axis, &e);
            warn!(code = %failure.code, "{}", failure.to_error());
            metrics::counter!(
                "cropsense_axis_failures_total",
                "axis" => axis.as_str(),
                "code" => e.code()
            )
            .increment(1);
            failure
        })
    }

    /// Record count and latency for a public operation
    async fn instrumented<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = future.await;

        metrics::counter!("cropsense_evaluations_total", "operation" => operation).increment(1);
        metrics::histogram!("cropsense_evaluation_latency_us", "operation" => operation)
            .record(start.elapsed().as_micros() as f64);

        result
    }
}
