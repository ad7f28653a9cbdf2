//! Mock models for testing
//!
//! Configurable `CropModel` implementations for exercising the evaluation
//! axes without trained artifacts. Every mock reads the unscaled layout
//! produced by `FeatureVectorBuilder::unscaled()`.

#![allow(dead_code)]

use cropsense_core::{
    Error, FeatureVector, FeatureVectorBuilder, InputRecord, Result, Season, SoilType,
    FEATURE_COUNT,
};
use cropsense_eval::EvaluationConfig;
use cropsense_models::{CropModel, LabelSet, ModelId, ModelRegistry, SharedRegistry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const LABELS: [&str; 3] = ["maize", "rice", "cotton"];

fn label_index(label: &str) -> usize {
    LABELS
        .iter()
        .position(|l| *l == label)
        .unwrap_or_else(|| panic!("unknown mock label {}", label))
}

/// Always predicts the same label
pub struct FixedModel {
    label: usize,
    probability: f64,
    call_count: AtomicU32,
}

impl FixedModel {
    pub fn new(label: &str) -> Self {
        Self {
            label: label_index(label),
            probability: 0.9,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the top-class probability
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl CropModel for FixedModel {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let rest = (1.0 - self.probability) / (LABELS.len() - 1) as f64;
        let mut proba = vec![rest; LABELS.len()];
        proba[self.label] = self.probability;
        Ok(proba)
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn n_classes(&self) -> usize {
        LABELS.len()
    }

    fn algorithm(&self) -> &str {
        "fixed"
    }
}

/// Predicts rice when nitrogen exceeds a threshold, maize otherwise.
///
/// Confidence grows with the distance from the threshold.
pub struct NitrogenRuleModel {
    threshold: f64,
}

impl NitrogenRuleModel {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl CropModel for NitrogenRuleModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let n = features.as_slice()[0];
        let rice = 1.0 / (1.0 + (-(n - self.threshold) / 10.0).exp());
        Ok(vec![(1.0 - rice) * 0.9, rice * 0.9, 0.1])
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn n_classes(&self) -> usize {
        LABELS.len()
    }

    fn algorithm(&self) -> &str {
        "nitrogen_rule"
    }
}

/// Fails every inference
pub struct FailingModel;

impl CropModel for FailingModel {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
        Err(Error::classifier("mock inference failure"))
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn n_classes(&self) -> usize {
        LABELS.len()
    }

    fn algorithm(&self) -> &str {
        "failing"
    }
}

/// Delegates to another model after blocking for a while
pub struct SlowModel {
    inner: Arc<dyn CropModel>,
    delay: Duration,
}

impl SlowModel {
    pub fn new(inner: Arc<dyn CropModel>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl CropModel for SlowModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        std::thread::sleep(self.delay);
        self.inner.predict_proba(features)
    }

    fn n_features(&self) -> usize {
        self.inner.n_features()
    }

    fn n_classes(&self) -> usize {
        self.inner.n_classes()
    }

    fn algorithm(&self) -> &str {
        "slow"
    }
}

pub fn fixed(label: &str) -> Arc<dyn CropModel> {
    Arc::new(FixedModel::new(label))
}

pub fn rule(threshold: f64) -> Arc<dyn CropModel> {
    Arc::new(NitrogenRuleModel::new(threshold))
}

/// Registry over the mock label set with an unscaled encoder
pub fn registry(models: Vec<(ModelId, Arc<dyn CropModel>)>) -> SharedRegistry {
    let labels = LabelSet::new(LABELS.iter().map(|l| l.to_string()).collect()).unwrap();
    ModelRegistry::from_models(FeatureVectorBuilder::unscaled(), labels, models)
        .unwrap()
        .into_shared()
}

/// All four model ids backed by the nitrogen rule
pub fn rule_registry() -> SharedRegistry {
    registry(
        ModelId::PRIORITY
            .iter()
            .map(|id| (*id, rule(80.0)))
            .collect(),
    )
}

/// N=90, P=42, K=43, Black soil, Kharif, 28C / 70% / 120mm
pub fn scenario_record() -> InputRecord {
    InputRecord {
        soil_type: SoilType::Black,
        season: Season::Kharif,
        n: 90.0,
        p: 42.0,
        k: 43.0,
        location: "Nagpur".to_string(),
        temperature: 28.0,
        humidity: 70.0,
        rainfall: 120.0,
        ph: 6.5,
    }
}

pub fn seeded_config(seed: u64) -> EvaluationConfig {
    let mut config = EvaluationConfig::default();
    config.noise.seed = Some(seed);
    config
}
