//! Missing-feature simulation
//!
//! Replaces one input at a time with its soil-type default (or the soil type
//! with a wrong one) and measures how the base model's answer moves.

use crate::report::{FeatureResult, MissingFeatureReport};
use cropsense_core::{Feature, InputRecord, Result};
use cropsense_models::{ModelId, ModelRegistry};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One way of degrading an input record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ablation {
    /// A single numeric field falls back to the soil default
    Feature(Feature),

    /// N, P and K all fall back to the soil defaults
    Nutrients,

    /// Soil type replaced by a different one
    WrongSoilType,
}

impl Ablation {
    /// Fixed candidate set, in report order
    pub const CANDIDATES: [Ablation; 8] = [
        Ablation::Feature(Feature::Nitrogen),
        Ablation::Feature(Feature::Phosphorus),
        Ablation::Feature(Feature::Potassium),
        Ablation::Nutrients,
        Ablation::Feature(Feature::Temperature),
        Ablation::Feature(Feature::Humidity),
        Ablation::Feature(Feature::Rainfall),
        Ablation::WrongSoilType,
    ];

    /// Key in `feature_results`
    pub fn key(&self) -> String {
        match self {
            Self::Feature(feature) => format!("missing_{}", feature.name()),
            Self::Nutrients => "missing_npk".to_string(),
            Self::WrongSoilType => "wrong_soil_type".to_string(),
        }
    }

    /// Degraded copy of `record`; the original is left untouched
    pub fn apply(&self, record: &InputRecord) -> InputRecord {
        let defaults = record.soil_type.defaults();
        match self {
            Self::Feature(feature) => record.with(*feature, defaults.get(*feature)),
            Self::Nutrients => Feature::NUTRIENTS
                .iter()
                .fold(record.clone(), |next, f| next.with(*f, defaults.get(*f))),
            Self::WrongSoilType => record.with_soil_type(record.soil_type.alternative()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MissingFeatureSimulator;

impl MissingFeatureSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Classify the baseline and every ablation with `model`
    pub fn evaluate(
        &self,
        registry: &ModelRegistry,
        record: &InputRecord,
        model: ModelId,
    ) -> Result<MissingFeatureReport> {
        let handle = registry.get(model)?;
        let builder = registry.feature_builder();

        let baseline = handle.predict(&builder.build(record)?)?;
        debug!(
            "Missing-feature baseline: {} ({:.4})",
            baseline.label, baseline.probability
        );

        let mut feature_results = BTreeMap::new();
        let mut unchanged = 0;

        for ablation in Ablation::CANDIDATES {
            let prediction = handle.predict(&builder.build(&ablation.apply(record))?)?;
            let changed = prediction.label != baseline.label;
            if !changed {
                unchanged += 1;
            }
            feature_results.insert(
                ablation.key(),
                FeatureResult {
                    confidence_drop: baseline.probability - prediction.probability,
                    confidence: prediction.probability,
                    crop: prediction.label,
                    changed,
                },
            );
        }

        let total_tests = Ablation::CANDIDATES.len();
        let stability_score = unchanged as f64 / total_tests as f64;

        info!(
            model = %model,
            stability_score,
            "Missing-feature evaluation complete: {}/{} unchanged",
            unchanged,
            total_tests
        );

        Ok(MissingFeatureReport {
            predicted_crop: baseline.label,
            baseline_confidence: baseline.probability,
            stability_score,
            total_tests,
            prediction_changes: total_tests - unchanged,
            feature_results,
        })
    }
}
