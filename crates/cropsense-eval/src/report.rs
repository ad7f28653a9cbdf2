//! Report types returned to callers
//!
//! Field names follow the external JSON contract.

use cropsense_core::Error;
use cropsense_models::ModelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label -> occurrence count
pub type Distribution = BTreeMap<String, usize>;

/// Result of the noise injection axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseReport {
    pub predicted_crop: String,

    /// Label of the unperturbed input
    pub baseline_crop: String,

    /// Recommendation Stability Score
    pub rss: f64,

    /// Runs whose label matched the baseline
    pub matches: usize,

    pub prediction_changes: usize,
    pub total_runs: usize,

    /// Mean absolute perturbation actually applied, in percent
    pub noise_percentage: f64,

    pub prediction_distribution: Distribution,
}

/// Noise report for one fixed level of a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseLevelReport {
    pub level: f64,

    #[serde(flatten)]
    pub report: NoiseReport,
}

/// Outcome of a single ablation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureResult {
    pub crop: String,
    pub confidence: f64,
    pub changed: bool,

    /// Baseline minus ablated confidence; negative when ablation raised it
    pub confidence_drop: f64,
}

/// Result of the missing-feature axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingFeatureReport {
    pub predicted_crop: String,
    pub baseline_confidence: f64,
    pub stability_score: f64,
    pub total_tests: usize,
    pub prediction_changes: usize,
    pub feature_results: BTreeMap<String, FeatureResult>,
}

/// Result of the model agreement axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementReport {
    pub predicted_crop: String,
    pub total_models: usize,

    /// Models backing `predicted_crop`
    pub agreement_count: usize,

    pub agreement_ratio: f64,
    pub all_agree: bool,
    pub predictions: BTreeMap<ModelId, String>,
    pub prediction_distribution: Distribution,
}

/// Discrete confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceScore {
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
}

/// Evaluation axes of a full report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Noise,
    MissingFeature,
    ModelAgreement,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Noise => "noise",
            Self::MissingFeature => "missing_feature",
            Self::ModelAgreement => "model_agreement",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic for an axis that did not complete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisFailure {
    pub axis: Axis,
    pub code: String,
    pub message: String,
}

impl AxisFailure {
    pub fn new(axis: Axis, error: &Error) -> Self {
        Self {
            axis,
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }

    /// The failure as a partial-evaluation error
    pub fn to_error(&self) -> Error {
        Error::partial(self.axis.as_str(), format!("{} ({})", self.message, self.code))
    }
}

/// Composite report of a full evaluation. Axes that failed are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub predicted_crop: String,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,

    // Confidence components
    pub probability: f64,
    pub stability: Option<f64>,
    pub agreement: Option<f64>,

    // Robustness metrics
    pub rss_score: Option<f64>,
    pub missing_feature_stability: Option<f64>,
    pub model_agreement_ratio: Option<f64>,

    // Detailed results
    pub noise_test: Option<NoiseReport>,
    pub missing_feature_test: Option<MissingFeatureReport>,
    pub model_agreement_test: Option<AgreementReport>,

    pub failures: Vec<AxisFailure>,
}

impl EvaluationReport {
    /// Whether every axis completed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::Medium).unwrap(),
            "\"medium\""
        );
    }

    #[test]
    fn test_axis_failure_carries_error_code() {
        let failure = AxisFailure::new(Axis::ModelAgreement, &Error::Timeout);
        assert_eq!(failure.code, "timeout");

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["axis"], "model_agreement");
        assert!(matches!(
            failure.to_error(),
            Error::PartialEvaluation { axis, .. } if axis == "model_agreement"
        ));
    }

    #[test]
    fn test_predictions_keyed_by_model_id() {
        let mut predictions = BTreeMap::new();
        predictions.insert(ModelId::Svm, "rice".to_string());
        predictions.insert(ModelId::Rf, "maize".to_string());

        let report = AgreementReport {
            predicted_crop: "maize".to_string(),
            total_models: 2,
            agreement_count: 1,
            agreement_ratio: 0.5,
            all_agree: false,
            predictions,
            prediction_distribution: Distribution::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["predictions"]["rf"], "maize");
        assert_eq!(json["predictions"]["svm"], "rice");
    }
}
