//! Evaluation configuration

use cropsense_core::{Error, Result};
use cropsense_models::ModelId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Model used for the baseline, noise and missing-feature axes
    #[serde(default = "default_base_model")]
    pub base_model: ModelId,

    /// Per-axis wall-clock budget for full evaluations
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub noise: NoiseConfig,

    #[serde(default)]
    pub confidence: ConfidenceConfig,
}

/// Noise injection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Perturbed classifications per evaluation
    #[serde(default = "default_runs")]
    pub runs: usize,

    /// Smallest relative perturbation
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,

    /// Largest relative perturbation
    #[serde(default = "default_max_magnitude")]
    pub max_magnitude: f64,

    /// Upper bound on concurrent inference workers
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fixed noise levels for level sweeps
    #[serde(default = "default_levels")]
    pub levels: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default)]
    pub weights: ConfidenceWeights,

    #[serde(default)]
    pub thresholds: ConfidenceThresholds,
}

/// Blend weights; must sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    #[serde(default = "default_probability_weight")]
    pub probability: f64,

    #[serde(default = "default_component_weight")]
    pub agreement: f64,

    #[serde(default = "default_component_weight")]
    pub stability: f64,
}

/// Lower bounds of the `medium` and `high` confidence levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,

    #[serde(default = "default_high_threshold")]
    pub high: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            base_model: default_base_model(),
            timeout_ms: default_timeout_ms(),
            noise: NoiseConfig::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            min_magnitude: default_min_magnitude(),
            max_magnitude: default_max_magnitude(),
            max_concurrency: default_max_concurrency(),
            seed: None,
            levels: default_levels(),
        }
    }
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            probability: default_probability_weight(),
            agreement: default_component_weight(),
            stability: default_component_weight(),
        }
    }
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium_threshold(),
            high: default_high_threshold(),
        }
    }
}

impl EvaluationConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse evaluation config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::config("timeout_ms must be greater than 0"));
        }
        self.noise.validate()?;
        self.confidence.validate()
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(Error::invalid_parameter("noise runs must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("noise max_concurrency must be at least 1"));
        }
        check_magnitude_range(self.min_magnitude, self.max_magnitude)?;
        for level in &self.levels {
            check_magnitude_range(0.0, *level)?;
        }
        Ok(())
    }
}

/// Relative magnitudes live in [0, 1] with `min <= max`
pub(crate) fn check_magnitude_range(min: f64, max: f64) -> Result<()> {
    let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    if !in_unit(min) || !in_unit(max) || min > max {
        return Err(Error::invalid_parameter(format!(
            "noise magnitude range [{}, {}] must lie within [0, 1]",
            min, max
        )));
    }
    Ok(())
}

impl ConfidenceConfig {
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let weights = [w.probability, w.agreement, w.stability];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::config("confidence weights must be non-negative"));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(Error::config(format!(
                "confidence weights must sum to 1.0, got {}",
                sum
            )));
        }

        let t = &self.thresholds;
        if !(0.0 <= t.medium && t.medium <= t.high && t.high <= 1.0) {
            return Err(Error::config(format!(
                "confidence thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 1",
                t.medium, t.high
            )));
        }
        Ok(())
    }
}

fn default_base_model() -> ModelId {
    ModelId::Rf
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_runs() -> usize {
    50
}

fn default_min_magnitude() -> f64 {
    0.10
}

fn default_max_magnitude() -> f64 {
    0.40
}

fn default_max_concurrency() -> usize {
    8
}

fn default_levels() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.4]
}

fn default_probability_weight() -> f64 {
    0.5
}

fn default_component_weight() -> f64 {
    0.25
}

fn default_medium_threshold() -> f64 {
    0.5
}

fn default_high_threshold() -> f64 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvaluationConfig::default();
        assert_eq!(config.base_model, ModelId::Rf);
        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.noise.runs, 50);
        assert_eq!(config.noise.max_concurrency, 8);
        assert_eq!(config.confidence.weights.probability, 0.5);
        assert_eq!(config.confidence.thresholds.high, 0.8);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
base_model: xgb
noise:
  runs: 20
  seed: 7
confidence:
  thresholds:
    medium: 0.6
"#;
        let config = EvaluationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.base_model, ModelId::Xgb);
        assert_eq!(config.noise.runs, 20);
        assert_eq!(config.noise.seed, Some(7));
        assert_eq!(config.noise.max_magnitude, 0.40);
        assert_eq!(config.confidence.thresholds.medium, 0.6);
        assert_eq!(config.confidence.thresholds.high, 0.8);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let yaml = r#"
confidence:
  weights:
    probability: 0.6
"#;
        assert!(matches!(
            EvaluationConfig::from_yaml(yaml),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = EvaluationConfig::default();
        config.confidence.thresholds = ConfidenceThresholds {
            medium: 0.9,
            high: 0.7,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_noise_settings() {
        let mut config = EvaluationConfig::default();
        config.noise.runs = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));

        let mut config = EvaluationConfig::default();
        config.noise.min_magnitude = 0.5;
        config.noise.max_magnitude = 0.2;
        assert!(config.validate().is_err());

        let mut config = EvaluationConfig::default();
        config.noise.levels = vec![0.1, 1.5];
        assert!(config.validate().is_err());
    }
}
