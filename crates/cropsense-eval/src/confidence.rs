//! Confidence aggregation
//!
//! `confidence = probability * w_p + agreement * w_a + stability * w_s`,
//! clipped to [0, 1] and bucketed by configurable thresholds.

use crate::config::{ConfidenceConfig, ConfidenceThresholds, ConfidenceWeights};
use crate::report::{ConfidenceLevel, ConfidenceScore};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceAggregator {
    weights: ConfidenceWeights,
    thresholds: ConfidenceThresholds,
}

impl ConfidenceAggregator {
    pub fn new(config: &ConfidenceConfig) -> Self {
        Self {
            weights: config.weights,
            thresholds: config.thresholds,
        }
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    /// Blend all three components
    pub fn aggregate(&self, probability: f64, agreement: f64, stability: f64) -> ConfidenceScore {
        self.aggregate_partial(Some(probability), Some(agreement), Some(stability))
    }

    /// Blend whichever components are present.
    ///
    /// Weights of the present components are renormalised to sum to 1. With
    /// no components at all the confidence is 0.
    pub fn aggregate_partial(
        &self,
        probability: Option<f64>,
        agreement: Option<f64>,
        stability: Option<f64>,
    ) -> ConfidenceScore {
        let components = [
            (probability, self.weights.probability),
            (agreement, self.weights.agreement),
            (stability, self.weights.stability),
        ];

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (value, weight) in components {
            if let Some(value) = value {
                weighted_sum += value * weight;
                total_weight += weight;
            }
        }

        let confidence = if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        ConfidenceScore {
            confidence,
            confidence_level: self.level(confidence),
        }
    }

    /// Bucket a confidence value
    pub fn level(&self, confidence: f64) -> ConfidenceLevel {
        if confidence >= self.thresholds.high {
            ConfidenceLevel::High
        } else if confidence >= self.thresholds.medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let aggregator = ConfidenceAggregator::default();

        let top = aggregator.aggregate(1.0, 1.0, 1.0);
        assert_eq!(top.confidence, 1.0);
        assert_eq!(top.confidence_level, ConfidenceLevel::High);

        let bottom = aggregator.aggregate(0.0, 0.0, 0.0);
        assert_eq!(bottom.confidence, 0.0);
        assert_eq!(bottom.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_default_weights() {
        let aggregator = ConfidenceAggregator::default();
        let score = aggregator.aggregate(0.8, 0.5, 1.0);
        assert!((score.confidence - 0.775).abs() < 1e-12);
        assert_eq!(score.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_level_boundaries() {
        let aggregator = ConfidenceAggregator::default();
        assert_eq!(aggregator.level(0.4999), ConfidenceLevel::Low);
        assert_eq!(aggregator.level(0.5), ConfidenceLevel::Medium);
        assert_eq!(aggregator.level(0.7999), ConfidenceLevel::Medium);
        assert_eq!(aggregator.level(0.8), ConfidenceLevel::High);
    }

    #[test]
    fn test_configured_thresholds() {
        let mut config = ConfidenceConfig::default();
        config.thresholds.high = 0.95;
        let aggregator = ConfidenceAggregator::new(&config);
        assert_eq!(aggregator.level(0.9), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_missing_component_renormalises() {
        let aggregator = ConfidenceAggregator::default();

        // probability 0.5 weight, stability 0.25 weight -> (0.5*0.6 + 0.25*0.9) / 0.75
        let score = aggregator.aggregate_partial(Some(0.6), None, Some(0.9));
        assert!((score.confidence - 0.7).abs() < 1e-12);

        let score = aggregator.aggregate_partial(None, None, None);
        assert_eq!(score.confidence, 0.0);
        assert_eq!(score.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_clips_out_of_range_inputs() {
        let aggregator = ConfidenceAggregator::default();
        let score = aggregator.aggregate(1.0 + 1e-9, 1.0, 1.0);
        assert_eq!(score.confidence, 1.0);
    }
}
