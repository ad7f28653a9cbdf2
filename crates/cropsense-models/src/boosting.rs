//! Gradient-boosted trees (XGBoost-style multiclass)
//!
//! Each tree contributes a margin to one class; class margins start at
//! `base_score` and are turned into probabilities with a softmax.

use crate::classifier::{softmax, CropModel};
use crate::tree::Tree;
use cropsense_core::{Error, FeatureVector, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A regression tree bound to the class whose margin it adjusts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTree {
    pub class: usize,
    #[serde(flatten)]
    pub tree: Tree<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_features: usize,
    pub n_classes: usize,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<ClassTree>,
}

fn default_base_score() -> f64 {
    0.5
}

impl GradientBoosting {
    pub fn new(
        n_features: usize,
        n_classes: usize,
        base_score: f64,
        trees: Vec<ClassTree>,
    ) -> Result<Self> {
        let model = Self {
            n_features,
            n_classes,
            base_score,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::model_unavailable("boosted model has no trees"));
        }
        if !self.base_score.is_finite() {
            return Err(Error::model_unavailable("base_score must be finite"));
        }
        for class_tree in &self.trees {
            if class_tree.class >= self.n_classes {
                return Err(Error::model_unavailable(format!(
                    "tree targets class {} but model has {} classes",
                    class_tree.class, self.n_classes
                )));
            }
            class_tree.tree.validate(self.n_features, |v| v.is_finite())?;
        }
        Ok(())
    }

    /// Raw per-class margins
    pub fn margins(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let x = features.as_slice();
        let mut margins = vec![self.base_score; self.n_classes];
        for class_tree in &self.trees {
            margins[class_tree.class] += *class_tree.tree.leaf(x)?;
        }
        Ok(margins)
    }
}

impl CropModel for GradientBoosting {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        Ok(softmax(&self.margins(features)?))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn algorithm(&self) -> &str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "n_features": 1,
        "n_classes": 2,
        "trees": [
            {"class": 0, "nodes": [
                {"feature": 0, "threshold": 0.0, "left": 1, "right": 2},
                {"value": 1.0},
                {"value": -1.0}
            ]},
            {"class": 1, "nodes": [{"value": 0.25}]}
        ]
    }"#;

    #[test]
    fn test_margins_accumulate_per_class() {
        let model: GradientBoosting = serde_json::from_str(MODEL).unwrap();
        model.validate().unwrap();

        let margins = model.margins(&FeatureVector::from_values(vec![-1.0])).unwrap();
        assert_eq!(margins, vec![1.5, 0.75]);

        let proba = model.predict_proba(&FeatureVector::from_values(vec![1.0])).unwrap();
        assert!(proba[1] > proba[0]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_out_of_range_class() {
        let mut model: GradientBoosting = serde_json::from_str(MODEL).unwrap();
        model.trees[1].class = 2;
        assert!(model.validate().is_err());
    }
}
