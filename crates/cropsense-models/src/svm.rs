//! One-vs-rest kernel SVM
//!
//! Decision value for class `c`:
//! `f_c(x) = sum_i dual_coef[c][i] * K(sv_i, x) + intercept[c]`.
//! Probabilities are the softmax of the decision values.

use crate::classifier::{softmax, CropModel};
use cropsense_core::{Error, FeatureVector, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
}

impl Kernel {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Linear => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Self::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * dist).exp()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportVectorMachine {
    pub n_features: usize,
    pub n_classes: usize,
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl SupportVectorMachine {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.support_vectors.is_empty() {
            return Err(Error::model_unavailable("svm has no support vectors"));
        }
        if let Kernel::Rbf { gamma } = self.kernel {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(Error::model_unavailable("rbf gamma must be positive"));
            }
        }
        if self.support_vectors.iter().any(|sv| sv.len() != self.n_features) {
            return Err(Error::model_unavailable(format!(
                "support vectors must have {} features",
                self.n_features
            )));
        }
        if self.dual_coef.len() != self.n_classes || self.intercept.len() != self.n_classes {
            return Err(Error::model_unavailable(format!(
                "svm needs one coefficient row and intercept per class ({})",
                self.n_classes
            )));
        }
        if self
            .dual_coef
            .iter()
            .any(|row| row.len() != self.support_vectors.len())
        {
            return Err(Error::model_unavailable(
                "dual coefficient rows must match the support vector count",
            ));
        }
        Ok(())
    }

    /// Per-class decision values
    pub fn decision_function(&self, features: &FeatureVector) -> Vec<f64> {
        let x = features.as_slice();
        let kernel_values: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| self.kernel.eval(sv, x))
            .collect();

        self.dual_coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(&kernel_values).map(|(a, k)| a * k).sum::<f64>() + b)
            .collect()
    }
}

impl CropModel for SupportVectorMachine {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        Ok(softmax(&self.decision_function(features)))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn algorithm(&self) -> &str {
        "svm"
    }
}
