//! Model trait and common types

use cropsense_core::{Error, FeatureVector, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Trait for all crop classifiers.
///
/// Implementations are immutable after loading and must be safe to call from
/// many threads at once.
pub trait CropModel: Send + Sync {
    /// Class probabilities, indexed like the label set
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;

    /// Expected input width
    fn n_features(&self) -> usize;

    /// Number of output classes
    fn n_classes(&self) -> usize;

    /// Algorithm name, for logs
    fn algorithm(&self) -> &str;
}

/// Registered model identifiers, declared in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    Rf,
    Xgb,
    Svm,
    Mlp,
}

impl ModelId {
    /// All ids, highest priority first
    pub const PRIORITY: [ModelId; 4] = [ModelId::Rf, ModelId::Xgb, ModelId::Svm, ModelId::Mlp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rf => "rf",
            Self::Xgb => "xgb",
            Self::Svm => "svm",
            Self::Mlp => "mlp",
        }
    }

    /// Conventional artifact file name
    pub fn default_artifact(self) -> &'static str {
        match self {
            Self::Rf => "rf.json",
            Self::Xgb => "xgb.json",
            Self::Svm => "svm.json",
            Self::Mlp => "mlp.safetensors",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rf" => Ok(Self::Rf),
            "xgb" => Ok(Self::Xgb),
            "svm" => Ok(Self::Svm),
            "mlp" => Ok(Self::Mlp),
            other => Err(Error::config(format!("unknown model id '{}'", other))),
        }
    }
}

/// Ordered crop label set shared by every model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::model_unavailable("label set is empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::model_unavailable(format!(
                    "duplicate label '{}' in label set",
                    label
                )));
            }
        }
        Ok(Self { labels })
    }

    /// Load a JSON array of labels
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::new(serde_json::from_str(&content)?)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

/// Result of one classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted crop
    pub label: String,

    /// Probability of the predicted crop (0.0-1.0)
    pub probability: f64,

    /// All class probabilities, in label-set order
    pub probabilities: Vec<f64>,
}

/// A loaded model bound to its id and label set
#[derive(Clone)]
pub struct ModelHandle {
    id: ModelId,
    model: Arc<dyn CropModel>,
    labels: Arc<LabelSet>,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("id", &self.id)
            .field("algorithm", &self.model.algorithm())
            .field("n_classes", &self.model.n_classes())
            .finish()
    }
}

impl ModelHandle {
    pub fn new(id: ModelId, model: Arc<dyn CropModel>, labels: Arc<LabelSet>) -> Self {
        Self { id, model, labels }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn model(&self) -> &Arc<dyn CropModel> {
        &self.model
    }

    /// Classify a feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        if features.len() != self.model.n_features() {
            return Err(Error::classifier(format!(
                "{} expects {} features, got {}",
                self.id,
                self.model.n_features(),
                features.len()
            )));
        }

        let probabilities = self.model.predict_proba(features)?;
        metrics::counter!("cropsense_inferences_total", "model" => self.id.as_str()).increment(1);

        if probabilities.len() != self.labels.len() {
            return Err(Error::classifier(format!(
                "{} returned {} probabilities for {} labels",
                self.id,
                probabilities.len(),
                self.labels.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(Error::classifier(format!(
                "{} returned non-finite probabilities",
                self.id
            )));
        }

        let (index, probability) = argmax(&probabilities)
            .ok_or_else(|| Error::classifier(format!("{} returned no probabilities", self.id)))?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| Error::internal(format!("label index {} out of range", index)))?
            .to_string();

        Ok(Prediction {
            label,
            probability: probability.clamp(0.0, 1.0),
            probabilities,
        })
    }
}

/// Index and value of the first maximum
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Numerically stable softmax
pub fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Vec<f64>);

    impl CropModel for FixedModel {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }

        fn n_features(&self) -> usize {
            2
        }

        fn n_classes(&self) -> usize {
            self.0.len()
        }

        fn algorithm(&self) -> &str {
            "fixed"
        }
    }

    fn labels() -> Arc<LabelSet> {
        Arc::new(LabelSet::new(vec!["rice".into(), "maize".into(), "cotton".into()]).unwrap())
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some((1, 0.4)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_margins() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_handle_maps_label() {
        let handle = ModelHandle::new(ModelId::Rf, Arc::new(FixedModel(vec![0.1, 0.7, 0.2])), labels());
        let prediction = handle.predict(&FeatureVector::from_values(vec![0.0, 0.0])).unwrap();
        assert_eq!(prediction.label, "maize");
        assert_eq!(prediction.probability, 0.7);
    }

    #[test]
    fn test_handle_rejects_wrong_width() {
        let handle = ModelHandle::new(ModelId::Rf, Arc::new(FixedModel(vec![0.1, 0.7, 0.2])), labels());
        assert!(handle.predict(&FeatureVector::from_values(vec![0.0])).is_err());
    }

    #[test]
    fn test_handle_rejects_class_mismatch() {
        let handle = ModelHandle::new(ModelId::Svm, Arc::new(FixedModel(vec![0.5, 0.5])), labels());
        assert!(handle.predict(&FeatureVector::from_values(vec![0.0, 0.0])).is_err());
    }

    #[test]
    fn test_model_id_priority_order() {
        assert!(ModelId::Rf < ModelId::Xgb);
        assert!(ModelId::Xgb < ModelId::Svm);
        assert!(ModelId::Svm < ModelId::Mlp);
        assert_eq!("XGB".parse::<ModelId>().unwrap(), ModelId::Xgb);
    }

    #[test]
    fn test_label_set_rejects_duplicates() {
        assert!(LabelSet::new(vec!["rice".into(), "rice".into()]).is_err());
        assert!(LabelSet::new(vec![]).is_err());
    }
}
