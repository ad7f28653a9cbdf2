//! Random forest classifier
//!
//! Leaves hold per-class sample counts (or proportions); the forest
//! probability is the mean of each tree's normalised leaf distribution.

use crate::classifier::CropModel;
use crate::tree::Tree;
use cropsense_core::{Error, FeatureVector, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<Tree<Vec<f64>>>,
}

impl RandomForest {
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<Tree<Vec<f64>>>) -> Result<Self> {
        let forest = Self {
            n_features,
            n_classes,
            trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let forest: Self = serde_json::from_str(&content)?;
        forest.validate()?;
        Ok(forest)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::model_unavailable("random forest has no trees"));
        }
        for tree in &self.trees {
            tree.validate(self.n_features, |leaf| {
                leaf.len() == self.n_classes && leaf.iter().all(|v| v.is_finite() && *v >= 0.0)
            })?;
        }
        Ok(())
    }
}

impl CropModel for RandomForest {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let x = features.as_slice();
        let mut proba = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf(x)?;
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            } else {
                let uniform = 1.0 / self.n_classes as f64;
                proba.iter_mut().for_each(|p| *p += uniform);
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn algorithm(&self) -> &str {
        "random_forest"
    }
}
