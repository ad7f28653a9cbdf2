//! Binary decision trees shared by the forest and boosting models

use cropsense_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A tree node. Splits send `x[feature] <= threshold` to `left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: L,
    },
}

/// Flat, index-linked tree with the root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree<L> {
    pub nodes: Vec<Node<L>>,
}

impl<L> Tree<L> {
    /// Walk to the leaf for an input
    pub fn leaf(&self, x: &[f64]) -> Result<&L> {
        let mut index = 0;
        // a well-formed tree reaches a leaf within `nodes.len()` steps
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return Ok(value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        Error::classifier(format!("split on missing feature {}", feature))
                    })?;
                    index = if v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(Error::classifier(format!("dangling node index {}", index)));
                }
            }
        }
        Err(Error::classifier("tree traversal did not terminate"))
    }

    /// Structural checks run once at load time
    pub fn validate(&self, n_features: usize, check_leaf: impl Fn(&L) -> bool) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::model_unavailable("tree has no nodes"));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features
                        || *left >= self.nodes.len()
                        || *right >= self.nodes.len()
                        || *left <= i
                        || *right <= i
                        || !threshold.is_finite()
                    {
                        return Err(Error::model_unavailable(format!(
                            "malformed split at node {}",
                            i
                        )));
                    }
                }
                Node::Leaf { value } => {
                    if !check_leaf(value) {
                        return Err(Error::model_unavailable(format!(
                            "malformed leaf at node {}",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
