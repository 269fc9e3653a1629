//! Regression tree structures for forest inference
//!
//! Nodes are stored flat with node 0 as the root. Leaves carry one value
//! per model output.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature >= 0`: index into the feature row
/// - `left` and `right` point to child node indices
/// - `value` is `None`
///
/// For leaf nodes:
/// - `feature == -1`
/// - `value` holds the output vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to split on (-1 for leaf nodes)
    pub feature: i32,

    /// Split threshold
    #[serde(default)]
    pub threshold: f64,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Output vector for leaf nodes
    #[serde(default)]
    pub value: Option<Vec<f64>>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn split(feature: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            feature,
            threshold,
            left,
            right,
            value: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: Vec<f64>) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value: Some(value),
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf and return its output vector.
    ///
    /// Returns `None` on a malformed path; validated trees always reach a leaf.
    pub fn evaluate(&self, features: &[f64]) -> Option<&[f64]> {
        let mut idx = 0usize;

        // A valid path visits each node at most once.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx)?;

            if let Some(value) = &node.value {
                return Some(value.as_slice());
            }

            let feature_value = *features.get(usize::try_from(node.feature).ok()?)?;
            let next = if feature_value <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = usize::try_from(next).ok()?;
        }

        None
    }

    /// Validate tree structure against the model dimensions
    pub fn validate(&self, n_features: usize, n_outputs: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match &node.value {
                Some(value) => {
                    if value.len() != n_outputs {
                        return Err(format!(
                            "Leaf node {} has {} values, expected {}",
                            i,
                            value.len(),
                            n_outputs
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite()) {
                        return Err(format!("Leaf node {} has a non-finite value", i));
                    }
                }
                None => {
                    if node.feature < 0 || node.feature as usize >= n_features {
                        return Err(format!(
                            "Node {} has invalid feature index {}",
                            i, node.feature
                        ));
                    }
                    if !node.threshold.is_finite() {
                        return Err(format!("Node {} has a non-finite threshold", i));
                    }
                    for (side, child) in [("left", node.left), ("right", node.right)] {
                        // children must point forward so traversal always terminates
                        if child <= i as i32 || child as usize >= self.nodes.len() {
                            return Err(format!(
                                "Node {} has invalid {} child {}",
                                i, side, child
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
