//! Multi-output random-forest regressor loaded from a JSON artifact

use super::tree::Tree;
use super::{ModelError, Regressor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Artifact format version understood by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Random forest with one output vector per leaf.
///
/// Prediction is the arithmetic mean of the leaf vectors reached in each tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    /// Artifact format version
    pub version: u32,

    /// Feature row length expected by every tree
    pub n_features: usize,

    /// Output row length produced by every leaf
    pub n_outputs: usize,

    /// Training-time feature column names, if exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    /// Training-time output column names, if exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_names: Option<Vec<String>>,

    /// Trees in the ensemble
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn new(n_features: usize, n_outputs: usize, trees: Vec<Tree>) -> Self {
        Self {
            version: FORMAT_VERSION,
            n_features,
            n_outputs,
            feature_names: None,
            output_names: None,
            trees,
        }
    }

    /// Attach training-time column names
    pub fn with_names(mut self, features: Vec<String>, outputs: Vec<String>) -> Self {
        self.feature_names = Some(features);
        self.output_names = Some(outputs);
        self
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != FORMAT_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.n_features == 0 {
            return Err(ModelError::ValidationFailed("Model has no features".into()));
        }

        if self.n_outputs == 0 {
            return Err(ModelError::ValidationFailed("Model has no outputs".into()));
        }

        if self.trees.is_empty() {
            return Err(ModelError::ValidationFailed("Model has no trees".into()));
        }

        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(ModelError::ValidationFailed(format!(
                    "{} feature names for {} features",
                    names.len(),
                    self.n_features
                )));
            }
        }

        if let Some(names) = &self.output_names {
            if names.len() != self.n_outputs {
                return Err(ModelError::ValidationFailed(format!(
                    "{} output names for {} outputs",
                    names.len(),
                    self.n_outputs
                )));
            }
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_outputs).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Parse and validate an artifact from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let model: ForestModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate an artifact from disk
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let model = Self::from_json_str(&json)?;
        let hash = model.hash_hex()?;
        info!(
            path = %path.display(),
            trees = model.num_trees(),
            n_features = model.n_features,
            n_outputs = model.n_outputs,
            hash = %hash,
            "loaded forest model"
        );
        Ok(model)
    }

    /// Write the artifact as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// BLAKE3 hash of the model's canonical compact JSON form.
    ///
    /// The model is re-serialized before hashing, so the result does not
    /// depend on the whitespace or key layout of the file it was loaded
    /// from, and it is not the same as hashing the file bytes (`b3sum`).
    pub fn hash(&self) -> Result<[u8; 32], ModelError> {
        let json = serde_json::to_vec(self)?;
        Ok(*blake3::hash(&json).as_bytes())
    }

    /// [`hash`](Self::hash) as lowercase hex
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hex::encode(self.hash()?))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut sum = vec![0.0; self.n_outputs];
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree.evaluate(features).ok_or_else(|| {
                ModelError::ValidationFailed(format!("Tree {} did not reach a leaf", i))
            })?;
            if leaf.len() != self.n_outputs {
                return Err(ModelError::OutputCountMismatch {
                    expected: self.n_outputs,
                    actual: leaf.len(),
                });
            }
            for (acc, v) in sum.iter_mut().zip(leaf) {
                *acc += v;
            }
        }

        let n = self.trees.len() as f64;
        Ok(sum.into_iter().map(|v| v / n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use tempfile::tempdir;

    fn create_test_model() -> ForestModel {
        let tree1 = Tree::new(vec![
            Node::split(0, 5.0, 1, 2),
            Node::leaf(vec![1.0, 0.0]),
            Node::leaf(vec![3.0, 2.0]),
        ]);
        let tree2 = Tree::new(vec![
            Node::split(1, 0.5, 1, 2),
            Node::leaf(vec![2.0, 1.0]),
            Node::leaf(vec![4.0, 4.0]),
        ]);
        ForestModel::new(2, 2, vec![tree1, tree2])
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = create_test_model();
        model.validate().unwrap();

        // tree1 left [1,0], tree2 left [2,1]
        assert_eq!(model.predict(&[2.0, 0.0]).unwrap(), vec![1.5, 0.5]);
        // tree1 right [3,2], tree2 right [4,4]
        assert_eq!(model.predict(&[9.0, 1.0]).unwrap(), vec![3.5, 3.0]);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let model = create_test_model();
        let err = model.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_predict_rejects_narrow_leaf_without_validation() {
        let model = ForestModel::new(2, 4, vec![Tree::new(vec![Node::leaf(vec![5.0; 3])])]);
        let err = model.predict(&[0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::OutputCountMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_invalid_model_empty_trees() {
        let model = ForestModel::new(2, 2, vec![]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_invalid_model_version() {
        let mut model = create_test_model();
        model.version = 7;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_invalid_name_count() {
        let model = create_test_model().with_names(vec!["a".into()], vec!["x".into(), "y".into()]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_model_hash_stability() {
        let hash1 = create_test_model().hash_hex().unwrap();
        let hash2 = create_test_model().hash_hex().unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);

        let mut changed = create_test_model();
        changed.trees[0].nodes[0].threshold = 6.0;
        assert_ne!(hash1, changed.hash_hex().unwrap());
    }

    #[test]
    fn test_hash_ignores_file_formatting() {
        let dir = tempdir().unwrap();
        let compact = dir.path().join("compact.json");
        let pretty = dir.path().join("pretty.json");

        let model = create_test_model();
        model.save_json(&compact).unwrap();
        let pretty_json = serde_json::to_string_pretty(&model).unwrap();
        fs::write(&pretty, &pretty_json).unwrap();

        let from_compact = ForestModel::load_json(&compact).unwrap().hash_hex().unwrap();
        let from_pretty = ForestModel::load_json(&pretty).unwrap().hash_hex().unwrap();
        assert_eq!(from_compact, from_pretty);

        let file_hash = blake3::hash(pretty_json.as_bytes()).to_hex().to_string();
        assert_ne!(from_pretty, file_hash);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");

        let original = create_test_model();
        original.save_json(&path).unwrap();
        let restored = ForestModel::load_json(&path).unwrap();

        assert_eq!(original, restored);
        assert_eq!(original.hash_hex().unwrap(), restored.hash_hex().unwrap());
    }

    #[test]
    fn test_from_json_str_validates() {
        let json = r#"{"version":1,"n_features":1,"n_outputs":1,
            "trees":[{"nodes":[{"feature":3,"threshold":1.0,"left":1,"right":2,"value":null}]}]}"#;
        assert!(matches!(
            ForestModel::from_json_str(json),
            Err(ModelError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ForestModel::load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelError::IoError(_)));
    }
}
