//! Regression model interface and the random-forest artifact
//!
//! The predictor only sees the [`Regressor`] trait: a fixed-length feature
//! row goes in, a fixed-length output row comes out. [`ForestModel`] is the
//! shipped implementation, a multi-output random forest exported as JSON.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "version": 1,
//!   "n_features": 14,
//!   "n_outputs": 16,
//!   "feature_names": ["Total No. Of Quantity", "..."],
//!   "output_names": ["10x10x10", "..."],
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"feature": 0, "threshold": 2.5, "left": 1, "right": 2, "value": null},
//!         {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": [0.0, "..."]},
//!         {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": [1.0, "..."]}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Splits go left when `x[feature] <= threshold`. The forest output is the
//! mean of the reached leaf vectors.

pub mod forest;
pub mod tree;

pub use forest::{ForestModel, FORMAT_VERSION};
pub use tree::{Node, Tree};

use crate::schema::Schema;
use thiserror::Error;

/// Model loading and inference errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("Model is incompatible with the feature schema: {0}")]
    Incompatible(String),

    #[error("Model expects {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Model returned {actual} outputs, expected {expected}")]
    OutputCountMismatch { expected: usize, actual: usize },

    #[error("Model output {index} is not a finite number")]
    NonFiniteOutput { index: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Opaque regression model: feature row in, output row out
pub trait Regressor: Send + Sync {
    /// Expected feature row length
    fn n_features(&self) -> usize;

    /// Output row length
    fn n_outputs(&self) -> usize;

    /// Run inference on a single feature row
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Verify a regressor's row widths match the schema
pub fn check_dimensions(model: &dyn Regressor, schema: &Schema) -> Result<(), ModelError> {
    if model.n_features() != schema.feature_len() {
        return Err(ModelError::Incompatible(format!(
            "model has {} features, schema has {}",
            model.n_features(),
            schema.feature_len()
        )));
    }

    if model.n_outputs() != schema.output_len() {
        return Err(ModelError::Incompatible(format!(
            "model has {} outputs, schema has {} box labels",
            model.n_outputs(),
            schema.output_len()
        )));
    }

    Ok(())
}

/// Verify a loaded model lines up with the schema it will be fed.
///
/// Dimensions must match. Feature and output names, when the artifact
/// carries them, must match the schema order exactly.
pub fn check_compatibility(model: &ForestModel, schema: &Schema) -> Result<(), ModelError> {
    check_dimensions(model, schema)?;

    if let Some(names) = &model.feature_names {
        let expected = schema.feature_names();
        if let Some(pos) = first_mismatch(names, &expected) {
            return Err(ModelError::Incompatible(format!(
                "feature order differs at position {pos}"
            )));
        }
    }

    if let Some(names) = &model.output_names {
        let expected: Vec<&str> = schema.labels().iter().map(String::as_str).collect();
        if let Some(pos) = first_mismatch(names, &expected) {
            return Err(ModelError::Incompatible(format!(
                "output order differs at position {pos}"
            )));
        }
    }

    Ok(())
}

fn first_mismatch(actual: &[String], expected: &[&str]) -> Option<usize> {
    if actual.len() != expected.len() {
        return Some(actual.len().min(expected.len()));
    }
    actual
        .iter()
        .zip(expected)
        .position(|(a, e)| a.as_str() != *e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_forest(n_features: usize, n_outputs: usize) -> ForestModel {
        ForestModel::new(
            n_features,
            n_outputs,
            vec![Tree::new(vec![Node::leaf(vec![1.0; n_outputs])])],
        )
    }

    #[test]
    fn test_compatible_dimensions() {
        let schema = Schema::builtin();
        let model = constant_forest(schema.feature_len(), schema.output_len());
        assert!(check_compatibility(&model, &schema).is_ok());
    }

    #[test]
    fn test_incompatible_feature_count() {
        let schema = Schema::builtin();
        let model = constant_forest(schema.feature_len() + 1, schema.output_len());
        assert!(matches!(
            check_compatibility(&model, &schema),
            Err(ModelError::Incompatible(_))
        ));
    }

    #[test]
    fn test_check_dimensions_on_trait_object() {
        let schema = Schema::builtin();
        let good: Box<dyn Regressor> =
            Box::new(constant_forest(schema.feature_len(), schema.output_len()));
        assert!(check_dimensions(good.as_ref(), &schema).is_ok());

        let wide: Box<dyn Regressor> =
            Box::new(constant_forest(schema.feature_len(), schema.output_len() + 1));
        let err = check_dimensions(wide.as_ref(), &schema).unwrap_err();
        assert!(err.to_string().contains("17 outputs"));
    }

    #[test]
    fn test_incompatible_output_count() {
        let schema = Schema::builtin();
        let model = constant_forest(schema.feature_len(), 3);
        assert!(check_compatibility(&model, &schema).is_err());
    }

    #[test]
    fn test_feature_name_order_checked() {
        let schema = Schema::builtin();
        let mut names: Vec<String> = schema.feature_names().iter().map(|s| s.to_string()).collect();

        let mut model = constant_forest(schema.feature_len(), schema.output_len());
        model.feature_names = Some(names.clone());
        assert!(check_compatibility(&model, &schema).is_ok());

        names.swap(3, 4);
        model.feature_names = Some(names);
        let err = check_compatibility(&model, &schema).unwrap_err();
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn test_output_name_order_checked() {
        let schema = Schema::builtin();
        let mut model = constant_forest(schema.feature_len(), schema.output_len());
        let mut labels = schema.labels().to_vec();
        labels.reverse();
        model.output_names = Some(labels);
        assert!(check_compatibility(&model, &schema).is_err());
    }
}
