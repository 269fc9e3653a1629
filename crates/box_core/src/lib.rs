//! Box Predictor Core
//!
//! Turns a list of product categories and quantities into predicted counts
//! of standardized shipping boxes.
//!
//! Modules:
//! - `schema`: Fixed feature and output ordering shared with the trained model
//! - `features`: Feature row construction from category/quantity pairs
//! - `model`: Regressor interface and the JSON random-forest artifact
//! - `predictor`: Encoding, inference and post-processing behind one call
//! - `tool`: Agent-facing `predict_boxes` tool definition and invocation
//! - `config`: TOML/env configuration for hosting processes
//! - `errors`: Error types

pub mod config;
pub mod errors;
pub mod features;
pub mod model;
pub mod predictor;
pub mod schema;
pub mod tool;

pub use config::PredictorConfig;
pub use errors::{PredictorError, Result};
pub use features::{encode, FeatureVector};
pub use model::{
    check_compatibility, check_dimensions, ForestModel, ModelError, Node, Regressor, Tree,
};
pub use predictor::{BoxCount, BoxPrediction, Predictor, ToolResponse};
pub use schema::{
    Schema, SchemaError, ALL_FEATURES, BOX_DIMENSIONS, DERIVED_FEATURES, INPUT_CATEGORIES,
};
pub use tool::{invoke, tool_definition, ToolArgs, ToolDefinition, TOOL_NAME};

/// Crate version string for tool metadata and logs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
