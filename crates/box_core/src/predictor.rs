//! Box-count prediction: encode, infer, clean up, label
//!
//! [`Predictor::predict`] is the typed entry point. [`Predictor::predict_boxes`]
//! is the agent-facing boundary that always returns a tagged [`ToolResponse`].

use crate::errors::Result;
use crate::features::encode;
use crate::model::{check_compatibility, check_dimensions, ForestModel, ModelError, Regressor};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header line of the rendered prediction text
pub const RENDER_HEADER: &str = "📦 Predicted Box Counts:";

/// Predicted count for one box size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoxCount {
    pub label: String,
    pub count: u64,
}

/// Cleaned model output, one entry per box label in schema order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoxPrediction {
    pub counts: Vec<BoxCount>,
}

impl BoxPrediction {
    /// Count for a label, if the label exists
    pub fn count_of(&self, label: &str) -> Option<u64> {
        self.counts.iter().find(|c| c.label == label).map(|c| c.count)
    }

    /// Sum of all predicted boxes
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.count).sum()
    }

    /// Human-readable rendering: a header, then `label: count` per line
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BoxPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RENDER_HEADER}")?;
        for c in &self.counts {
            write!(f, "\n{}: {}", c.label, c.count)?;
        }
        Ok(())
    }
}

/// Tagged result handed back to the agent runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResponse {
    Success { predictions: String },
    Error { message: String },
}

impl ToolResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ToolResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResponse::Success { .. })
    }
}

/// Round half to even, then clamp at zero.
///
/// The model was trained in a pipeline whose rounding is ties-to-even, so
/// `2.5` becomes `2` and `3.5` becomes `4`.
pub fn clean_output(raw: &[f64]) -> std::result::Result<Vec<u64>, ModelError> {
    raw.iter()
        .enumerate()
        .map(|(index, &v)| {
            if !v.is_finite() {
                return Err(ModelError::NonFiniteOutput { index });
            }
            Ok(v.round_ties_even().max(0.0) as u64)
        })
        .collect()
}

/// Stateless predictor over a shared schema and a shared read-only model
#[derive(Clone)]
pub struct Predictor {
    schema: Arc<Schema>,
    model: Arc<dyn Regressor>,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("n_features", &self.model.n_features())
            .field("n_outputs", &self.model.n_outputs())
            .finish()
    }
}

impl Predictor {
    /// Wrap an already loaded model.
    ///
    /// The model's dimensions must match the schema.
    pub fn new(schema: Arc<Schema>, model: Arc<dyn Regressor>) -> Result<Self> {
        check_dimensions(model.as_ref(), &schema)?;
        Ok(Self { schema, model })
    }

    /// Load a forest artifact and check it against the builtin schema
    pub fn from_model_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let schema = Schema::global();
        let model = ForestModel::load_json(path)?;
        check_compatibility(&model, &schema)?;
        Ok(Self {
            schema,
            model: Arc::new(model),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encode the request, run the model and label the cleaned outputs.
    pub fn predict<S: AsRef<str>>(
        &self,
        categories: &[S],
        quantities: &[Option<i64>],
    ) -> Result<BoxPrediction> {
        let features = encode(&self.schema, categories, quantities)?;
        let raw = self.model.predict(&features)?;

        if raw.len() != self.schema.output_len() {
            return Err(ModelError::OutputCountMismatch {
                expected: self.schema.output_len(),
                actual: raw.len(),
            }
            .into());
        }

        let counts = clean_output(&raw)?
            .into_iter()
            .zip(self.schema.labels())
            .map(|(count, label)| BoxCount {
                label: label.clone(),
                count,
            })
            .collect::<Vec<_>>();

        let prediction = BoxPrediction { counts };
        debug!(
            entries = categories.len(),
            total_boxes = prediction.total(),
            "prediction complete"
        );
        Ok(prediction)
    }

    /// Agent tool boundary: every failure becomes a tagged error response.
    pub fn predict_boxes<S: AsRef<str>>(
        &self,
        categories: &[S],
        quantities: &[Option<i64>],
    ) -> ToolResponse {
        match self.predict(categories, quantities) {
            Ok(prediction) => ToolResponse::Success {
                predictions: prediction.render(),
            },
            Err(err) => {
                warn!(error = %err, validation = err.is_validation(), "predict_boxes failed");
                ToolResponse::error(err.to_string())
            }
        }
    }
}
