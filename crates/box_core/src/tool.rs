//! `predict_boxes` tool surface for a hosting agent runtime

use crate::predictor::{Predictor, ToolResponse};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const TOOL_NAME: &str = "predict_boxes";

pub const TOOL_DESCRIPTION: &str = "Predicts packing box counts from category quantities.";

/// System instruction for the agent that owns this tool
pub const AGENT_INSTRUCTION: &str = "You are a box prediction agent. \
When the user provides categories and quantities, call the tool \
`predict_boxes` with two arguments: `categories` (list[str]) and \
`quantities` (list[int]). If something is missing, ask for it.";

/// Tool metadata advertised to the agent runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Arguments of a `predict_boxes` call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolArgs {
    pub categories: Vec<String>,
    /// Integers, or whole-number floats such as `2.0`; `null` means absent
    #[serde(deserialize_with = "whole_quantities")]
    pub quantities: Vec<Option<i64>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
}

// i64::MAX is not exactly representable; 2^63 is the first float out of range
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn whole_quantities<'de, D>(deserializer: D) -> Result<Vec<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Option<RawQuantity>>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|q| match q {
            None => Ok(None),
            Some(RawQuantity::Int(n)) => Ok(Some(n)),
            Some(RawQuantity::Float(f)) => {
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < I64_UPPER {
                    Ok(Some(f as i64))
                } else {
                    Err(de::Error::custom(format!(
                        "quantity {f} is not a whole number"
                    )))
                }
            }
        })
        .collect()
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.into(),
        description: TOOL_DESCRIPTION.into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "categories": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Product category names, e.g. \"Category_100cc\""
                },
                "quantities": {
                    "type": "array",
                    "items": { "type": ["integer", "null"] },
                    "description": "Quantity for each category, in the same order"
                }
            },
            "required": ["categories", "quantities"]
        }),
    }
}

/// Run the tool on raw JSON arguments.
///
/// Arguments that do not deserialize into [`ToolArgs`] produce an error
/// response rather than a failure.
pub fn invoke(predictor: &Predictor, args: Value) -> ToolResponse {
    match serde_json::from_value::<ToolArgs>(args) {
        Ok(args) => {
            debug!(entries = args.categories.len(), "invoking {TOOL_NAME}");
            predictor.predict_boxes(&args.categories, &args.quantities)
        }
        Err(err) => ToolResponse::error(format!("invalid arguments for {TOOL_NAME}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForestModel, Node, Tree};
    use crate::schema::Schema;
    use std::sync::Arc;

    fn constant_predictor() -> Predictor {
        let schema = Schema::global();
        let model = ForestModel::new(
            schema.feature_len(),
            schema.output_len(),
            vec![Tree::new(vec![Node::leaf(vec![1.0; schema.output_len()])])],
        );
        Predictor::new(schema, Arc::new(model)).unwrap()
    }

    #[test]
    fn test_definition_requires_both_lists() {
        let def = tool_definition();
        assert_eq!(def.name, "predict_boxes");
        assert_eq!(
            def.input_schema["required"],
            json!(["categories", "quantities"])
        );
    }

    #[test]
    fn test_invoke_success() {
        let predictor = constant_predictor();
        let response = invoke(
            &predictor,
            json!({"categories": ["Category_100cc"], "quantities": [3]}),
        );
        assert!(response.is_success());
    }

    #[test]
    fn test_invoke_accepts_null_quantity() {
        let predictor = constant_predictor();
        let response = invoke(
            &predictor,
            json!({"categories": ["Category_100cc", "Category_500G"], "quantities": [null, 2]}),
        );
        assert!(response.is_success());
    }

    #[test]
    fn test_whole_number_floats_are_quantities() {
        let args: ToolArgs = serde_json::from_value(json!({
            "categories": ["Category_100cc", "Category_500G", "Category_5lbs"],
            "quantities": [2.0, null, 3]
        }))
        .unwrap();
        assert_eq!(args.quantities, vec![Some(2), None, Some(3)]);

        let predictor = constant_predictor();
        let response = invoke(
            &predictor,
            json!({"categories": ["Category_100cc"], "quantities": [4.0]}),
        );
        assert!(response.is_success());
    }

    #[test]
    fn test_fractional_quantity_is_error_response() {
        let predictor = constant_predictor();
        let response = invoke(
            &predictor,
            json!({"categories": ["Category_100cc"], "quantities": [2.5]}),
        );
        match response {
            ToolResponse::Error { message } => {
                assert!(message.starts_with("invalid arguments"));
                assert!(message.contains("not a whole number"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_invoke_malformed_arguments() {
        let predictor = constant_predictor();
        let response = invoke(&predictor, json!({"categories": "Category_100cc"}));
        match response {
            ToolResponse::Error { message } => assert!(message.starts_with("invalid arguments")),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_invoke_length_mismatch() {
        let predictor = constant_predictor();
        let response = invoke(
            &predictor,
            json!({"categories": ["a", "b", "c"], "quantities": [1, 2]}),
        );
        assert!(!response.is_success());
    }
}
