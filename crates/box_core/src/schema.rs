//! Feature and output ordering for the box-count model
//!
//! Every list here must match the column order the model was trained on.
//! Reordering an entry silently corrupts predictions.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Product category columns recognized by the model, in training order
pub const INPUT_CATEGORIES: [&str; 11] = [
    "Category_100cc",
    "Category_1100ml",
    "Category_12 weight|kg",
    "Category_150g",
    "Category_4240cc",
    "Category_500G",
    "Category_5lbs",
    "Category_710ml",
    "Category_8150ml",
    "Category_900ml",
    "Category_C box 16*12*11.5",
];

/// Aggregate features prepended to the category columns
pub const DERIVED_FEATURES: [&str; 3] = ["Total No. Of Quantity", "Avg Quantity", "Max Quantity"];

/// Full feature row layout: derived features, then categories
pub const ALL_FEATURES: [&str; 14] = [
    DERIVED_FEATURES[0],
    DERIVED_FEATURES[1],
    DERIVED_FEATURES[2],
    INPUT_CATEGORIES[0],
    INPUT_CATEGORIES[1],
    INPUT_CATEGORIES[2],
    INPUT_CATEGORIES[3],
    INPUT_CATEGORIES[4],
    INPUT_CATEGORIES[5],
    INPUT_CATEGORIES[6],
    INPUT_CATEGORIES[7],
    INPUT_CATEGORIES[8],
    INPUT_CATEGORIES[9],
    INPUT_CATEGORIES[10],
];

/// Box dimension labels, positionally aligned with model outputs
pub const BOX_DIMENSIONS: [&str; 16] = [
    "10x10x10", "12x18x10", "12x8x20", "18x17x27", "20x20x34", "30x30x29", "32x20x17",
    "38x30x20", "40x30x29", "40x30x34", "40x40x34", "42x42x30", "48x34x27", "60x30x30",
    "8x22x13", "8x8x13",
];

static GLOBAL: Lazy<Arc<Schema>> = Lazy::new(|| Arc::new(Schema::builtin()));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate {kind} name in schema: {name}")]
    Duplicate { kind: &'static str, name: String },
}

/// Immutable ordered registry of feature columns and output labels
#[derive(Debug, Clone)]
pub struct Schema {
    derived: Vec<String>,
    categories: Vec<String>,
    labels: Vec<String>,
    slots: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from explicit lists. Category and label names must be unique.
    pub fn new<C, L>(categories: C, labels: L) -> Result<Self, SchemaError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let derived: Vec<String> = DERIVED_FEATURES.iter().map(|s| s.to_string()).collect();
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        let mut slots = HashMap::with_capacity(categories.len());
        for (i, name) in categories.iter().enumerate() {
            if slots.insert(name.clone(), derived.len() + i).is_some() {
                return Err(SchemaError::Duplicate {
                    kind: "category",
                    name: name.clone(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(SchemaError::Duplicate {
                    kind: "label",
                    name: label.clone(),
                });
            }
        }

        Ok(Self {
            derived,
            categories,
            labels,
            slots,
        })
    }

    /// The schema the shipped model was trained with
    ///
    /// The builtin constants are unique, so construction cannot fail.
    pub fn builtin() -> Self {
        Self::new(INPUT_CATEGORIES, BOX_DIMENSIONS).expect("builtin schema names are unique")
    }

    /// Process-wide shared instance of [`Schema::builtin`]
    pub fn global() -> Arc<Schema> {
        Arc::clone(&GLOBAL)
    }

    /// Length of every encoded feature row
    pub fn feature_len(&self) -> usize {
        self.derived.len() + self.categories.len()
    }

    /// Number of model outputs (one per box label)
    pub fn output_len(&self) -> usize {
        self.labels.len()
    }

    /// Feature row index for a category, if known
    pub fn slot_of(&self, category: &str) -> Option<usize> {
        self.slots.get(category).copied()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Feature names in row order
    pub fn feature_names(&self) -> Vec<&str> {
        self.derived
            .iter()
            .chain(self.categories.iter())
            .map(String::as_str)
            .collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}
