//! Feature row construction from category/quantity pairs
//!
//! Row layout (see [`crate::schema::ALL_FEATURES`]):
//! 0. Total quantity across all entries
//! 1. Average quantity per entry
//! 2. Maximum quantity among entries
//! 3.. One slot per known category, zero when not supplied
use crate::errors::{PredictorError, Result};
use crate::schema::Schema;
use tracing::debug;

/// Feature vector in schema order
pub type FeatureVector = Vec<f64>;

/// Encode a request into a feature row.
///
/// Unknown categories are skipped without error, absent quantities count as
/// zero, and a repeated category keeps the quantity of its last occurrence.
/// Derived features are computed over every entry, including unknown and
/// repeated ones. The trained model depends on this exact encoding.
///
/// # Errors
/// [`PredictorError::LengthMismatch`] when the two lists differ in length.
///
/// # Example
/// ```
/// use box_predictor_core::{encode, Schema};
///
/// let schema = Schema::builtin();
/// let row = encode(&schema, &["Category_100cc", "Category_500G"], &[Some(2), Some(3)]).unwrap();
/// assert_eq!(&row[..3], &[5.0, 2.5, 3.0]);
/// assert_eq!(row[schema.slot_of("Category_100cc").unwrap()], 2.0);
/// ```
pub fn encode<S: AsRef<str>>(
    schema: &Schema,
    categories: &[S],
    quantities: &[Option<i64>],
) -> Result<FeatureVector> {
    if categories.len() != quantities.len() {
        return Err(PredictorError::LengthMismatch {
            categories: categories.len(),
            quantities: quantities.len(),
        });
    }

    let mut row = vec![0.0; schema.feature_len()];
    let mut unknown = 0usize;

    for (category, quantity) in categories.iter().zip(quantities) {
        match schema.slot_of(category.as_ref()) {
            Some(slot) => row[slot] = quantity.unwrap_or(0) as f64,
            None => unknown += 1,
        }
    }

    let values = quantities.iter().map(|q| q.unwrap_or(0));
    let total: i64 = values.clone().fold(0i64, |acc, q| acc.saturating_add(q));
    let (average, max) = if quantities.is_empty() {
        (0.0, 0)
    } else {
        (
            total as f64 / quantities.len() as f64,
            values.max().unwrap_or(0),
        )
    };

    row[0] = total as f64;
    row[1] = average;
    row[2] = max as f64;

    debug!(
        entries = quantities.len(),
        unknown,
        total,
        "encoded feature row"
    );

    Ok(row)
}
