//! Change detection between two value snapshots.
//!
//! The detector decides whether a settled widget edit differs from the value
//! currently held by the store. A store write is only dispatched when it does.
//!
//! Two strategies are available:
//!
//! - [`CompareStrategy::Structural`] (default): deep equality over
//!   [`FieldValue`]. Mapping key order is ignored.
//! - [`CompareStrategy::Serialized`]: compares canonical JSON encodings. This
//!   is sensitive to mapping key insertion order, so two logically equal
//!   mappings built in different orders are reported as different. It is kept
//!   for compatibility with stores that persist the serialized form.
//!
//! # Invariants
//!
//! 1. `is_different(x, x)` is `false` for every `x`.
//! 2. `is_different(x, y)` is `true` whenever some scalar leaf differs.
//! 3. Serialization failure is an error, never a silent "equal".

use serde::{Deserialize, Serialize};

use crate::value::{FieldValue, Scalar};

/// Errors raised while comparing values.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// A value could not be encoded canonically.
    #[error("failed to serialize value for comparison: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural deep equality.
#[must_use]
pub fn deep_eq(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Scalar(x), FieldValue::Scalar(y)) => scalar_eq(x, y),
        (FieldValue::Sequence(xs), FieldValue::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (FieldValue::Mapping(xs), FieldValue::Mapping(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_eq(x, y)))
        }
        _ => false,
    }
}

fn scalar_eq(a: &Scalar, b: &Scalar) -> bool {
    a == b
}

/// Whether two values differ structurally.
#[must_use]
pub fn is_different(a: &FieldValue, b: &FieldValue) -> bool {
    !deep_eq(a, b)
}

/// Canonical depth-first encoding used by the serialized strategy.
pub fn canonical_string(value: &FieldValue) -> Result<String, CompareError> {
    Ok(serde_json::to_string(value)?)
}

/// Whether the canonical encodings of two values differ.
pub fn is_different_serialized(a: &FieldValue, b: &FieldValue) -> Result<bool, CompareError> {
    Ok(canonical_string(a)? != canonical_string(b)?)
}

/// Which comparison gates store writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareStrategy {
    #[default]
    Structural,
    Serialized,
}

impl CompareStrategy {
    /// Compare with this strategy.
    pub fn is_different(self, a: &FieldValue, b: &FieldValue) -> Result<bool, CompareError> {
        match self {
            Self::Structural => Ok(is_different(a, b)),
            Self::Serialized => is_different_serialized(a, b),
        }
    }
}
