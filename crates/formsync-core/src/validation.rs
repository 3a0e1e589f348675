//! Validation failures as data.
//!
//! A failing leaf carries [`FieldErrors`]: validator name mapped to a detail
//! value (`required → true`, `minlength → {requiredLength, actualLength}`).
//! A field-group reports an [`ErrorMap`] collected from its children.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Active failures of one leaf, keyed by validator name.
pub type FieldErrors = IndexMap<String, FieldValue>;

/// Errors of a field-group, keyed by child name.
pub type ErrorMap = IndexMap<String, ErrorEntry>;

/// One entry of an [`ErrorMap`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorEntry {
    /// Failures of a leaf.
    Field(FieldErrors),
    /// Errors of a nested group ([`ErrorMapMode::Namespaced`] only).
    Group(ErrorMap),
}

impl ErrorEntry {
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldErrors> {
        match self {
            Self::Field(errors) => Some(errors),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&ErrorMap> {
        match self {
            Self::Group(map) => Some(map),
            Self::Field(_) => None,
        }
    }
}

/// How nested group errors are folded into a parent's [`ErrorMap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMapMode {
    /// Nested maps are merged into the current level with no prefix.
    /// Sibling groups with identically named leaves overwrite each other.
    #[default]
    Flattened,
    /// Nested maps are kept under the group's own name.
    Namespaced,
}

/// Count leaf entries in an error map, descending into groups.
#[must_use]
pub fn failing_fields(map: &ErrorMap) -> usize {
    map.values()
        .map(|entry| match entry {
            ErrorEntry::Field(_) => 1,
            ErrorEntry::Group(inner) => failing_fields(inner),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_entries_serialize_flat() {
        let mut field = FieldErrors::new();
        field.insert("required".into(), FieldValue::from(true));
        let mut map = ErrorMap::new();
        map.insert("zip".into(), ErrorEntry::Field(field));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"zip": {"required": true}}));
    }

    #[test]
    fn failing_fields_descends_groups() {
        let mut field = FieldErrors::new();
        field.insert("required".into(), FieldValue::from(true));
        let mut inner = ErrorMap::new();
        inner.insert("zip".into(), ErrorEntry::Field(field.clone()));
        inner.insert("city".into(), ErrorEntry::Field(field.clone()));
        let mut outer = ErrorMap::new();
        outer.insert("name".into(), ErrorEntry::Field(field));
        outer.insert("address".into(), ErrorEntry::Group(inner));
        assert_eq!(failing_fields(&outer), 3);
    }
}
