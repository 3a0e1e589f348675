//! Store state: features, paths, and per-path form state.
//!
//! The tree is held in persistent maps so an update only allocates along the
//! changed `(feature, path)`; every other entry keeps its `Arc` identity.

use std::fmt;
use std::sync::Arc;

use formsync_core::{ErrorMap, FieldValue, SliceKey};
use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Public state of one field-group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormState<T = FieldValue> {
    pub value: T,
    #[serde(default)]
    pub errors: ErrorMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pristine: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl<T> FormState<T> {
    /// Freshly registered state: no errors, pristine, not yet valid.
    #[must_use]
    pub fn initial(value: T) -> Self {
        Self {
            value,
            errors: ErrorMap::new(),
            pristine: Some(true),
            valid: Some(false),
        }
    }
}

impl Default for FormState<FieldValue> {
    fn default() -> Self {
        Self::initial(FieldValue::mapping())
    }
}

impl FormState<FieldValue> {
    /// Shallow merge of `patch` over `self`.
    ///
    /// `value` and `errors` are replaced wholesale; `pristine` and `valid`
    /// are replaced only when the patch carries them.
    #[must_use]
    pub fn merged(&self, patch: &FormState) -> FormState {
        FormState {
            value: patch.value.clone(),
            errors: patch.errors.clone(),
            pristine: patch.pristine.or(self.pristine),
            valid: patch.valid.or(self.valid),
        }
    }
}

/// Wire shape of a form update event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload<T = FieldValue> {
    pub feature: String,
    pub path: String,
    pub form: FormState<T>,
}

impl<T> UpdatePayload<T> {
    #[must_use]
    pub fn new(key: &SliceKey, form: FormState<T>) -> Self {
        Self {
            feature: key.feature.clone(),
            path: key.path.clone(),
            form,
        }
    }

    #[must_use]
    pub fn key(&self) -> SliceKey {
        SliceKey::new(&self.feature, &self.path)
    }
}

/// Why an update could not be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// No feature with this name was registered.
    UnknownFeature(String),
    /// The feature exists but has no entry for this path.
    UnknownPath(SliceKey),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFeature(name) => write!(f, "feature '{name}' is not registered"),
            Self::UnknownPath(key) => write!(f, "no form registered at '{key}'"),
        }
    }
}

impl std::error::Error for DropReason {}

/// Forms of one feature, keyed by path.
pub type FeatureSlice = OrdMap<String, Arc<FormState>>;

/// Whole-store state: features keyed by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreState {
    features: OrdMap<String, FeatureSlice>,
}

impl StoreState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&FeatureSlice> {
        self.features.get(name)
    }

    #[must_use]
    pub fn form(&self, key: &SliceKey) -> Option<&Arc<FormState>> {
        self.features.get(&key.feature)?.get(&key.path)
    }

    /// Current value of the field-group at `key`.
    #[must_use]
    pub fn value(&self, key: &SliceKey) -> Option<&FieldValue> {
        self.form(key).map(|form| &form.value)
    }

    /// Check that `key` addresses a registered form.
    pub fn check(&self, key: &SliceKey) -> Result<(), DropReason> {
        let slice = self
            .features
            .get(&key.feature)
            .ok_or_else(|| DropReason::UnknownFeature(key.feature.clone()))?;
        if slice.contains_key(&key.path) {
            Ok(())
        } else {
            Err(DropReason::UnknownPath(key.clone()))
        }
    }

    /// Return a state with `form` stored at `key`, creating the feature if
    /// needed.
    #[must_use]
    pub fn with_form(&self, key: &SliceKey, form: FormState) -> Self {
        let slice = self
            .features
            .get(&key.feature)
            .cloned()
            .unwrap_or_default()
            .update(key.path.clone(), Arc::new(form));
        Self {
            features: self.features.update(key.feature.clone(), slice),
        }
    }

    /// Return a state where `feature` exists (possibly empty).
    #[must_use]
    pub fn with_feature(&self, feature: &str) -> Self {
        if self.features.contains_key(feature) {
            return self.clone();
        }
        Self {
            features: self.features.update(feature.to_owned(), FeatureSlice::new()),
        }
    }

    /// Shallow-merge `payload.form` into its entry.
    ///
    /// Only the feature and path along the update get new identities.
    pub fn apply_update(&self, payload: &UpdatePayload) -> Result<Self, DropReason> {
        let key = payload.key();
        self.check(&key)?;
        let slice = &self.features[&key.feature];
        let merged = slice[&key.path].merged(&payload.form);
        let slice = slice.update(key.path, Arc::new(merged));
        Ok(Self {
            features: self.features.update(key.feature, slice),
        })
    }

    /// Iterate `(key, form)` pairs in feature/path order.
    pub fn forms(&self) -> impl Iterator<Item = (SliceKey, &Arc<FormState>)> + '_ {
        self.features.iter().flat_map(|(feature, slice)| {
            slice
                .iter()
                .map(move |(path, form)| (SliceKey::new(feature, path), form))
        })
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}
