#![forbid(unsafe_code)]

//! Feature registration and synchronization settings.
//!
//! A feature is declared once with [`register_feature`], which returns a
//! [`FeatureConfig`]. The store seeds its forms from that config, and each
//! form binding is configured with [`FeatureConfig::bind`]. There is no global
//! registry: the config value is passed explicitly.
//!
//! [`SyncConfig`] can be loaded from TOML:
//!
//! ```
//! # use formsync_runtime::config::SyncConfig;
//! # use std::time::Duration;
//! let cfg = SyncConfig::from_toml_str(r#"
//!     debounce_ms = 400
//!     compare = "serialized"
//!     error_map = "namespaced"
//! "#).unwrap();
//! assert_eq!(cfg.debounce, Duration::from_millis(400));
//! ```

use std::time::Duration;

use formsync_core::{CompareStrategy, ErrorMapMode, FieldValue, SliceKey};
use serde::{Deserialize, Serialize};

/// Shortest accepted debounce window.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounce window of the legacy binding.
pub const LEGACY_DEBOUNCE: Duration = Duration::from_millis(400);

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid sync config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("debounce window {got:?} is below the minimum of {min:?}")]
    DebounceTooShort { got: Duration, min: Duration },
    #[error("feature name must not be empty")]
    EmptyFeature,
    #[error("form path must not be empty")]
    EmptyPath,
}

/// How a form binding synchronizes with the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before an edit counts as settled.
    #[serde(rename = "debounce_ms", with = "duration_ms")]
    pub debounce: Duration,
    /// Change detector used to gate store writes.
    pub compare: CompareStrategy,
    /// Shape of the error map sent with each update.
    pub error_map: ErrorMapMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: MIN_DEBOUNCE,
            compare: CompareStrategy::default(),
            error_map: ErrorMapMode::default(),
        }
    }
}

impl SyncConfig {
    /// The 400 ms window used by the legacy binding.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            debounce: LEGACY_DEBOUNCE,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_compare(mut self, compare: CompareStrategy) -> Self {
        self.compare = compare;
        self
    }

    #[must_use]
    pub fn with_error_map(mut self, mode: ErrorMapMode) -> Self {
        self.error_map = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce < MIN_DEBOUNCE {
            return Err(ConfigError::DebounceTooShort {
                got: self.debounce,
                min: MIN_DEBOUNCE,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Declaration of one feature: its name, its forms, and shared sync settings.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureConfig {
    name: String,
    forms: Vec<(String, FieldValue)>,
    sync: SyncConfig,
}

/// Declare a feature. Chain [`FeatureConfig::with_form`] to add its forms.
#[must_use]
pub fn register_feature(name: impl Into<String>) -> FeatureConfig {
    FeatureConfig {
        name: name.into(),
        forms: Vec::new(),
        sync: SyncConfig::default(),
    }
}

impl FeatureConfig {
    /// Declare a form at `path` with initial content. A repeated path
    /// replaces the earlier declaration.
    #[must_use]
    pub fn with_form(mut self, path: impl Into<String>, initial: impl Into<FieldValue>) -> Self {
        let path = path.into();
        let initial = initial.into();
        match self.forms.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = initial,
            None => self.forms.push((path, initial)),
        }
        self
    }

    #[must_use]
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn forms(&self) -> &[(String, FieldValue)] {
        &self.forms
    }

    #[must_use]
    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyFeature);
        }
        if self.forms.iter().any(|(p, _)| p.is_empty()) {
            return Err(ConfigError::EmptyPath);
        }
        self.sync.validate()
    }

    /// Configuration for a binding to `path` in this feature.
    #[must_use]
    pub fn bind(&self, path: impl Into<String>) -> BindingConfig {
        BindingConfig {
            key: SliceKey::new(&self.name, path),
            sync: self.sync.clone(),
        }
    }
}

/// Everything one form binding needs to know about its slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingConfig {
    pub key: SliceKey,
    pub sync: SyncConfig,
}

impl BindingConfig {
    #[must_use]
    pub fn new(key: SliceKey) -> Self {
        Self {
            key,
            sync: SyncConfig::default(),
        }
    }

    #[must_use]
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.feature.is_empty() {
            return Err(ConfigError::EmptyFeature);
        }
        if self.key.path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        self.sync.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.debounce, MIN_DEBOUNCE);
        assert_eq!(cfg.compare, CompareStrategy::Structural);
        assert_eq!(cfg.error_map, ErrorMapMode::Flattened);
        assert!(cfg.validate().is_ok());
        assert_eq!(SyncConfig::legacy().debounce, Duration::from_millis(400));
    }

    #[test]
    fn toml_missing_keys_take_defaults() {
        let cfg = SyncConfig::from_toml_str("debounce_ms = 350").unwrap();
        assert_eq!(cfg.debounce, Duration::from_millis(350));
        assert_eq!(cfg.compare, CompareStrategy::Structural);
        assert_eq!(SyncConfig::from_toml_str("").unwrap(), SyncConfig::default());
    }

    #[test]
    fn toml_rejects_short_debounce() {
        let err = SyncConfig::from_toml_str("debounce_ms = 50").unwrap_err();
        assert!(matches!(err, ConfigError::DebounceTooShort { .. }));
    }

    #[test]
    fn toml_rejects_unknown_strategy() {
        let err = SyncConfig::from_toml_str(r#"compare = "fuzzy""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let cfg = SyncConfig::legacy().with_error_map(ErrorMapMode::Namespaced);
        let text = toml::to_string(&cfg).unwrap();
        assert!(text.contains("debounce_ms = 400"));
        assert_eq!(SyncConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn feature_bind_inherits_sync() {
        let feature = register_feature("checkout")
            .with_form("shipping", FieldValue::mapping())
            .with_sync(SyncConfig::legacy());
        let binding = feature.bind("shipping");
        assert_eq!(binding.key, SliceKey::new("checkout", "shipping"));
        assert_eq!(binding.sync.debounce, LEGACY_DEBOUNCE);
        assert!(binding.validate().is_ok());
    }

    #[test]
    fn repeated_form_replaces_declaration() {
        let feature = register_feature("f")
            .with_form("p", FieldValue::from(1))
            .with_form("p", FieldValue::from(2));
        assert_eq!(feature.forms(), &[("p".to_owned(), FieldValue::from(2))]);
    }

    #[test]
    fn empty_names_are_invalid() {
        assert!(matches!(
            register_feature("").validate(),
            Err(ConfigError::EmptyFeature)
        ));
        assert!(matches!(
            register_feature("f").bind("").validate(),
            Err(ConfigError::EmptyPath)
        ));
    }
}
