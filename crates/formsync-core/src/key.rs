//! Addressing of field-groups inside the store.
//!
//! A [`SliceKey`] is the `(feature, path)` pair that maps one bound form to
//! its entry in the store. Feature names identify a logical form domain; paths
//! identify one field-group within it.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Separator used by [`SliceKey::canonical`].
pub const KEY_SEPARATOR: &str = "::";

/// Store address of one field-group.
///
/// ```
/// # use formsync_core::SliceKey;
/// let key = SliceKey::new("checkout", "shipping");
/// assert_eq!(key.canonical(), "checkout::shipping");
/// assert_eq!(SliceKey::parse("checkout::shipping"), Some(key));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SliceKey {
    /// Top-level form domain.
    pub feature: String,
    /// Field-group within the feature.
    pub path: String,
}

impl SliceKey {
    #[must_use]
    pub fn new(feature: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            path: path.into(),
        }
    }

    /// Canonical string representation: `"feature::path"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.feature, self.path)
    }

    /// Parse a canonical key. Returns `None` when the separator is missing or
    /// either half is empty.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (feature, path) = raw.split_once(KEY_SEPARATOR)?;
        if feature.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self::new(feature, path))
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.feature, self.path)
    }
}
