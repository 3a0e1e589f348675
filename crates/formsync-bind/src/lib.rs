#![forbid(unsafe_code)]

//! Store/form synchronization for formsync.
//!
//! - [`reconcile`]: bring a widget tree in line with a store value
//! - [`errors`]: derive the store error map from a widget tree
//! - [`binding`]: [`FormBinding`], the bidirectional store/form link
//!
//! Typical wiring:
//!
//! 1. Describe a feature with [`register_feature`] and its forms.
//! 2. Install it in the store with `Store::register_feature`.
//! 3. Mount a [`FormBinding`] per form with `FeatureConfig::bind(path)`.
//! 4. Call [`FormBinding::poll`] from the event loop.

pub mod binding;
pub mod errors;
pub mod reconcile;

pub use binding::{BindError, BindingStats, FormBinding, PollOutcome};
pub use errors::collect_errors;
pub use formsync_runtime::{BindingConfig, FeatureConfig, register_feature};
pub use reconcile::{
    ReconcileReport, apply_scalars, build_array, build_control, build_group, extract_value,
    rebuild_structure, reconcile,
};
