#![forbid(unsafe_code)]

//! formsync public facade.
//!
//! Re-exports the pieces most applications need and a [`prelude`] for
//! glob import.
//!
//! ```
//! use formsync::prelude::*;
//!
//! let feature = register_feature("profile").with_form("main", FieldValue::mapping());
//! let store = Store::new();
//! store.register_feature(&feature);
//!
//! let form = FormHandle::new(FormGroup::new());
//! let binding = FormBinding::mount(&store, &form, feature.bind("main")).unwrap();
//! assert!(!binding.pending());
//! ```

pub use formsync_bind as bind;
pub use formsync_core as core;
pub use formsync_runtime as runtime;
pub use formsync_widgets as widgets;

pub use formsync_bind::{
    BindError, FormBinding, PollOutcome, ReconcileReport, collect_errors, extract_value,
    reconcile,
};
pub use formsync_core::{
    CompareStrategy, ErrorEntry, ErrorMap, ErrorMapMode, FieldValue, Scalar, SliceKey,
    is_different,
};
pub use formsync_runtime::{
    Action, BindingConfig, ConfigError, DispatchOutcome, FeatureConfig, FormState, Store,
    SyncConfig, UpdatePayload, form_reducer, register_feature,
};
pub use formsync_widgets::{Control, FormArray, FormControl, FormGroup, FormHandle, Validator};

pub mod prelude {
    //! Glob-importable set of the common types.

    pub use crate::{
        Action, BindingConfig, CompareStrategy, Control, DispatchOutcome, ErrorMapMode,
        FeatureConfig, FieldValue, FormArray, FormBinding, FormControl, FormGroup, FormHandle,
        FormState, PollOutcome, SliceKey, Store, SyncConfig, UpdatePayload, Validator,
        register_feature,
    };
}
