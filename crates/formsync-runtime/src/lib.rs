#![forbid(unsafe_code)]

//! Store, reactive primitives, and scheduling for formsync.
//!
//! - [`reactive`]: `Observable`, `Subscription`, `BindingScope`, `SyncGuard`
//! - [`store`]: the keyed store of form state, its actions and reducers
//! - [`debounce`]: trailing-edge debouncer for settling widget edits
//! - [`clock`]: wall and manual time sources
//! - [`config`]: feature registration and sync settings

pub mod clock;
pub mod config;
pub mod debounce;
pub mod reactive;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    BindingConfig, ConfigError, FeatureConfig, LEGACY_DEBOUNCE, MIN_DEBOUNCE, SyncConfig,
    register_feature,
};
pub use debounce::{Debouncer, Settled};
pub use reactive::{BindingScope, Observable, Subscription, SyncGuard, SyncToken};
pub use store::{
    Action, DispatchOutcome, DropReason, FormReducer, FormState, Identity, Reducer, Store,
    StoreState, UpdatePayload, form_reducer,
};

/// Monotonic clock type used for debouncing.
pub use web_time::Instant;
