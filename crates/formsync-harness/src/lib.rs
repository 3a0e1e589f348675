#![forbid(unsafe_code)]

//! Test fixtures for formsync.
//!
//! A [`Fixture`] wires one store, one registered feature, one form, and one
//! mounted binding driven by a [`ManualClock`]. Every action the store
//! reduces is recorded, so tests can assert on exactly what was dispatched.
//!
//! ```
//! use formsync_harness::Fixture;
//! use serde_json::json;
//!
//! let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
//! fx.edit(&["name"], "b").unwrap();
//! assert!(fx.settle().is_dispatched());
//! assert_eq!(fx.updates().len(), 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use formsync_bind::{BindError, FormBinding, PollOutcome};
use formsync_core::{FieldValue, SliceKey};
use formsync_runtime::{
    Action, FeatureConfig, FormState, ManualClock, Store, StoreState, SyncConfig, UpdatePayload,
    form_reducer, register_feature,
};
use formsync_widgets::{FormGroup, FormHandle, WidgetError};

/// Feature name used when the builder is not told otherwise.
pub const DEFAULT_FEATURE: &str = "profile";
/// Form path used when the builder is not told otherwise.
pub const DEFAULT_PATH: &str = "main";

/// Shared log of reduced actions.
#[derive(Clone, Debug, Default)]
pub struct ActionLog {
    actions: Rc<RefCell<Vec<Action>>>,
}

impl ActionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reducer records every action into this log.
    #[must_use]
    pub fn store(&self) -> Store {
        let log = self.clone();
        Store::with_reducer(form_reducer(move |state: StoreState, action: &Action| {
            log.actions.borrow_mut().push(action.clone());
            state
        }))
    }

    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.actions.borrow().clone()
    }

    /// Form updates only, in dispatch order.
    #[must_use]
    pub fn updates(&self) -> Vec<UpdatePayload> {
        self.actions
            .borrow()
            .iter()
            .filter_map(|action| match action {
                Action::UpdateForm(payload) => Some(payload.clone()),
                Action::Custom { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.actions.borrow_mut().clear();
    }
}

/// Builder for [`Fixture`].
#[derive(Debug)]
pub struct FixtureBuilder {
    feature: String,
    path: String,
    initial: FieldValue,
    tree: FormGroup,
    sync: SyncConfig,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self {
            feature: DEFAULT_FEATURE.to_owned(),
            path: DEFAULT_PATH.to_owned(),
            initial: FieldValue::mapping(),
            tree: FormGroup::new(),
            sync: SyncConfig::default(),
        }
    }
}

impl FixtureBuilder {
    #[must_use]
    pub fn feature(mut self, name: impl Into<String>) -> Self {
        self.feature = name.into();
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Value the store slice is seeded with.
    #[must_use]
    pub fn initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial = value.into();
        self
    }

    /// Form tree present before mounting (validators, extra controls).
    #[must_use]
    pub fn tree(mut self, tree: FormGroup) -> Self {
        self.tree = tree;
        self
    }

    #[must_use]
    pub fn sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Register the feature, build the form, and mount the binding.
    pub fn build(self) -> Result<Fixture, BindError> {
        let feature = register_feature(self.feature)
            .with_form(self.path.clone(), self.initial)
            .with_sync(self.sync);
        let log = ActionLog::new();
        let store = log.store();
        store.register_feature(&feature);

        let form = FormHandle::new(self.tree);
        let clock = ManualClock::new();
        let binding =
            FormBinding::mount_with_clock(&store, &form, feature.bind(self.path), clock.clone())?;
        Ok(Fixture {
            feature,
            store,
            form,
            clock,
            binding,
            log,
        })
    }
}

/// One bound form with a controllable clock.
#[derive(Debug)]
pub struct Fixture {
    pub feature: FeatureConfig,
    pub store: Store,
    pub form: FormHandle,
    pub clock: ManualClock,
    pub binding: FormBinding,
    log: ActionLog,
}

impl Fixture {
    #[must_use]
    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    #[must_use]
    pub fn key(&self) -> &SliceKey {
        self.binding.key()
    }

    /// The binding's debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.binding.sync().debounce
    }

    /// User edit of the leaf at `path`.
    pub fn edit(&self, path: &[&str], value: impl Into<FieldValue>) -> Result<(), WidgetError> {
        self.form.set_value_at(path, value)
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Advance by `ms` milliseconds and poll.
    pub fn tick(&self, ms: u64) -> PollOutcome {
        self.advance(Duration::from_millis(ms));
        self.binding.poll()
    }

    /// Advance by one full window and poll.
    pub fn settle(&self) -> PollOutcome {
        self.advance(self.window());
        self.binding.poll()
    }

    /// Write `value` into the bound slice as another store client would.
    pub fn store_write(&self, value: impl Into<FieldValue>) -> formsync_runtime::DispatchOutcome {
        self.store.dispatch(UpdatePayload::new(
            self.key(),
            FormState {
                value: value.into(),
                errors: Default::default(),
                pristine: None,
                valid: None,
            },
        ))
    }

    /// Current store value of the bound slice.
    #[must_use]
    pub fn store_value(&self) -> Option<FieldValue> {
        self.store.value(self.key())
    }

    #[must_use]
    pub fn form_state(&self) -> Option<FormState> {
        self.store.form_state(self.key()).map(|state| (*state).clone())
    }

    /// Form updates reduced so far, in order.
    #[must_use]
    pub fn updates(&self) -> Vec<UpdatePayload> {
        self.log.updates()
    }

    #[must_use]
    pub fn log(&self) -> &ActionLog {
        &self.log
    }
}

/// Compare two values structurally and panic with both sides on mismatch.
#[macro_export]
macro_rules! assert_same_value {
    ($left:expr, $right:expr $(,)?) => {{
        let left: $crate::__private::FieldValue = ($left).into();
        let right: $crate::__private::FieldValue = ($right).into();
        if !$crate::__private::deep_eq(&left, &right) {
            panic!("values differ\n  left: {left}\n right: {right}");
        }
    }};
}

#[doc(hidden)]
pub mod __private {
    pub use formsync_core::{FieldValue, deep_eq};
}
