#![forbid(unsafe_code)]

//! Centralized store holding every registered form.
//!
//! The [`Store`] owns a [`StoreState`] behind an [`Observable`], applies
//! [`Action`]s through a [`Reducer`], and notifies subscribers synchronously
//! after each applied action.
//!
//! # Invariants
//!
//! 1. Actions are applied one at a time. An action dispatched from inside a
//!    subscriber callback is queued and applied after the current round of
//!    notifications finishes ([`DispatchOutcome::Queued`]).
//! 2. An update addressed to an unregistered `(feature, path)` changes nothing
//!    and is reported as [`DispatchOutcome::Dropped`].
//! 3. Subscribers see a state only if it differs from the previous one.
//! 4. Registration never overwrites an existing form entry.
//! 5. A panic inside a reducer or subscriber ends the dispatch round. Actions
//!    queued during that round are dropped and later dispatches apply normally.

pub mod action;
pub mod reducer;
pub mod state;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use formsync_core::{FieldValue, SliceKey};

use crate::config::FeatureConfig;
use crate::reactive::{Observable, Subscription};

pub use action::{Action, DispatchOutcome};
pub use reducer::{FormReducer, Identity, Reducer, form_reducer};
pub use state::{DropReason, FeatureSlice, FormState, StoreState, UpdatePayload};

struct StoreInner {
    state: Observable<StoreState>,
    reducer: Box<dyn Reducer>,
    queue: RefCell<VecDeque<Action>>,
    dispatching: Cell<bool>,
    dispatched: Cell<u64>,
}

/// Marks a dispatch round in progress; ending it, normally or by unwinding,
/// reopens the store and discards anything still queued.
struct DispatchRound<'a> {
    inner: &'a StoreInner,
}

impl<'a> DispatchRound<'a> {
    fn begin(inner: &'a StoreInner) -> Self {
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl Drop for DispatchRound<'_> {
    fn drop(&mut self) {
        self.inner.dispatching.set(false);
        let discarded = std::mem::take(&mut *self.inner.queue.borrow_mut()).len();
        if discarded > 0 {
            tracing::warn!(discarded, "dispatch round aborted, queued actions dropped");
        }
    }
}

/// Single-threaded application store. Clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    /// A store that only understands form updates.
    #[must_use]
    pub fn new() -> Self {
        Self::with_reducer(form_reducer(Identity))
    }

    /// A store driven by `reducer`.
    ///
    /// Wrap application reducers with [`form_reducer`] so form updates are
    /// handled.
    #[must_use]
    pub fn with_reducer(reducer: impl Reducer + 'static) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: Observable::new(StoreState::new()),
                reducer: Box::new(reducer),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                dispatched: Cell::new(0),
            }),
        }
    }

    /// Seed every form declared by `feature` with [`FormState::initial`].
    ///
    /// Existing entries are kept.
    pub fn register_feature(&self, feature: &FeatureConfig) {
        self.inner.state.update(|state| {
            let mut next = state.with_feature(feature.name());
            for (path, initial) in feature.forms() {
                let key = SliceKey::new(feature.name(), path);
                if next.form(&key).is_none() {
                    next = next.with_form(&key, FormState::initial(initial.clone()));
                }
            }
            *state = next;
        });
        tracing::debug!(
            feature = feature.name(),
            forms = feature.forms().len(),
            "feature registered"
        );
    }

    /// Seed a single form. Returns `false` if it already existed.
    pub fn register_form(&self, key: &SliceKey, initial: FieldValue) -> bool {
        let mut inserted = false;
        self.inner.state.update(|state| {
            if state.form(key).is_none() {
                *state = state.with_form(key, FormState::initial(initial));
                inserted = true;
            }
        });
        inserted
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.inner.state.get()
    }

    /// Current form state at `key`.
    #[must_use]
    pub fn form_state(&self, key: &SliceKey) -> Option<Arc<FormState>> {
        self.inner.state.with(|state| state.form(key).cloned())
    }

    /// Current value at `key`.
    #[must_use]
    pub fn value(&self, key: &SliceKey) -> Option<FieldValue> {
        self.inner.state.with(|state| state.value(key).cloned())
    }

    /// Apply `action`.
    pub fn dispatch(&self, action: impl Into<Action>) -> DispatchOutcome {
        let action = action.into();
        if self.inner.dispatching.get() {
            tracing::trace!(kind = action.kind(), "dispatch queued");
            self.inner.queue.borrow_mut().push_back(action);
            return DispatchOutcome::Queued;
        }

        let _round = DispatchRound::begin(&self.inner);
        let outcome = self.apply(action);
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            match next {
                Some(queued) => {
                    self.apply(queued);
                }
                None => break,
            }
        }
        outcome
    }

    fn apply(&self, action: Action) -> DispatchOutcome {
        let _span = tracing::debug_span!("dispatch", kind = action.kind()).entered();
        let current = self.inner.state.get();
        let outcome = match &action {
            Action::UpdateForm(payload) => match current.check(&payload.key()) {
                Ok(()) => DispatchOutcome::Applied,
                Err(reason) => DispatchOutcome::Dropped(reason),
            },
            Action::Custom { .. } => DispatchOutcome::Applied,
        };
        let next = self.inner.reducer.reduce(current, &action);
        self.inner.dispatched.set(self.inner.dispatched.get() + 1);
        let changed = self.inner.state.set(next);
        tracing::debug!(?outcome, changed, "action reduced");
        outcome
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self, callback: impl Fn(&StoreState) + 'static) -> Subscription {
        self.inner.state.subscribe(callback)
    }

    /// Number of state changes published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.state.version()
    }

    /// Number of actions reduced so far.
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        self.inner.dispatched.get()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("features", &self.inner.state.with(StoreState::feature_count))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::register_feature;
    use serde_json::json;

    fn store() -> Store {
        let store = Store::new();
        store.register_feature(
            &register_feature("profile")
                .with_form("person", FieldValue::from(json!({"name": "a"}))),
        );
        store
    }

    fn update(name: &str) -> UpdatePayload {
        UpdatePayload::new(
            &SliceKey::new("profile", "person"),
            FormState::initial(FieldValue::from(json!({"name": name}))),
        )
    }

    #[test]
    fn registration_seeds_initial_state() {
        let store = store();
        let form = store.form_state(&SliceKey::new("profile", "person")).unwrap();
        assert_eq!(*form, FormState::initial(FieldValue::from(json!({"name": "a"}))));
    }

    #[test]
    fn registration_keeps_existing_entries() {
        let store = store();
        store.dispatch(update("b"));
        store.register_feature(
            &register_feature("profile").with_form("person", FieldValue::mapping()),
        );
        assert_eq!(
            store.value(&SliceKey::new("profile", "person")),
            Some(FieldValue::from(json!({"name": "b"})))
        );
        assert!(!store.register_form(&SliceKey::new("profile", "person"), FieldValue::mapping()));
        assert!(store.register_form(&SliceKey::new("profile", "other"), FieldValue::mapping()));
    }

    #[test]
    fn dispatch_applies_and_notifies() {
        let store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let key = SliceKey::new("profile", "person");
        let k = key.clone();
        let _sub = store.subscribe(move |state| {
            s.borrow_mut().push(state.value(&k).cloned());
        });

        assert_eq!(store.dispatch(update("b")), DispatchOutcome::Applied);
        assert_eq!(
            *seen.borrow(),
            vec![Some(FieldValue::from(json!({"name": "b"})))]
        );
    }

    #[test]
    fn dispatch_to_unknown_slice_is_reported() {
        let store = store();
        let version = store.version();
        let payload = UpdatePayload::new(&SliceKey::new("profile", "ghost"), FormState::default());
        let outcome = store.dispatch(payload);
        assert!(outcome.is_dropped());
        assert_eq!(store.version(), version);
    }

    #[test]
    fn reentrant_dispatch_is_queued() {
        let store = store();
        let inner = store.clone();
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&outcomes);
        let key = SliceKey::new("profile", "person");
        let _sub = store.subscribe(move |state| {
            if state.value(&key) == Some(&FieldValue::from(json!({"name": "b"}))) {
                o.borrow_mut().push(inner.dispatch(update("c")));
            }
        });

        assert_eq!(store.dispatch(update("b")), DispatchOutcome::Applied);
        assert_eq!(*outcomes.borrow(), vec![DispatchOutcome::Queued]);
        assert_eq!(
            store.value(&SliceKey::new("profile", "person")),
            Some(FieldValue::from(json!({"name": "c"})))
        );
        assert_eq!(store.dispatch_count(), 2);
    }

    #[test]
    fn dispatch_under_trace_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::new("formsync_runtime=trace"))
            .with_target(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let store = store();
            assert!(store.dispatch(update("b")).is_applied());
            assert!(store.dispatch(Action::custom("noop", FieldValue::null())).is_applied());
            let ghost = UpdatePayload::new(&SliceKey::new("nope", "x"), FormState::default());
            assert!(store.dispatch(ghost).is_dropped());
        });
    }

    #[test]
    fn store_recovers_after_subscriber_panic() {
        let store = store();
        let inner = store.clone();
        let key = SliceKey::new("profile", "person");
        let _sub = store.subscribe(move |state| {
            if state.value(&key) == Some(&FieldValue::from(json!({"name": "boom"}))) {
                inner.dispatch(update("queued"));
                panic!("subscriber failed");
            }
        });

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.dispatch(update("boom"));
        }));
        assert!(caught.is_err());

        assert_eq!(store.dispatch(update("c")), DispatchOutcome::Applied);
        assert_eq!(
            store.value(&SliceKey::new("profile", "person")),
            Some(FieldValue::from(json!({"name": "c"})))
        );
    }

    #[test]
    fn identical_update_does_not_notify() {
        let store = store();
        store.dispatch(update("b"));
        let version = store.version();
        assert!(store.dispatch(update("b")).is_applied());
        assert_eq!(store.version(), version);
    }
}
