#![forbid(unsafe_code)]

//! Bidirectional binding between one store slice and one form.
//!
//! A [`FormBinding`] runs two flows:
//!
//! - **store → form**: every store emission whose `(feature, path)` entry
//!   changed is reconciled into the form tree. The write happens inside a
//!   [`SyncGuard`], so the form's change stream does not feed it back.
//! - **form → store**: every user edit is pushed into a [`Debouncer`]. Once
//!   the edit settles ([`poll`](FormBinding::poll) after the quiet window, or
//!   [`flush`](FormBinding::flush)), the value is compared with the live
//!   store value and dispatched as an [`UpdatePayload`] only if it differs.
//!
//! # Invariants
//!
//! 1. A store-driven tree write never schedules a store write.
//! 2. A store write to this slice supersedes any edit still waiting in the
//!    debouncer; the pending edit is discarded.
//! 3. No dispatch happens when the settled value equals the live store value.
//! 4. After [`unmount`](FormBinding::unmount) neither flow touches the store
//!    or the form again. Unmounting twice is a no-op.
//!
//! # Example
//!
//! ```
//! use formsync_bind::{FormBinding, PollOutcome, register_feature};
//! use formsync_core::FieldValue;
//! use formsync_runtime::{ManualClock, Store};
//! use formsync_widgets::{FormGroup, FormHandle};
//! use std::time::Duration;
//!
//! let feature = register_feature("profile").with_form("main", serde_json::json!({"name": "a"}));
//! let store = Store::new();
//! store.register_feature(&feature);
//!
//! let form = FormHandle::new(FormGroup::new());
//! let clock = ManualClock::new();
//! let binding = FormBinding::mount_with_clock(&store, &form, feature.bind("main"), clock.clone()).unwrap();
//! assert_eq!(form.value(), FieldValue::from(serde_json::json!({"name": "a"})));
//!
//! form.set_text(&["name"], "b").unwrap();
//! clock.advance(Duration::from_millis(300));
//! assert!(matches!(binding.poll(), PollOutcome::Dispatched(_)));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use formsync_core::validation::failing_fields;
use formsync_core::{CompareError, FieldValue, SliceKey};
use formsync_runtime::{
    BindingConfig, BindingScope, Clock, ConfigError, Debouncer, DispatchOutcome, FormState,
    Instant, Settled, Store, StoreState, SyncConfig, SyncGuard, SystemClock, UpdatePayload,
};
use formsync_widgets::FormHandle;

use crate::errors::collect_errors;
use crate::reconcile::reconcile;

/// Errors from [`FormBinding::mount`].
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("no form registered at '{0}'")]
    UnknownSlice(SliceKey),
    #[error("invalid binding config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result of [`FormBinding::poll`] and [`FormBinding::flush`].
#[derive(Debug)]
pub enum PollOutcome {
    /// No settled edit.
    Idle,
    /// The settled value equals the store value; nothing dispatched.
    Unchanged,
    /// An update was dispatched.
    Dispatched(DispatchOutcome),
    /// The values could not be compared; nothing dispatched.
    CompareFailed(CompareError),
    /// The binding is unmounted.
    Closed,
}

impl PollOutcome {
    #[must_use]
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }
}

/// Counters for one binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindingStats {
    /// Store values reconciled into the form.
    pub store_syncs: u64,
    /// User edits observed.
    pub edits: u64,
    /// Edits discarded because the store wrote first.
    pub superseded: u64,
    /// Updates dispatched.
    pub dispatches: u64,
    /// Settled edits that matched the store.
    pub unchanged: u64,
}

struct Shared {
    key: SliceKey,
    sync: SyncConfig,
    store: Store,
    form: FormHandle,
    guard: SyncGuard,
    debouncer: RefCell<Debouncer<FieldValue>>,
    clock: Rc<dyn Clock>,
    last_applied: RefCell<Option<Arc<FormState>>>,
    closed: Cell<bool>,
    stats: Cell<BindingStats>,
}

impl Shared {
    fn bump(&self, f: impl FnOnce(&mut BindingStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn on_store(&self, state: &StoreState) {
        if self.closed.get() {
            return;
        }
        let Some(entry) = state.form(&self.key) else {
            tracing::warn!(key = %self.key, "bound form missing from store");
            return;
        };
        let seen = self
            .last_applied
            .borrow()
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, entry));
        if seen {
            return;
        }
        *self.last_applied.borrow_mut() = Some(Arc::clone(entry));

        let span = tracing::debug_span!(
            "reconcile",
            feature = %self.key.feature,
            path = %self.key.path
        );
        let _enter = span.enter();
        let _token = self.guard.enter();
        let report = self.form.with_group_mut(|root| reconcile(&entry.value, root));
        self.bump(|s| s.store_syncs += 1);
        tracing::debug!(
            structural_changes = report.structural_changes(),
            leaves_patched = report.leaves_patched,
            ignored_root = report.ignored_root,
            "store value applied"
        );
    }

    fn on_form(&self, value: &FieldValue) {
        if self.closed.get() {
            return;
        }
        if self.guard.is_active() {
            if self.debouncer.borrow_mut().cancel() {
                self.bump(|s| s.superseded += 1);
                tracing::debug!(key = %self.key, "pending edit superseded by store");
            }
            return;
        }
        self.debouncer
            .borrow_mut()
            .push(value.clone(), self.clock.now());
        self.bump(|s| s.edits += 1);
    }

    fn commit(&self, settled: Settled<FieldValue>) -> PollOutcome {
        let span = tracing::debug_span!(
            "commit",
            feature = %self.key.feature,
            path = %self.key.path,
            coalesced = settled.coalesced
        );
        let _enter = span.enter();

        if let Some(live) = self.store.value(&self.key) {
            match self.sync.compare.is_different(&settled.value, &live) {
                Ok(false) => {
                    self.bump(|s| s.unchanged += 1);
                    tracing::trace!("settled edit matches store");
                    return PollOutcome::Unchanged;
                }
                Ok(true) => {}
                Err(err) => {
                    tracing::error!(error = %err, "cannot compare settled edit");
                    return PollOutcome::CompareFailed(err);
                }
            }
        }

        let errors = self
            .form
            .with_group(|root| collect_errors(root, self.sync.error_map));
        let failing = failing_fields(&errors);
        let form = FormState {
            value: settled.value,
            errors,
            pristine: Some(self.form.pristine()),
            valid: Some(self.form.valid()),
        };
        let outcome = self.store.dispatch(UpdatePayload::new(&self.key, form));
        self.bump(|s| s.dispatches += 1);
        tracing::debug!(?outcome, failing, "update dispatched");
        PollOutcome::Dispatched(outcome)
    }
}

/// Live link between a store slice and a form. Unmounts on drop.
pub struct FormBinding {
    shared: Rc<Shared>,
    scope: BindingScope,
}

impl FormBinding {
    /// Bind `form` to the slice named by `config`, reading time from the wall
    /// clock.
    pub fn mount(store: &Store, form: &FormHandle, config: BindingConfig) -> Result<Self, BindError> {
        Self::mount_with_clock(store, form, config, SystemClock)
    }

    /// Bind with an explicit time source.
    ///
    /// The store value is reconciled into the form before this returns.
    pub fn mount_with_clock(
        store: &Store,
        form: &FormHandle,
        config: BindingConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, BindError> {
        config.validate()?;
        let BindingConfig { key, sync } = config;
        if store.form_state(&key).is_none() {
            return Err(BindError::UnknownSlice(key));
        }

        let shared = Rc::new(Shared {
            debouncer: RefCell::new(Debouncer::new(sync.debounce)),
            key,
            sync,
            store: store.clone(),
            form: form.clone(),
            guard: SyncGuard::new(),
            clock: Rc::new(clock),
            last_applied: RefCell::new(None),
            closed: Cell::new(false),
            stats: Cell::new(BindingStats::default()),
        });

        let mut scope = BindingScope::new();
        let s = Rc::clone(&shared);
        scope.hold(store.subscribe(move |state| s.on_store(state)));
        let s = Rc::clone(&shared);
        scope.hold(form.subscribe(move |value| s.on_form(value)));

        shared.on_store(&store.state());
        tracing::debug!(key = %shared.key, "binding mounted");
        Ok(Self { shared, scope })
    }

    #[must_use]
    pub fn key(&self) -> &SliceKey {
        &self.shared.key
    }

    #[must_use]
    pub fn sync(&self) -> &SyncConfig {
        &self.shared.sync
    }

    /// Dispatch the pending edit if it has settled by the clock's `now`.
    pub fn poll(&self) -> PollOutcome {
        self.poll_at(self.shared.clock.now())
    }

    /// Dispatch the pending edit if it has settled by `now`.
    pub fn poll_at(&self, now: Instant) -> PollOutcome {
        if self.is_closed() {
            return PollOutcome::Closed;
        }
        let settled = self.shared.debouncer.borrow_mut().poll(now);
        settled.map_or(PollOutcome::Idle, |s| self.shared.commit(s))
    }

    /// Dispatch the pending edit now, without waiting for the window.
    pub fn flush(&self) -> PollOutcome {
        if self.is_closed() {
            return PollOutcome::Closed;
        }
        let settled = self.shared.debouncer.borrow_mut().flush();
        settled.map_or(PollOutcome::Idle, |s| self.shared.commit(s))
    }

    /// Whether an edit is waiting to settle.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.shared.debouncer.borrow().is_pending()
    }

    /// When the pending edit settles, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.shared.debouncer.borrow().deadline()
    }

    #[must_use]
    pub fn stats(&self) -> BindingStats {
        self.shared.stats.get()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    /// Stop both flows and drop any pending edit.
    ///
    /// Returns `true` on the first call, `false` afterwards.
    pub fn unmount(&mut self) -> bool {
        if self.shared.closed.replace(true) {
            return false;
        }
        self.shared.debouncer.borrow_mut().cancel();
        self.scope.close();
        self.shared.last_applied.borrow_mut().take();
        tracing::debug!(key = %self.shared.key, "binding unmounted");
        true
    }
}

impl Drop for FormBinding {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for FormBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBinding")
            .field("key", &self.shared.key)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}
