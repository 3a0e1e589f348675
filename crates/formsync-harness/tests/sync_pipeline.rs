#![forbid(unsafe_code)]

//! Integration tests: the store ⇄ form synchronization pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use formsync_bind::{BindError, FormBinding, PollOutcome};
use formsync_core::{CompareStrategy, ErrorMapMode, FieldValue, SliceKey};
use formsync_harness::{Fixture, assert_same_value};
use formsync_runtime::{
    DispatchOutcome, DropReason, FormState, LEGACY_DEBOUNCE, Store, SyncConfig, UpdatePayload,
    register_feature,
};
use formsync_widgets::{FormControl, FormGroup, FormHandle, Validator};
use proptest::prelude::*;
use serde_json::json;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

fn address_tree() -> FormGroup {
    FormGroup::new()
        .with_control("name", FormControl::new("").with_validators([Validator::Required]))
        .with_control(
            "address",
            FormGroup::new()
                .with_control(
                    "zip",
                    FormControl::new("").with_validators([Validator::MinLength(4)]),
                )
                .with_control("city", FormControl::new("")),
        )
}

// ============================================================================
// Tree → store
// ============================================================================

#[test]
fn no_edits_means_no_writes() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a", "tags": ["x", "y"]}))
        .build()
        .unwrap();
    for _ in 0..5 {
        assert!(matches!(fx.settle(), PollOutcome::Idle));
    }
    assert!(fx.updates().is_empty());
    assert_eq!(fx.binding.stats().dispatches, 0);
}

#[test]
fn name_edit_dispatches_one_update() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    assert!(matches!(fx.settle(), PollOutcome::Dispatched(DispatchOutcome::Applied)));

    let updates = fx.updates();
    assert_eq!(updates.len(), 1);
    let update = &updates[0];
    assert_eq!(update.key(), SliceKey::new("profile", "main"));
    assert_eq!(update.form.value.get("name"), Some(&FieldValue::from("b")));
    assert_same_value!(fx.store_value().unwrap(), json!({"name": "b"}));
}

#[test]
fn rapid_edits_collapse_into_final_value() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    assert!(matches!(fx.tick(100), PollOutcome::Idle));
    fx.edit(&["name"], "bo").unwrap();
    assert!(matches!(fx.tick(299), PollOutcome::Idle));
    fx.edit(&["name"], "bob").unwrap();
    assert!(matches!(fx.tick(299), PollOutcome::Idle));
    assert!(fx.tick(1).is_dispatched());

    let updates = fx.updates();
    assert_eq!(updates.len(), 1);
    assert_same_value!(updates[0].form.value.clone(), json!({"name": "bob"}));
    assert_eq!(fx.binding.stats().edits, 3);
}

#[test]
fn reverting_an_edit_writes_nothing() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    fx.edit(&["name"], "a").unwrap();
    assert!(matches!(fx.settle(), PollOutcome::Unchanged));
    assert!(fx.updates().is_empty());
}

#[test]
fn edit_to_nearby_float_is_dispatched() {
    let fx = Fixture::builder()
        .initial(json!({"id": 9_007_199_254_740_993_i64}))
        .build()
        .unwrap();
    fx.edit(&["id"], 9_007_199_254_740_992.0).unwrap();
    assert!(fx.binding.pending());
    assert!(fx.settle().is_dispatched());
    assert_eq!(
        fx.store_value().unwrap().get("id"),
        Some(&FieldValue::from(9_007_199_254_740_992.0))
    );
}

#[test]
fn flush_skips_the_window() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    assert!(fx.binding.pending());
    assert!(fx.binding.flush().is_dispatched());
    assert!(!fx.binding.pending());
    assert!(matches!(fx.binding.flush(), PollOutcome::Idle));
}

#[test]
fn update_carries_form_flags() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a", "address": {"zip": "0150", "city": "Oslo"}}))
        .tree(address_tree())
        .build()
        .unwrap();
    let before = fx.form_state().unwrap();
    assert_eq!(before.pristine, Some(true));
    assert_eq!(before.valid, Some(false));

    fx.edit(&["name"], "b").unwrap();
    fx.settle();
    let after = fx.form_state().unwrap();
    assert_eq!(after.pristine, Some(false));
    assert_eq!(after.valid, Some(true));
    assert!(after.errors.is_empty());
}

#[test]
fn nested_failure_is_reported_flat() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a", "address": {"zip": "0150", "city": "Oslo"}}))
        .tree(address_tree())
        .build()
        .unwrap();
    fx.edit(&["address", "zip"], "01").unwrap();
    fx.settle();

    let update = fx.updates().pop().unwrap();
    assert_eq!(update.form.valid, Some(false));
    assert_eq!(update.form.errors.keys().collect::<Vec<_>>(), ["zip"]);
    let zip = update.form.errors["zip"].as_field().unwrap();
    assert_same_value!(
        zip["minlength"].clone(),
        json!({"requiredLength": 4, "actualLength": 2})
    );
}

#[test]
fn nested_failure_is_namespaced_on_request() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a", "address": {"zip": "0150", "city": "Oslo"}}))
        .tree(address_tree())
        .sync(SyncConfig::default().with_error_map(ErrorMapMode::Namespaced))
        .build()
        .unwrap();
    fx.edit(&["address", "zip"], "01").unwrap();
    fx.settle();

    let state = fx.form_state().unwrap();
    let address = state.errors["address"].as_group().unwrap();
    assert!(address["zip"].as_field().unwrap().contains_key("minlength"));
    assert_eq!(
        serde_json::to_value(&state.errors).unwrap(),
        json!({"address": {"zip": {"minlength": {"requiredLength": 4, "actualLength": 2}}}})
    );
}

#[test]
fn legacy_window_waits_longer() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a"}))
        .sync(SyncConfig::legacy())
        .build()
        .unwrap();
    assert_eq!(fx.window(), LEGACY_DEBOUNCE);
    fx.edit(&["name"], "b").unwrap();
    assert!(matches!(fx.tick(300), PollOutcome::Idle));
    assert!(fx.tick(100).is_dispatched());
}

/// Reorder `a` after `b`, then edit `a` away and back so the form publishes
/// a value equal to the store's in content but not in key order.
fn reorder_and_touch(fx: &Fixture) {
    fx.form.with_group_mut(|root| {
        if let Some(a) = root.remove_control("a") {
            root.set_control("a", a);
        }
    });
    fx.edit(&["a"], 5).unwrap();
    fx.edit(&["a"], 1).unwrap();
    assert!(fx.binding.pending());
}

#[test]
fn serialized_compare_is_order_sensitive() {
    let fx = Fixture::builder()
        .initial(json!({"a": 1, "b": 2}))
        .sync(SyncConfig::default().with_compare(CompareStrategy::Serialized))
        .build()
        .unwrap();
    reorder_and_touch(&fx);
    assert!(fx.binding.flush().is_dispatched());
}

#[test]
fn structural_compare_ignores_order() {
    let fx = Fixture::builder().initial(json!({"a": 1, "b": 2})).build().unwrap();
    reorder_and_touch(&fx);
    assert!(matches!(fx.binding.flush(), PollOutcome::Unchanged));
}

// ============================================================================
// Store → tree
// ============================================================================

#[test]
fn store_write_reaches_form_without_echo() {
    let fx = Fixture::builder()
        .initial(json!({"name": "a", "tags": ["x"]}))
        .build()
        .unwrap();
    fx.store_write(json!({"name": "z", "tags": ["x", "y"]}));
    assert_same_value!(fx.form.value(), json!({"name": "z", "tags": ["x", "y"]}));
    assert!(!fx.binding.pending());
    assert!(matches!(fx.settle(), PollOutcome::Idle));
    assert_eq!(fx.updates().len(), 1, "only the external write");
}

#[test]
fn store_write_supersedes_pending_edit() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    fx.store_write(json!({"name": "z"}));
    assert!(matches!(fx.settle(), PollOutcome::Idle));
    assert_same_value!(fx.store_value().unwrap(), json!({"name": "z"}));
    assert_eq!(fx.binding.stats().superseded, 1);
}

#[test]
fn store_write_keeps_flags_when_absent() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.store_write(json!({"name": "z"}));
    let state = fx.form_state().unwrap();
    assert_eq!(state.pristine, Some(true));
    assert_eq!(state.valid, Some(false));
}

// ============================================================================
// Store and reducer
// ============================================================================

#[test]
fn update_preserves_identity_of_other_entries() {
    let feature = register_feature("profile")
        .with_form("main", FieldValue::mapping())
        .with_form("other", FieldValue::from(json!({"x": 1})));
    let billing = register_feature("billing").with_form("card", FieldValue::mapping());
    let store = Store::new();
    store.register_feature(&feature);
    store.register_feature(&billing);

    let before = store.state();
    store.dispatch(UpdatePayload::new(
        &SliceKey::new("profile", "main"),
        FormState::initial(FieldValue::from(json!({"name": "a"}))),
    ));
    let after = store.state();

    for key in [SliceKey::new("profile", "other"), SliceKey::new("billing", "card")] {
        let (Some(a), Some(b)) = (before.form(&key), after.form(&key)) else {
            panic!("{key} should exist");
        };
        assert!(Arc::ptr_eq(a, b), "{key} was reallocated");
    }
    let main = SliceKey::new("profile", "main");
    assert!(!Arc::ptr_eq(
        before.form(&main).unwrap(),
        after.form(&main).unwrap()
    ));
}

#[test]
fn update_to_unknown_slice_is_dropped() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    let before = fx.store.state();
    let outcome = fx.store.dispatch(UpdatePayload::new(
        &SliceKey::new("nope", "main"),
        FormState::default(),
    ));
    assert_eq!(
        outcome,
        DispatchOutcome::Dropped(DropReason::UnknownFeature("nope".into()))
    );
    assert_eq!(fx.store.state(), before);
}

#[test]
fn mount_against_unregistered_slice_fails() {
    let store = Store::new();
    let form = FormHandle::new(FormGroup::new());
    let err = FormBinding::mount(&store, &form, register_feature("profile").bind("main"))
        .unwrap_err();
    assert!(matches!(err, BindError::UnknownSlice(_)));
    assert_eq!(err.to_string(), "no form registered at 'profile::main'");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn teardown_is_idempotent_and_stops_both_flows() {
    let mut fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    fx.edit(&["name"], "b").unwrap();
    assert!(fx.binding.unmount());
    assert!(!fx.binding.unmount());
    assert!(fx.binding.is_closed());

    assert!(matches!(fx.settle(), PollOutcome::Closed));
    fx.edit(&["name"], "c").unwrap();
    assert!(!fx.binding.pending());
    fx.store_write(json!({"name": "z"}));
    assert_same_value!(fx.form.value(), json!({"name": "c"}));
    assert_eq!(fx.updates().len(), 1, "only the external write");
}

#[test]
fn dropping_binding_releases_subscriptions() {
    let fx = Fixture::builder().initial(json!({"name": "a"})).build().unwrap();
    let Fixture {
        store,
        form,
        binding,
        ..
    } = fx;
    drop(binding);
    form.set_text(&["name"], "b").unwrap();
    store.dispatch(UpdatePayload::new(
        &SliceKey::new("profile", "main"),
        FormState::initial(FieldValue::from(json!({"name": "z"}))),
    ));
    assert_same_value!(form.value(), json!({"name": "b"}));
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Clone, Default)]
struct WarnCounter {
    warnings: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn dropped_update_is_logged_at_warn() {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, || {
        let store = Store::new();
        store.dispatch(UpdatePayload::new(
            &SliceKey::new("ghost", "main"),
            FormState::default(),
        ));
    });
    assert_eq!(counter.warnings.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn edits_inside_window_collapse(
        mut texts in prop::collection::vec("[a-z]{1,6}", 1..8),
        gap in 0u64..300,
    ) {
        texts.dedup();
        let fx = Fixture::builder().initial(json!({"name": ""})).build().unwrap();
        for text in &texts {
            fx.edit(&["name"], text.as_str()).unwrap();
            prop_assert!(matches!(fx.tick(gap), PollOutcome::Idle));
        }
        fx.advance(Duration::from_secs(1));
        prop_assert!(fx.binding.poll().is_dispatched());

        let updates = fx.updates();
        prop_assert_eq!(updates.len(), 1);
        let last = texts.last().map(String::as_str).unwrap_or_default();
        prop_assert_eq!(updates[0].form.value.get("name"), Some(&FieldValue::from(last)));
    }
}
