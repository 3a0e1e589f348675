#![forbid(unsafe_code)]

//! Store value → widget tree reconciliation.
//!
//! Reconciliation runs in two passes, composed by [`reconcile`]:
//!
//! 1. [`rebuild_structure`] walks the store value and makes the tree's shape
//!    match it: sequences become freshly built [`FormArray`]s, mappings are
//!    descended into (or built if missing), and scalar keys that have no
//!    control yet get an empty leaf.
//! 2. [`apply_scalars`] bulk-patches every leaf reachable from the value in
//!    one go, revalidating each one.
//!
//! Pass 1 must finish before pass 2, otherwise the patch would target the
//! old structure.
//!
//! # Invariants
//!
//! 1. Controls whose key is absent from the value are never removed.
//! 2. An array whose current value already equals the incoming sequence is
//!    kept as is (no rebuild, validators and dirty state survive).
//! 3. Reconciling the value a tree already holds reports zero structural
//!    changes.
//! 4. For a tree built from scratch, `tree.value()` afterwards equals the
//!    reconciled value.

use formsync_core::{FieldValue, Fields, deep_eq};
use formsync_widgets::{Control, FormArray, FormGroup};

/// What a reconciliation did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Arrays replaced by a fresh build.
    pub arrays_rebuilt: usize,
    /// Groups built because none (or a non-group) sat at the key.
    pub groups_created: usize,
    /// Empty leaves added for scalar keys.
    pub leaves_created: usize,
    /// Leaves written by the bulk patch.
    pub leaves_patched: usize,
    /// The value was not a mapping and was ignored.
    pub ignored_root: bool,
}

impl ReconcileReport {
    /// Number of controls added or replaced.
    #[must_use]
    pub fn structural_changes(&self) -> usize {
        self.arrays_rebuilt + self.groups_created + self.leaves_created
    }
}

/// Bring `tree` in line with `value`: rebuild structure, then patch scalars.
pub fn reconcile(value: &FieldValue, tree: &mut FormGroup) -> ReconcileReport {
    let FieldValue::Mapping(fields) = value else {
        return ReconcileReport {
            ignored_root: true,
            ..ReconcileReport::default()
        };
    };
    let mut report = rebuild_structure(tree, fields);
    report.leaves_patched = apply_scalars(tree, value);
    report
}

/// Pass 1: make the tree's shape match `fields`.
pub fn rebuild_structure(tree: &mut FormGroup, fields: &Fields) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    rebuild_into(tree, fields, &mut report);
    report
}

fn rebuild_into(tree: &mut FormGroup, fields: &Fields, report: &mut ReconcileReport) {
    for (key, value) in fields {
        match value {
            FieldValue::Sequence(items) => {
                let unchanged = tree
                    .get(key)
                    .and_then(Control::as_array)
                    .is_some_and(|array| deep_eq(&array.value(), value));
                if !unchanged {
                    tree.set_control(key.clone(), build_array(items));
                    report.arrays_rebuilt += 1;
                }
            }
            FieldValue::Mapping(inner) => match tree.get_mut(key) {
                Some(Control::Group(group)) => rebuild_into(group, inner, report),
                _ => {
                    tree.set_control(key.clone(), build_group(inner));
                    report.groups_created += 1;
                }
            },
            FieldValue::Scalar(_) => {
                if tree.add_control(key.clone(), Control::leaf(FieldValue::null())) {
                    report.leaves_created += 1;
                }
            }
        }
    }
}

/// Pass 2: bulk value-apply. Returns the number of leaves written.
pub fn apply_scalars(tree: &mut FormGroup, value: &FieldValue) -> usize {
    tree.patch_value(value)
}

/// Build a control for any value.
#[must_use]
pub fn build_control(value: &FieldValue) -> Control {
    match value {
        FieldValue::Scalar(_) => Control::leaf(value.clone()),
        FieldValue::Sequence(items) => build_array(items).into(),
        FieldValue::Mapping(fields) => build_group(fields).into(),
    }
}

/// Build an array. Mapping elements become groups, scalar elements become
/// directly addressable leaves, nested sequences recurse.
#[must_use]
pub fn build_array(items: &[FieldValue]) -> FormArray {
    let mut array = FormArray::new();
    for item in items {
        array.push(build_control(item));
    }
    array
}

/// Build a group, child by child.
#[must_use]
pub fn build_group(fields: &Fields) -> FormGroup {
    fields
        .iter()
        .fold(FormGroup::new(), |group, (key, value)| {
            group.with_control(key.clone(), build_control(value))
        })
}

/// Plain value of a tree.
#[must_use]
pub fn extract_value(tree: &FormGroup) -> FieldValue {
    tree.value()
}
