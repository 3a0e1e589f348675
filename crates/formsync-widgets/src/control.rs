//! Controls: the nodes of a form widget tree.
//!
//! # Invariants
//!
//! 1. A leaf's `errors` always reflect its validators applied to its current
//!    value; every value change revalidates.
//! 2. A group or array is pristine iff every descendant leaf is pristine, and
//!    valid iff no descendant leaf has errors.
//! 3. `value()` of a group is a mapping in child order; of an array, a
//!    sequence in index order.
//! 4. Bulk patching never adds or removes controls; it only sets values of
//!    controls that already exist.

use formsync_core::{FieldErrors, FieldValue, Fields};
use indexmap::IndexMap;

use crate::validators::{Validator, run_all};

/// Errors from addressing controls by path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("no control at '{0}'")]
    NoSuchControl(String),
    #[error("control at '{0}' is not a leaf")]
    NotALeaf(String),
}

/// Shape of a control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Leaf,
    Group,
    Array,
}

// ---------------------------------------------------------------------------
// FormControl
// ---------------------------------------------------------------------------

/// Leaf control holding one value.
#[derive(Clone, Debug, Default)]
pub struct FormControl {
    value: FieldValue,
    validators: Vec<Validator>,
    errors: FieldErrors,
    dirty: bool,
}

impl FormControl {
    #[must_use]
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Attach validators and validate the current value.
    #[must_use]
    pub fn with_validators(mut self, validators: impl IntoIterator<Item = Validator>) -> Self {
        self.validators.extend(validators);
        self.revalidate();
        self
    }

    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Active failures; empty when valid.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    #[must_use]
    pub fn is_pristine(&self) -> bool {
        !self.dirty
    }

    /// Programmatic write: revalidates, does not touch pristine.
    /// Returns whether the value changed.
    pub fn set_value(&mut self, value: FieldValue) -> bool {
        let changed = self.value != value;
        self.value = value;
        self.revalidate();
        changed
    }

    /// User write: like [`set_value`](Self::set_value) and marks the leaf dirty.
    pub fn edit(&mut self, value: FieldValue) -> bool {
        self.dirty = true;
        self.set_value(value)
    }

    pub fn mark_as_pristine(&mut self) {
        self.dirty = false;
    }

    fn revalidate(&mut self) {
        self.errors = run_all(&self.validators, &self.value);
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// Any node of the widget tree.
#[derive(Clone, Debug)]
pub enum Control {
    Leaf(FormControl),
    Group(FormGroup),
    Array(FormArray),
}

impl Control {
    /// A leaf with no validators.
    #[must_use]
    pub fn leaf(value: impl Into<FieldValue>) -> Self {
        Self::Leaf(FormControl::new(value))
    }

    #[must_use]
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Leaf(_) => ControlKind::Leaf,
            Self::Group(_) => ControlKind::Group,
            Self::Array(_) => ControlKind::Array,
        }
    }

    #[must_use]
    pub fn value(&self) -> FieldValue {
        match self {
            Self::Leaf(c) => c.value().clone(),
            Self::Group(g) => g.value(),
            Self::Array(a) => a.value(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Leaf(c) => !c.has_errors(),
            Self::Group(g) => g.is_valid(),
            Self::Array(a) => a.is_valid(),
        }
    }

    #[must_use]
    pub fn is_pristine(&self) -> bool {
        match self {
            Self::Leaf(c) => c.is_pristine(),
            Self::Group(g) => g.is_pristine(),
            Self::Array(a) => a.is_pristine(),
        }
    }

    pub fn mark_as_pristine(&mut self) {
        match self {
            Self::Leaf(c) => c.mark_as_pristine(),
            Self::Group(g) => g.mark_as_pristine(),
            Self::Array(a) => a.mark_as_pristine(),
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&FormControl> {
        match self {
            Self::Leaf(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&FormGroup> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut FormGroup> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&FormArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    fn child(&self, segment: &str) -> Option<&Control> {
        match self {
            Self::Group(g) => g.get(segment),
            Self::Array(a) => segment.parse().ok().and_then(|i| a.get(i)),
            Self::Leaf(_) => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Control> {
        match self {
            Self::Group(g) => g.get_mut(segment),
            Self::Array(a) => segment.parse().ok().and_then(|i| a.get_mut(i)),
            Self::Leaf(_) => None,
        }
    }

    /// Bulk value-apply. Returns the number of leaves written.
    pub fn patch_value(&mut self, value: &FieldValue) -> usize {
        match (self, value) {
            (Self::Leaf(c), v) => {
                c.set_value(v.clone());
                1
            }
            (Self::Group(g), FieldValue::Mapping(_)) => g.patch_value(value),
            (Self::Array(a), FieldValue::Sequence(_)) => a.patch_value(value),
            _ => 0,
        }
    }
}

impl From<FormControl> for Control {
    fn from(c: FormControl) -> Self {
        Self::Leaf(c)
    }
}

impl From<FormGroup> for Control {
    fn from(g: FormGroup) -> Self {
        Self::Group(g)
    }
}

impl From<FormArray> for Control {
    fn from(a: FormArray) -> Self {
        Self::Array(a)
    }
}

// ---------------------------------------------------------------------------
// FormGroup
// ---------------------------------------------------------------------------

/// Named children in insertion order.
#[derive(Clone, Debug, Default)]
pub struct FormGroup {
    controls: IndexMap<String, Control>,
}

impl FormGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_control`](Self::set_control).
    #[must_use]
    pub fn with_control(mut self, name: impl Into<String>, control: impl Into<Control>) -> Self {
        self.set_control(name, control);
        self
    }

    /// Add `control` unless a child with that name exists.
    /// Returns whether it was added.
    pub fn add_control(&mut self, name: impl Into<String>, control: impl Into<Control>) -> bool {
        let name = name.into();
        if self.controls.contains_key(&name) {
            return false;
        }
        self.controls.insert(name, control.into());
        true
    }

    /// Insert or replace the child `name`, keeping its position if it existed.
    pub fn set_control(&mut self, name: impl Into<String>, control: impl Into<Control>) {
        self.controls.insert(name.into(), control.into());
    }

    pub fn remove_control(&mut self, name: &str) -> Option<Control> {
        self.controls.shift_remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.controls.contains_key(name)
    }

    /// Find a descendant by path. Numeric segments index into arrays.
    #[must_use]
    pub fn find(&self, path: &[&str]) -> Option<&Control> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.get(first)?, |node, segment| node.child(segment))
    }

    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut Control> {
        let (first, rest) = path.split_first()?;
        let mut node = self.get_mut(first)?;
        for segment in rest {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    pub fn controls(&self) -> impl Iterator<Item = (&str, &Control)> {
        self.controls.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    #[must_use]
    pub fn value(&self) -> FieldValue {
        FieldValue::Mapping(
            self.controls
                .iter()
                .map(|(k, c)| (k.clone(), c.value()))
                .collect::<Fields>(),
        )
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.controls.values().all(Control::is_valid)
    }

    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.controls.values().all(Control::is_pristine)
    }

    pub fn mark_as_pristine(&mut self) {
        self.controls.values_mut().for_each(Control::mark_as_pristine);
    }

    /// Bulk value-apply: set every leaf named in `value` that exists here.
    /// Unknown keys and shape mismatches are skipped.
    pub fn patch_value(&mut self, value: &FieldValue) -> usize {
        let Some(fields) = value.as_mapping() else {
            return 0;
        };
        fields
            .iter()
            .filter_map(|(k, v)| self.controls.get_mut(k).map(|c| c.patch_value(v)))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// FormArray
// ---------------------------------------------------------------------------

/// Ordered children.
#[derive(Clone, Debug, Default)]
pub struct FormArray {
    controls: Vec<Control>,
}

impl FormArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An array of leaves, one per scalar.
    #[must_use]
    pub fn of_values(values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self {
            controls: values.into_iter().map(Control::leaf).collect(),
        }
    }

    pub fn push(&mut self, control: impl Into<Control>) {
        self.controls.push(control.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<Control> {
        (index < self.controls.len()).then(|| self.controls.remove(index))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Control> {
        self.controls.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Control> {
        self.controls.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    #[must_use]
    pub fn value(&self) -> FieldValue {
        FieldValue::Sequence(self.controls.iter().map(Control::value).collect())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.controls.iter().all(Control::is_valid)
    }

    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.controls.iter().all(Control::is_pristine)
    }

    pub fn mark_as_pristine(&mut self) {
        self.controls.iter_mut().for_each(Control::mark_as_pristine);
    }

    /// Patch by index; extra incoming elements are ignored.
    pub fn patch_value(&mut self, value: &FieldValue) -> usize {
        let Some(items) = value.as_sequence() else {
            return 0;
        };
        self.controls
            .iter_mut()
            .zip(items)
            .map(|(c, v)| c.patch_value(v))
            .sum()
    }
}
