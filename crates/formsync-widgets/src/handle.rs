#![forbid(unsafe_code)]

//! Shared handle to a live form.
//!
//! [`FormHandle`] is what the UI layer owns and what bindings attach to. It
//! wraps the root [`FormGroup`] and publishes the form's value on an
//! [`Observable`] after every mutation that goes through the handle.
//!
//! # Invariants
//!
//! 1. Subscribers see the form value only after the mutation is complete; no
//!    borrow of the tree is held while they run, so they may read the handle.
//! 2. A mutation that leaves the value unchanged publishes nothing.
//! 3. `pristine()`/`valid()` are computed from the tree on every call.

use std::cell::RefCell;
use std::rc::Rc;

use formsync_core::{FieldValue, Scalar};
use formsync_runtime::{Observable, Subscription};

use crate::control::{Control, FormGroup, WidgetError};

/// Shared, observable form root. Clones refer to the same form.
#[derive(Clone)]
pub struct FormHandle {
    root: Rc<RefCell<FormGroup>>,
    changes: Observable<FieldValue>,
}

impl FormHandle {
    #[must_use]
    pub fn new(root: FormGroup) -> Self {
        let value = root.value();
        Self {
            root: Rc::new(RefCell::new(root)),
            changes: Observable::new(value),
        }
    }

    /// Current form value.
    #[must_use]
    pub fn value(&self) -> FieldValue {
        self.root.borrow().value()
    }

    #[must_use]
    pub fn pristine(&self) -> bool {
        self.root.borrow().is_pristine()
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.borrow().is_valid()
    }

    /// Read the tree.
    pub fn with_group<R>(&self, f: impl FnOnce(&FormGroup) -> R) -> R {
        f(&self.root.borrow())
    }

    /// Mutate the tree, then publish the new value.
    pub fn with_group_mut<R>(&self, f: impl FnOnce(&mut FormGroup) -> R) -> R {
        let out = f(&mut self.root.borrow_mut());
        self.publish();
        out
    }

    /// User edit of the leaf at `path`: sets the value, marks it dirty, and
    /// revalidates.
    pub fn set_value_at(&self, path: &[&str], value: impl Into<FieldValue>) -> Result<(), WidgetError> {
        let value = value.into();
        {
            let mut root = self.root.borrow_mut();
            match root.find_mut(path) {
                Some(Control::Leaf(leaf)) => {
                    leaf.edit(value);
                }
                Some(_) => return Err(WidgetError::NotALeaf(path.join("."))),
                None => return Err(WidgetError::NoSuchControl(path.join("."))),
            }
        }
        tracing::trace!(path = %path.join("."), "leaf edited");
        self.publish();
        Ok(())
    }

    /// Convenience for text edits.
    pub fn set_text(&self, path: &[&str], text: &str) -> Result<(), WidgetError> {
        self.set_value_at(path, FieldValue::Scalar(Scalar::Text(text.to_owned())))
    }

    /// Bulk value-apply over the whole tree. Returns leaves written.
    pub fn patch_value(&self, value: &FieldValue) -> usize {
        self.with_group_mut(|root| root.patch_value(value))
    }

    pub fn mark_as_pristine(&self) {
        self.root.borrow_mut().mark_as_pristine();
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self, callback: impl Fn(&FieldValue) + 'static) -> Subscription {
        self.changes.subscribe(callback)
    }

    /// Number of published value changes.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.changes.version()
    }

    fn publish(&self) {
        let value = self.root.borrow().value();
        self.changes.set(value);
    }
}

impl std::fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle")
            .field("value", &self.value())
            .field("version", &self.version())
            .finish()
    }
}
