#![forbid(unsafe_code)]

//! Lifecycle and re-entrancy helpers for reactive bindings.
//!
//! A [`BindingScope`] collects the subscriptions of one logical binding (for
//! example, one mounted form) so they can be released together. A
//! [`SyncGuard`] marks "this flow is currently writing" so the opposite flow
//! can ignore the echo of that write.
//!
//! # Usage
//!
//! ```ignore
//! let mut scope = BindingScope::new();
//! let guard = SyncGuard::new();
//!
//! let g = guard.clone();
//! scope.subscribe(&store_value, move |v| {
//!     let _writing = g.enter();
//!     tree.set(v.clone());
//! });
//! let g = guard.clone();
//! scope.subscribe(&tree, move |v| {
//!     if g.is_active() {
//!         return; // echo of our own write
//!     }
//!     forward(v);
//! });
//!
//! scope.close(); // both callbacks are gone
//! ```
//!
//! # Invariants
//!
//! 1. Subscriptions are released in reverse registration order.
//! 2. After `close()` no callback registered through the scope fires.
//! 3. `close()` is idempotent; a closed scope rejects new subscriptions.
//! 4. `SyncGuard` nesting is counted: the guard stays active until the
//!    outermost [`SyncToken`] drops.

use std::cell::Cell;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

// ---------------------------------------------------------------------------
// BindingScope
// ---------------------------------------------------------------------------

/// Owns the subscriptions of one binding.
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
    closed: bool,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            closed: false,
        }
    }

    /// Keep `sub` alive until the scope closes.
    ///
    /// Returns `false` (and drops `sub` immediately) if the scope is closed.
    pub fn hold(&mut self, sub: Subscription) -> bool {
        if self.closed {
            return false;
        }
        self.subscriptions.push(sub);
        true
    }

    /// Subscribe to `source` for the lifetime of the scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        if !self.closed {
            self.subscriptions.push(source.subscribe(callback));
        }
        self
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release every subscription and refuse new ones.
    ///
    /// Returns `true` on the first call, `false` afterwards.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        while let Some(sub) = self.subscriptions.pop() {
            drop(sub);
        }
        true
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .field("closed", &self.closed)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SyncGuard
// ---------------------------------------------------------------------------

/// Shared "a flow is writing" flag. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct SyncGuard {
    depth: Rc<Cell<u32>>,
}

impl SyncGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the guard active until the returned token drops.
    #[must_use = "the guard is released when the token drops"]
    pub fn enter(&self) -> SyncToken {
        self.depth.set(self.depth.get() + 1);
        SyncToken {
            depth: Rc::clone(&self.depth),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }
}

/// RAII token returned by [`SyncGuard::enter`].
#[must_use = "the guard is released when the token drops"]
#[derive(Debug)]
pub struct SyncToken {
    depth: Rc<Cell<u32>>,
}

impl Drop for SyncToken {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
