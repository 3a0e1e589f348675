#![forbid(unsafe_code)]

//! Reactive primitives used by the store and the widget tree.
//!
//! - [`Observable`]: a shared, version-tracked value with change callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BindingScope`]: owns every subscription of one binding.
//! - [`SyncGuard`]: re-entrancy flag that lets one flow ignore the echo of
//!   the other.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` callbacks and pruned lazily
//! during notification, so dropping a `Subscription` is enough to detach.

pub mod observable;
pub mod scope;

pub use observable::{Observable, Subscription};
pub use scope::{BindingScope, SyncGuard, SyncToken};
