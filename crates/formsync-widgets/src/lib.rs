#![forbid(unsafe_code)]

//! Form widget tree for formsync.
//!
//! A form is a [`FormGroup`] of named [`Control`]s. Each control is a leaf
//! ([`FormControl`]), a nested group, or an ordered [`FormArray`]. Leaves run
//! their [`Validator`]s whenever their value changes. [`FormHandle`] wraps a
//! root group with a value-changed stream and the tracked `pristine`/`valid`
//! flags the synchronization layer reads.

pub mod control;
pub mod handle;
pub mod validators;

pub use control::{Control, ControlKind, FormArray, FormControl, FormGroup, WidgetError};
pub use handle::FormHandle;
pub use validators::Validator;
