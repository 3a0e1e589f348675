#![forbid(unsafe_code)]

//! Core types for formsync.
//!
//! This crate provides:
//! - [`FieldValue`] / [`Scalar`]: the tagged value model shared by the store
//!   and the widget tree
//! - [`compare`]: the change detector that gates store writes
//! - [`validation`]: validation failures as data ([`ErrorMap`])
//! - [`SliceKey`]: the `(feature, path)` address of one field-group

pub mod compare;
pub mod key;
pub mod validation;
pub mod value;

pub use compare::{CompareError, CompareStrategy, deep_eq, is_different, is_different_serialized};
pub use key::SliceKey;
pub use validation::{ErrorEntry, ErrorMap, ErrorMapMode, FieldErrors};
pub use value::{FieldValue, Fields, Scalar, ValueKind};
