//! Leaf validators.
//!
//! A validator inspects a leaf value and either passes or reports one failure
//! as `(name, detail)`. Names and detail shapes follow the usual form
//! conventions so they can be shown or matched downstream:
//!
//! | Validator | Name | Detail |
//! |-----------|------|--------|
//! | `Required` | `required` | `true` |
//! | `MinLength(n)` | `minlength` | `{requiredLength, actualLength}` |
//! | `MaxLength(n)` | `maxlength` | `{requiredLength, actualLength}` |
//! | `Min(x)` | `min` | `{min, actual}` |
//! | `Max(x)` | `max` | `{max, actual}` |
//! | `Pattern(re)` | `pattern` | `{requiredPattern, actualValue}` |
//!
//! Length and range validators pass on empty values; combine with `Required`
//! to reject them.

use std::fmt;
use std::rc::Rc;

use formsync_core::{FieldErrors, FieldValue, Fields, Scalar};

type CustomFn = dyn Fn(&FieldValue) -> Option<FieldValue>;

/// A rule applied to a leaf value.
#[derive(Clone)]
pub enum Validator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    #[cfg(feature = "pattern")]
    Pattern(regex::Regex),
    /// Named rule; the closure returns the failure detail, or `None` to pass.
    Custom { name: String, check: Rc<CustomFn> },
}

impl Validator {
    /// Build a custom validator.
    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&FieldValue) -> Option<FieldValue> + 'static,
    ) -> Self {
        Self::Custom {
            name: name.into(),
            check: Rc::new(check),
        }
    }

    /// Anchored regex validator. Returns `None` if the pattern does not compile.
    #[cfg(feature = "pattern")]
    #[must_use]
    pub fn pattern(pattern: &str) -> Option<Self> {
        regex::Regex::new(&format!("^(?:{pattern})$"))
            .ok()
            .map(Self::Pattern)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "minlength",
            Self::MaxLength(_) => "maxlength",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            #[cfg(feature = "pattern")]
            Self::Pattern(_) => "pattern",
            Self::Custom { name, .. } => name,
        }
    }

    /// Failure detail for `value`, or `None` if it passes.
    #[must_use]
    pub fn check(&self, value: &FieldValue) -> Option<FieldValue> {
        match self {
            Self::Required => is_empty(value).then(|| FieldValue::from(true)),
            Self::MinLength(min) => length(value)
                .filter(|len| *len > 0 && len < min)
                .map(|len| length_detail(*min, len)),
            Self::MaxLength(max) => length(value)
                .filter(|len| len > max)
                .map(|len| length_detail(*max, len)),
            Self::Min(min) => number(value)
                .filter(|n| n < min)
                .map(|n| range_detail("min", *min, n)),
            Self::Max(max) => number(value)
                .filter(|n| n > max)
                .map(|n| range_detail("max", *max, n)),
            #[cfg(feature = "pattern")]
            Self::Pattern(re) => {
                let text = value.as_scalar().and_then(Scalar::as_str)?;
                if text.is_empty() || re.is_match(text) {
                    return None;
                }
                let mut detail = Fields::new();
                detail.insert("requiredPattern".into(), FieldValue::from(re.as_str()));
                detail.insert("actualValue".into(), FieldValue::from(text));
                Some(FieldValue::Mapping(detail))
            }
            Self::Custom { check, .. } => check(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) | Self::MaxLength(n) => write!(f, "{}({n})", self.name()),
            Self::Min(x) | Self::Max(x) => write!(f, "{}({x})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Run every validator, collecting failures in validator order.
#[must_use]
pub fn run_all(validators: &[Validator], value: &FieldValue) -> FieldErrors {
    validators
        .iter()
        .filter_map(|v| v.check(value).map(|detail| (v.name().to_owned(), detail)))
        .collect()
}

fn is_empty(value: &FieldValue) -> bool {
    match value {
        FieldValue::Scalar(s) => s.is_empty(),
        FieldValue::Sequence(items) => items.is_empty(),
        FieldValue::Mapping(_) => false,
    }
}

fn length(value: &FieldValue) -> Option<usize> {
    match value {
        FieldValue::Scalar(Scalar::Text(s)) => Some(s.chars().count()),
        FieldValue::Sequence(items) => Some(items.len()),
        _ => None,
    }
}

fn number(value: &FieldValue) -> Option<f64> {
    value.as_scalar().and_then(Scalar::as_f64)
}

fn length_detail(required: usize, actual: usize) -> FieldValue {
    let mut detail = Fields::new();
    detail.insert("requiredLength".into(), FieldValue::from(required as i64));
    detail.insert("actualLength".into(), FieldValue::from(actual as i64));
    FieldValue::Mapping(detail)
}

fn range_detail(bound_name: &str, bound: f64, actual: f64) -> FieldValue {
    let mut detail = Fields::new();
    detail.insert(bound_name.into(), FieldValue::from(bound));
    detail.insert("actual".into(), FieldValue::from(actual));
    FieldValue::Mapping(detail)
}
