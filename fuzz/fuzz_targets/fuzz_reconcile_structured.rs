#![no_main]

//! Reconcile a sequence of store values into one tree.
//!
//! Keys a later value omits stay in the tree, so the tree value must match
//! each incoming value on every key that value names.

use arbitrary::{Arbitrary, Unstructured};
use formsync_bind::reconcile;
use formsync_core::{FieldValue, Fields, deep_eq};
use formsync_widgets::FormGroup;
use libfuzzer_sys::fuzz_target;

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Arbitrary, Debug, Clone)]
enum Node {
    Null,
    Bool(bool),
    Int(i32),
    Text(u8),
    List(Vec<Node>),
    Group(Vec<(u8, Node)>),
}

fn build(node: &Node, depth: u8) -> FieldValue {
    match node {
        Node::Null => FieldValue::null(),
        Node::Bool(b) => FieldValue::from(*b),
        Node::Int(i) => FieldValue::from(*i),
        Node::Text(t) => FieldValue::from(format!("t{t}")),
        Node::List(_) | Node::Group(_) if depth == 0 => FieldValue::null(),
        Node::List(items) => FieldValue::from(
            items.iter().take(4).map(|n| build(n, depth - 1)).collect::<Vec<_>>(),
        ),
        Node::Group(entries) => FieldValue::from(
            entries
                .iter()
                .take(4)
                .map(|(k, n)| (KEYS[*k as usize % KEYS.len()].to_owned(), build(n, depth - 1)))
                .collect::<Fields>(),
        ),
    }
}

#[derive(Debug)]
struct Steps(Vec<Vec<(u8, Node)>>);

impl<'a> Arbitrary<'a> for Steps {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let count = u.int_in_range(1..=6)?;
        let mut steps = Vec::with_capacity(count);
        for _ in 0..count {
            steps.push(Vec::arbitrary(u)?);
        }
        Ok(Self(steps))
    }
}

/// Whether `actual` agrees with `expected` on every key `expected` names.
fn covers(actual: &FieldValue, expected: &FieldValue) -> bool {
    match (actual.as_mapping(), expected.as_mapping()) {
        (Some(actual), Some(expected)) => expected
            .iter()
            .all(|(key, want)| actual.get(key).is_some_and(|have| covers(have, want))),
        // Scalars never replace an existing group or array.
        _ if expected.is_scalar() && !actual.is_scalar() => true,
        _ => deep_eq(actual, expected),
    }
}

fuzz_target!(|steps: Steps| {
    let mut tree = FormGroup::new();
    for entries in &steps.0 {
        let value = build(&Node::Group(entries.clone()), 3);
        reconcile(&value, &mut tree);
        let current = tree.value();
        assert!(covers(&current, &value), "{current} does not cover {value}");
    }
});
