#![no_main]

use formsync_bind::{extract_value, reconcile};
use formsync_core::{FieldValue, is_different};
use formsync_widgets::FormGroup;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let value = FieldValue::from(json);
    let mut tree = FormGroup::new();
    let first = reconcile(&value, &mut tree);
    if first.ignored_root {
        assert!(tree.is_empty());
        return;
    }
    assert!(!is_different(&extract_value(&tree), &value));

    let second = reconcile(&value, &mut tree);
    assert_eq!(second.structural_changes(), 0);
});
