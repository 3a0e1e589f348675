//! Error-map computation from a widget tree.
//!
//! Each named leaf with failures contributes `name -> failures`. Nested
//! groups are walked recursively; how their entries are folded in depends on
//! [`ErrorMapMode`]:
//!
//! - `Flattened`: the nested entries are merged into the current level with
//!   no prefix. Sibling groups that share leaf names overwrite each other,
//!   last one wins.
//! - `Namespaced`: the nested map sits under the group's name as
//!   [`ErrorEntry::Group`]. Groups with no failures are omitted.
//!
//! Arrays contribute nothing in either mode.

use formsync_core::{ErrorEntry, ErrorMap, ErrorMapMode};
use formsync_widgets::{Control, FormGroup};

/// Error map of `group` under `mode`.
#[must_use]
pub fn collect_errors(group: &FormGroup, mode: ErrorMapMode) -> ErrorMap {
    let mut map = ErrorMap::new();
    for (name, control) in group.controls() {
        match control {
            Control::Leaf(leaf) if leaf.has_errors() => {
                map.insert(name.to_owned(), ErrorEntry::Field(leaf.errors().clone()));
            }
            Control::Group(child) => {
                let nested = collect_errors(child, mode);
                if nested.is_empty() {
                    continue;
                }
                match mode {
                    ErrorMapMode::Flattened => map.extend(nested),
                    ErrorMapMode::Namespaced => {
                        map.insert(name.to_owned(), ErrorEntry::Group(nested));
                    }
                }
            }
            Control::Leaf(_) | Control::Array(_) => {}
        }
    }
    map
}
