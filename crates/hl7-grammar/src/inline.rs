//! Flattening of nested groups into their parents
//!
//! The schemas nest groups deeply, e.g. `ORU_R01 > PATIENT_RESULT > PATIENT >
//! ORDER_OBSERVATION`. `PATIENT` is not repeated and shares no segment with
//! `PATIENT_RESULT`, so its segments can live directly in the parent, giving
//! `ORU_R01 > (PATIENT_RESULT + PATIENT) > ORDER_OBSERVATION`. Groups survive
//! only where repetition or a segment collision forces them to.

use crate::group::{ElementKind, Group, GroupElement};
use std::collections::HashSet;
use tracing::trace;

/// Splice non-repeating, non-colliding nested groups into their parents.
///
/// Children are flattened before their parent is considered. A nested group
/// is spliced in unless it repeats or one of its *direct* segments is already
/// used directly in the parent; segments deeper in the nested group are not
/// checked.
pub fn inline_subgroups(group: &mut Group) {
    let mut used: HashSet<String> = HashSet::new();
    for element in &mut group.elements {
        match &mut element.kind {
            ElementKind::Group(nested) => inline_subgroups(nested),
            ElementKind::Segment(code) => {
                used.insert(code.clone());
            }
            ElementKind::DataType(_) => {}
        }
    }

    let elements = std::mem::take(&mut group.elements);
    let mut flattened = Vec::with_capacity(elements.len());

    for element in elements {
        match element {
            GroupElement {
                kind: ElementKind::Group(nested),
                repeated: false,
                choice,
                ..
            } if !collides(&nested, &used) => {
                trace!(parent = %group.name, nested = %nested.name, "Inlining group");
                for mut sub in nested.elements {
                    if let Some(code) = sub.segment_code() {
                        used.insert(code.to_string());
                    }
                    sub.choice |= choice;
                    flattened.push(sub);
                }
            }
            other => flattened.push(other),
        }
    }

    group.elements = flattened;
}

fn collides(nested: &Group, used: &HashSet<String>) -> bool {
    nested.direct_segments().any(|code| used.contains(code))
}
