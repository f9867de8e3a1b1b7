//! Element and group naming

use crate::group::{ElementKind, Group, GroupElement};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Name every element of `group` and below, and rename nested groups.
///
/// Segments and datatypes are named by their code and nested groups by
/// their [key segment](key_segment). Duplicate names within a group are
/// suffixed (see [`deduplicate`]). A nested group is renamed to its parent's
/// name, an underscore, and its element name, e.g. `ORU_R01_PID_OBR`, which
/// makes group names unique across the whole message tree.
pub fn resolve_names(group: &mut Group) {
    let candidates: Vec<String> = group.elements.iter().map(candidate_name).collect();
    let names = deduplicate(&candidates);

    for (element, name) in group.elements.iter_mut().zip(names) {
        if let Some(nested) = element.as_group_mut() {
            nested.name = format!("{}_{}", group.name, name);
            trace!(group = %nested.name, "Named group");
            resolve_names(nested);
        }
        element.deduplicated_name = name;
    }
}

fn candidate_name(element: &GroupElement) -> String {
    match &element.kind {
        ElementKind::Segment(code) | ElementKind::DataType(code) => code.clone(),
        ElementKind::Group(nested) => key_segment(nested).to_string(),
    }
}

/// The segment a group is known by: its first required direct segment, or
/// its first direct segment if all are optional, or empty if it has none.
pub fn key_segment(group: &Group) -> &str {
    let mut first = None;
    for element in &group.elements {
        if let Some(code) = element.segment_code() {
            if element.required {
                return code;
            }
            first.get_or_insert(code);
        }
    }
    first.unwrap_or_default()
}

/// Make names unique: the first occurrence of a name is kept as is, later
/// ones get a running suffix starting at 1 (`ROL`, `ROL1`, `ROL2`).
///
/// A suffixed name that would clash with another name in the list skips to
/// the next free suffix.
pub fn deduplicate(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut suffixes: HashMap<&str, usize> = HashMap::new();
    let mut deduplicated = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.as_str()) {
            deduplicated.push(name.clone());
            continue;
        }
        let suffix = suffixes.entry(name.as_str()).or_insert(1);
        let unique = loop {
            let candidate = format!("{name}{suffix}");
            *suffix += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(unique.clone());
        deduplicated.push(unique);
    }

    deduplicated
}
