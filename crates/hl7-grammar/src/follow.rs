//! Follow sets: which segments may legitimately come next
//!
//! A message parser that meets a segment it did not expect at the current
//! position looks up the follow set of the current element. If the segment
//! is in it, parsing continues within the current group; otherwise the group
//! is closed. Follow sets are keyed `<GroupTypeName>.<fieldName>`, e.g.
//! `ADT_A01.pid`.

use crate::group::Group;
use crate::path::{GroupPath, walk};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Segment codes that may follow one element
pub type FollowSet = BTreeSet<String>;

/// Follow sets of every segment element, keyed by element key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowSets {
    sets: BTreeMap<String, FollowSet>,
}

impl FollowSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FollowSet> {
        self.sets.get(key)
    }

    /// Whether `segment` may follow the element keyed `key`.
    ///
    /// Unknown keys permit nothing.
    pub fn permits(&self, key: &str, segment: &str) -> bool {
        self.sets.get(key).is_some_and(|set| set.contains(segment))
    }

    pub fn insert(&mut self, key: String, set: FollowSet) -> Option<FollowSet> {
        self.sets.insert(key, set)
    }

    /// Add every entry of `other`; entries already present are replaced.
    pub fn merge(&mut self, other: FollowSets) {
        for (key, set) in other.sets {
            if self.sets.insert(key.clone(), set).is_some() {
                warn!(key = %key, "Duplicate follow set key");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FollowSet)> {
        self.sets.iter()
    }
}

impl<'a> IntoIterator for &'a FollowSets {
    type Item = (&'a String, &'a FollowSet);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FollowSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

/// Compute the follow set of every segment element in `root` and below.
pub fn compute_all(root: &Group) -> FollowSets {
    let mut follow_sets = FollowSets::new();
    walk(&GroupPath::root(root), |path| {
        if path.segment().is_none() {
            return;
        }
        if let Some(key) = path.unique_key() {
            let set = compute_one(path);
            follow_sets.insert(key, set);
        }
    });
    debug!(group = %root.name, follow_sets = follow_sets.len(), "Computed follow sets");
    follow_sets
}

/// Compute the follow set of the segment element `path` points at.
///
/// The set holds the element itself if it repeats, every segment reachable
/// after it by continuing forward through the enclosing groups, and, where an
/// enclosing group repeats, the segments that start that group again. All
/// following segments are included rather than stopping at the first required
/// one, which tolerates messages that omit required segments.
pub fn compute_one(path: &GroupPath<'_>) -> FollowSet {
    let mut set = FollowSet::new();
    let mut path = path.clone();

    let Some(element) = path.element() else {
        return set;
    };
    if !element.repeated {
        if let Some(top) = path.last_mut() {
            top.index += 1;
        }
    }

    let mut add = |p: &mut GroupPath<'_>| {
        if let Some(code) = p.segment() {
            set.insert(code.to_string());
        }
    };

    // Everything after the element within the currently open groups.
    walk(&path, &mut add);

    // Close each group, or rewind it to its start where the enclosing
    // element repeats. The message itself occurs once.
    let frames = path.frames_mut();
    for i in (0..frames.len().saturating_sub(1)).rev() {
        let wraps = frames[i].element().is_some_and(|e| e.repeated);
        let child = &mut frames[i + 1];
        if wraps {
            child.index = 0;
        } else {
            child.exhaust();
        }
    }
    if let Some(root) = frames.first_mut() {
        root.exhaust();
    }

    walk(&path, &mut add);
    set
}
