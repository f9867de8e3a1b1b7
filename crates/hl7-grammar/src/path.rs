//! Explicit-stack paths and depth-first traversal over group trees
//!
//! A [`GroupPath`] is the cursor of a traversal: one frame per open group,
//! each holding the index of the current element within that group. Keeping
//! the stack explicit lets callers copy a position, truncate it, or rewind
//! individual frames between (and during) walks.

use crate::group::{ElementKind, Group, GroupElement};

/// One open group and the index of the current element within it
#[derive(Debug, Clone, Copy)]
pub struct PathFrame<'a> {
    pub group: &'a Group,
    pub index: usize,
}

impl<'a> PathFrame<'a> {
    pub fn new(group: &'a Group, index: usize) -> Self {
        Self { group, index }
    }

    /// The element at the frame's index, if the index is within the group
    pub fn element(&self) -> Option<&'a GroupElement> {
        self.group.elements.get(self.index)
    }

    /// Whether the index has moved past the last element
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.group.elements.len()
    }

    /// Move the index past the last element
    pub fn exhaust(&mut self) {
        self.index = self.group.elements.len();
    }
}

/// A position within a nested group tree, outermost group first
#[derive(Debug, Clone, Default)]
pub struct GroupPath<'a> {
    frames: Vec<PathFrame<'a>>,
}

impl<'a> GroupPath<'a> {
    /// A path pointing at the first element of `root`
    pub fn root(root: &'a Group) -> Self {
        Self {
            frames: vec![PathFrame::new(root, 0)],
        }
    }

    pub fn frames(&self) -> &[PathFrame<'a>] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [PathFrame<'a>] {
        &mut self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: PathFrame<'a>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<PathFrame<'a>> {
        self.frames.pop()
    }

    /// Drop every frame below the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }

    /// The innermost frame
    pub fn last(&self) -> Option<&PathFrame<'a>> {
        self.frames.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut PathFrame<'a>> {
        self.frames.last_mut()
    }

    /// The element the innermost frame points at
    pub fn element(&self) -> Option<&'a GroupElement> {
        self.last().and_then(PathFrame::element)
    }

    /// The segment code at the end of the path, if it ends in a segment,
    /// e.g. `OBR` for `ORU_R01 > PID > OBR`
    pub fn segment(&self) -> Option<&'a str> {
        self.element().and_then(GroupElement::segment_code)
    }

    /// Follow-set key of the element at the end of the path
    pub fn unique_key(&self) -> Option<String> {
        self.last().and_then(|f| f.group.unique_key(f.index))
    }
}

/// Visit every segment and datatype reachable from `start`, depth first in
/// schema order.
///
/// `visit` receives the live path positioned on each leaf and may modify it
/// to redirect the walk; after it returns, the innermost frame's index is
/// advanced. An exhausted frame is popped and its parent advanced. The walk
/// ends when the path is empty. `start` itself is not modified.
pub fn walk<'a, F>(start: &GroupPath<'a>, mut visit: F)
where
    F: FnMut(&mut GroupPath<'a>),
{
    let mut path = start.clone();
    while let Some(frame) = path.last().copied() {
        match frame.element() {
            None => {
                path.pop();
                match path.last_mut() {
                    Some(parent) => parent.index += 1,
                    None => break,
                }
            }
            Some(element) => match &element.kind {
                ElementKind::Group(nested) => path.push(PathFrame::new(nested, 0)),
                ElementKind::Segment(_) | ElementKind::DataType(_) => {
                    visit(&mut path);
                    if let Some(top) = path.last_mut() {
                        top.index += 1;
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(code: &str) -> GroupElement {
        GroupElement::segment(code)
    }

    fn tree() -> Group {
        // ROOT: MSH [A: PID [B: OBR OBX] NTE] [EMPTY] DSC
        let b = Group::new("B").with_elements(vec![seg("OBR"), seg("OBX")]);
        let a = Group::new("A").with_elements(vec![seg("PID"), GroupElement::group(b), seg("NTE")]);
        Group::new("ROOT").with_elements(vec![
            seg("MSH"),
            GroupElement::group(a),
            GroupElement::group(Group::new("EMPTY")),
            seg("DSC"),
        ])
    }

    fn collect(start: &GroupPath<'_>) -> Vec<String> {
        let mut visited = Vec::new();
        walk(start, |p| visited.push(p.segment().unwrap_or("?").to_string()));
        visited
    }

    #[test]
    fn test_walk_from_root() {
        let root = tree();
        assert_eq!(
            collect(&GroupPath::root(&root)),
            vec!["MSH", "PID", "OBR", "OBX", "NTE", "DSC"]
        );
    }

    #[test]
    fn test_walk_from_middle() {
        let root = tree();
        let a = root.elements[1].as_group().unwrap();
        let b = a.elements[1].as_group().unwrap();
        let mut start = GroupPath::root(&root);
        start.frames_mut()[0].index = 1;
        start.push(PathFrame::new(a, 1));
        start.push(PathFrame::new(b, 1));

        assert_eq!(collect(&start), vec!["OBX", "NTE", "DSC"]);
        // The start path is copied, not consumed.
        assert_eq!(start.segment(), Some("OBX"));
    }

    #[test]
    fn test_walk_exhausted_start() {
        let root = tree();
        let mut start = GroupPath::root(&root);
        start.frames_mut()[0].exhaust();
        assert!(collect(&start).is_empty());
        assert!(collect(&GroupPath::default()).is_empty());
    }

    #[test]
    fn test_walk_visits_datatypes() {
        let root = Group::new("R").with_elements(vec![seg("MSH"), GroupElement::data_type("CE")]);
        let mut kinds = Vec::new();
        walk(&GroupPath::root(&root), |p| kinds.push(p.segment().is_some()));
        assert_eq!(kinds, vec![true, false]);
    }

    #[test]
    fn test_visitor_can_rewind() {
        let root = Group::new("R").with_elements(vec![seg("MSH"), seg("MSA"), seg("ERR")]);
        let mut visited = Vec::new();
        let mut rewound = false;
        walk(&GroupPath::root(&root), |p| {
            visited.push(p.segment().unwrap().to_string());
            if p.segment() == Some("ERR") && !rewound {
                rewound = true;
                // Resume just after MSH.
                p.last_mut().unwrap().index = 0;
            }
        });
        assert_eq!(visited, vec!["MSH", "MSA", "ERR", "MSA", "ERR"]);
    }

    #[test]
    fn test_visitor_can_close_groups() {
        let root = tree();
        let mut visited = Vec::new();
        walk(&GroupPath::root(&root), |p| {
            visited.push(p.segment().unwrap().to_string());
            if p.segment() == Some("PID") {
                // Skip the rest of group A.
                p.last_mut().unwrap().exhaust();
            }
        });
        assert_eq!(visited, vec!["MSH", "PID", "DSC"]);
    }

    #[test]
    fn test_path_accessors() {
        let root = tree();
        let mut path = GroupPath::root(&root);
        assert_eq!(path.len(), 1);
        assert_eq!(path.segment(), Some("MSH"));
        path.frames_mut()[0].index = 1;
        assert!(path.element().unwrap().is_group());
        assert_eq!(path.segment(), None);
        let a = path.element().unwrap().as_group().unwrap();
        path.push(PathFrame::new(a, 0));
        assert_eq!(path.segment(), Some("PID"));
        path.truncate(1);
        assert_eq!(path.len(), 1);
        assert!(path.pop().is_some());
        assert!(path.is_empty());
        assert_eq!(path.element(), None);
    }
}
