//! Group tree types for compiled message structures

use serde::{Deserialize, Serialize};

/// A message type, or a group of related segments within one.
///
/// Element order mirrors the order segments must appear in a valid message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, e.g. `ORU_R01` or `ORU_R01_PID_OBR` once names are resolved
    pub name: String,

    /// Segments, datatypes and nested groups in schema order
    pub elements: Vec<GroupElement>,
}

/// What a group element refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A segment code, e.g. `PID`
    Segment(String),
    /// A datatype code, e.g. `CE`
    DataType(String),
    /// A nested group
    Group(Box<Group>),
}

/// One element of a [`Group`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupElement {
    pub kind: ElementKind,

    /// The element must occur at least once (`minOccurs="1"`)
    pub required: bool,

    /// The element may occur more than once (`maxOccurs` other than `"1"`)
    pub repeated: bool,

    /// The element came from a choice construct: at most one of the choice
    /// elements of a group is set
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub choice: bool,

    /// Name unique among the elements of the enclosing group
    #[serde(default)]
    pub deduplicated_name: String,
}

impl Group {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// Set the elements of the group
    pub fn with_elements(mut self, elements: Vec<GroupElement>) -> Self {
        self.elements = elements;
        self
    }

    /// Name of the type generated for this group
    pub fn type_name(&self) -> String {
        escape(&self.name)
    }

    /// Globally unique key of the element at `index`, e.g. `ADT_A01.pid`.
    ///
    /// This is the key follow sets are stored under.
    pub fn unique_key(&self, index: usize) -> Option<String> {
        self.elements
            .get(index)
            .map(|e| format!("{}.{}", self.type_name(), e.field_name()))
    }

    /// Codes of the segments directly within this group, ignoring nested groups
    pub fn direct_segments(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(GroupElement::segment_code)
    }
}

impl GroupElement {
    /// Create an optional, non-repeating element of the given kind
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            required: false,
            repeated: false,
            choice: false,
            deduplicated_name: String::new(),
        }
    }

    /// Create an optional, non-repeating segment element
    pub fn segment(code: impl Into<String>) -> Self {
        Self::new(ElementKind::Segment(code.into()))
    }

    /// Create an optional, non-repeating datatype element
    pub fn data_type(code: impl Into<String>) -> Self {
        Self::new(ElementKind::DataType(code.into()))
    }

    /// Create an optional, non-repeating nested group element
    pub fn group(group: Group) -> Self {
        Self::new(ElementKind::Group(Box::new(group)))
    }

    /// Set whether the element is required
    pub fn mandatory(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set whether the element repeats
    pub fn repeating(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    /// Set whether the element belongs to a choice
    pub fn in_choice(mut self, choice: bool) -> Self {
        self.choice = choice;
        self
    }

    pub fn segment_code(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Segment(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            ElementKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.kind {
            ElementKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ElementKind::Group(_))
    }

    /// Name of the type held by this element: the nested group's type, or
    /// the segment or datatype code.
    pub fn type_name(&self) -> String {
        match &self.kind {
            ElementKind::Group(group) => group.type_name(),
            ElementKind::Segment(code) | ElementKind::DataType(code) => escape(code),
        }
    }

    /// Name of the accessor for this element: `PID()` for single segments,
    /// `AllNTE()` for repeated ones, `GroupByOBR()` for nested groups.
    pub fn accessor_name(&self) -> String {
        let name = if self.is_group() {
            format!("GroupBy{}", self.deduplicated_name)
        } else if self.repeated {
            format!("All{}", self.deduplicated_name)
        } else {
            self.deduplicated_name.clone()
        };
        escape(&name)
    }

    /// Name of the field holding this element's value
    pub fn field_name(&self) -> String {
        escape(&self.deduplicated_name.to_lowercase())
    }
}

/// Collect `root` and every group nested below it, parents before children.
pub fn collect_groups(root: &Group) -> Vec<&Group> {
    let mut collected = vec![root];
    for element in &root.elements {
        if let Some(group) = element.as_group() {
            collected.extend(collect_groups(group));
        }
    }
    collected
}

// `var` is reserved in generated code.
fn escape(s: &str) -> String {
    if s == "var" {
        format!("{s}_")
    } else {
        s.to_string()
    }
}
