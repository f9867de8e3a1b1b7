//! The specification tables

use crate::model::{CONTENT_SUFFIX, DefinitionKind, TypeDefinition};
use std::collections::BTreeMap;

/// Name-keyed lookup tables for every definition in the HL7 schemas.
///
/// Tables are ordered maps so that iteration, and therefore everything
/// generated from a specification, is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Specification {
    pub fields: BTreeMap<String, TypeDefinition>,
    pub segments: BTreeMap<String, TypeDefinition>,
    pub composite_types: BTreeMap<String, TypeDefinition>,
    pub message_types: BTreeMap<String, TypeDefinition>,
}

impl Specification {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&mut self, definition: TypeDefinition) {
        self.fields.insert(definition.name.clone(), definition);
    }

    pub fn insert_segment(&mut self, definition: TypeDefinition) {
        self.segments.insert(definition.name.clone(), definition);
    }

    pub fn insert_composite_type(&mut self, definition: TypeDefinition) {
        self.composite_types
            .insert(definition.name.clone(), definition);
    }

    pub fn insert_message_type(&mut self, definition: TypeDefinition) {
        self.message_types.insert(definition.name.clone(), definition);
    }

    /// Add a message type definition, returning the specification
    pub fn with_message_type(mut self, definition: TypeDefinition) -> Self {
        self.insert_message_type(definition);
        self
    }

    /// Add a segment definition, returning the specification
    pub fn with_segment(mut self, definition: TypeDefinition) -> Self {
        self.insert_segment(definition);
        self
    }

    /// Look up a message type (or message subtype) by element reference.
    ///
    /// Element references omit the `.CONTENT` suffix the table keys carry, so
    /// both spellings are accepted.
    pub fn message_type(&self, reference: &str) -> Option<&TypeDefinition> {
        lookup(&self.message_types, reference)
    }

    /// Look up a segment by element reference or table key.
    pub fn segment(&self, reference: &str) -> Option<&TypeDefinition> {
        lookup(&self.segments, reference)
    }

    /// Look up a field or datatype by element reference or table key.
    pub fn field(&self, reference: &str) -> Option<&TypeDefinition> {
        lookup(&self.fields, reference)
    }

    /// Message types that are not groups nested within another message type,
    /// in name order.
    pub fn top_level_message_types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.message_types
            .values()
            .filter(|d| d.kind() != DefinitionKind::MessageSubtype)
    }

    /// Replace or add every definition of `other`, so later versions win.
    pub fn merge(&mut self, other: Specification) {
        self.fields.extend(other.fields);
        self.segments.extend(other.segments);
        self.composite_types.extend(other.composite_types);
        self.message_types.extend(other.message_types);
    }

    /// Total number of definitions across all tables
    pub fn len(&self) -> usize {
        self.fields.len()
            + self.segments.len()
            + self.composite_types.len()
            + self.message_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lookup<'a>(
    table: &'a BTreeMap<String, TypeDefinition>,
    reference: &str,
) -> Option<&'a TypeDefinition> {
    table
        .get(reference)
        .or_else(|| table.get(&format!("{reference}{CONTENT_SUFFIX}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_with_and_without_suffix() {
        let spec = Specification::new()
            .with_message_type(TypeDefinition::new("ADT_A01.PROCEDURE.CONTENT"));

        assert!(spec.message_type("ADT_A01.PROCEDURE").is_some());
        assert!(spec.message_type("ADT_A01.PROCEDURE.CONTENT").is_some());
        assert!(spec.message_type("ADT_A01.INSURANCE").is_none());
    }

    #[test]
    fn test_top_level_message_types_skip_subtypes() {
        let spec = Specification::new()
            .with_message_type(TypeDefinition::new("ORU_R01.CONTENT"))
            .with_message_type(TypeDefinition::new("ORU_R01.PATIENT_RESULT.CONTENT"))
            .with_message_type(TypeDefinition::new("ACK.CONTENT"));

        let names: Vec<&str> = spec
            .top_level_message_types()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["ACK.CONTENT", "ORU_R01.CONTENT"]);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut older = Specification::new()
            .with_segment(TypeDefinition::new("PID.CONTENT").with_long_name("old"));
        let newer = Specification::new()
            .with_segment(TypeDefinition::new("PID.CONTENT").with_long_name("new"))
            .with_segment(TypeDefinition::new("PV1.CONTENT"));

        older.merge(newer);

        assert_eq!(older.segments.len(), 2);
        assert_eq!(
            older.segment("PID").unwrap().long_name.as_deref(),
            Some("new")
        );
        assert_eq!(older.len(), 2);
        assert!(!older.is_empty());
    }
}
