//! Raw group construction from message type definitions

use crate::compiler::CompilerConfig;
use crate::group::{ElementKind, Group, GroupElement};
use crate::{Error, Result};
use hl7_schema::{Specification, TypeDefinition};
use tracing::{debug, trace};

/// Build the group tree that directly mirrors a message type definition.
///
/// Sequence elements come first, then choice elements. Three-character
/// references are segments, two-character references are datatypes, and
/// anything else must name a nested message type in `spec`, which is built
/// recursively. Catch-all references (`anyZSegment` and friends) are skipped:
/// consumers account for an implicit trailing slot of other segments.
///
/// # Errors
///
/// Returns [`Error::UnresolvedReference`] for a reference that is none of the
/// above, and [`Error::CyclicReference`] if a nested definition refers back to
/// one of its ancestors.
pub fn build_group(
    definition: &TypeDefinition,
    spec: &Specification,
    config: &CompilerConfig,
) -> Result<Group> {
    let mut builder = GroupBuilder {
        spec,
        config,
        visiting: Vec::new(),
    };
    builder.build(definition)
}

struct GroupBuilder<'a> {
    spec: &'a Specification,
    config: &'a CompilerConfig,
    visiting: Vec<&'a str>,
}

impl<'a> GroupBuilder<'a> {
    fn build(&mut self, definition: &'a TypeDefinition) -> Result<Group> {
        if self.visiting.contains(&definition.name.as_str()) {
            return Err(Error::CyclicReference {
                reference: definition.name.clone(),
            });
        }
        self.visiting.push(&definition.name);

        let mut group = Group::new(definition.group_name());
        let first_choice = definition.first_choice_index();

        for (i, element) in definition.all_elements().enumerate() {
            let kind = if element.is_segment() {
                ElementKind::Segment(element.reference.clone())
            } else if element.is_data_type() {
                ElementKind::DataType(element.reference.clone())
            } else if let Some(nested) = self.spec.message_type(&element.reference) {
                ElementKind::Group(Box::new(self.build(nested)?))
            } else if self.config.is_catch_all(&element.reference) {
                trace!(group = %group.name, reference = %element.reference, "Skipping catch-all");
                continue;
            } else {
                return Err(Error::UnresolvedReference {
                    group: definition.name.clone(),
                    reference: element.reference.clone(),
                });
            };

            if !element.has_known_cardinality() {
                debug!(
                    group = %group.name,
                    reference = %element.reference,
                    min_occurs = %element.min_occurs,
                    max_occurs = %element.max_occurs,
                    "Unrecognised cardinality"
                );
            }

            group.elements.push(
                GroupElement::new(kind)
                    .mandatory(element.is_required())
                    .repeating(element.is_repeated())
                    .in_choice(i >= first_choice),
            );
        }

        self.visiting.pop();
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl7_schema::Element;

    fn build(definition: &TypeDefinition, spec: &Specification) -> Result<Group> {
        build_group(definition, spec, &CompilerConfig::default())
    }

    #[test]
    fn test_build_flat_message() {
        let ack = TypeDefinition::new("ACK.CONTENT").with_elements(vec![
            Element::new("MSH"),
            Element::new("MSA"),
            Element::new("ERR").optional(),
        ]);

        let group = build(&ack, &Specification::new()).unwrap();

        assert_eq!(group.name, "ACK");
        let codes: Vec<_> = group.direct_segments().collect();
        assert_eq!(codes, vec!["MSH", "MSA", "ERR"]);
        assert!(group.elements[0].required);
        assert!(group.elements[1].required);
        assert!(!group.elements[2].required);
        assert!(group.elements.iter().all(|e| !e.repeated && !e.choice));
    }

    #[test]
    fn test_build_nested_groups() {
        let spec = Specification::new()
            .with_message_type(TypeDefinition::new("ORU_R01.ORDER.CONTENT").with_elements(vec![
                Element::new("OBR"),
                Element::new("OBX").optional().repeated(),
            ]));
        let oru = TypeDefinition::new("ORU_R01.CONTENT").with_elements(vec![
            Element::new("MSH"),
            Element::new("ORU_R01.ORDER").repeated(),
        ]);

        let group = build(&oru, &spec).unwrap();

        assert_eq!(group.elements.len(), 2);
        let order = &group.elements[1];
        assert!(order.repeated);
        assert!(order.required);
        let nested = order.as_group().unwrap();
        assert_eq!(nested.name, "ORU_R01.ORDER");
        assert_eq!(nested.direct_segments().collect::<Vec<_>>(), vec!["OBR", "OBX"]);
        assert!(nested.elements[1].repeated);
    }

    #[test]
    fn test_build_datatype_and_choices() {
        let definition = TypeDefinition::new("QBP_Q11.CONTENT")
            .with_elements(vec![Element::new("MSH"), Element::new("CE")])
            .with_choices(vec![Element::new("RDF"), Element::new("RDT")]);

        let group = build(&definition, &Specification::new()).unwrap();

        assert!(matches!(&group.elements[1].kind, ElementKind::DataType(c) if c == "CE"));
        let choices: Vec<bool> = group.elements.iter().map(|e| e.choice).collect();
        assert_eq!(choices, vec![false, false, true, true]);
    }

    #[test]
    fn test_build_skips_catch_all() {
        let definition = TypeDefinition::new("ADT_A01.CONTENT").with_elements(vec![
            Element::new("MSH"),
            Element::new("anyZSegment").optional().repeated(),
            Element::new("anyHL7Segment").optional().repeated(),
            Element::new("IsHL7DataType").optional(),
            Element::new("PID"),
        ]);

        let group = build(&definition, &Specification::new()).unwrap();

        assert_eq!(group.direct_segments().collect::<Vec<_>>(), vec!["MSH", "PID"]);
    }

    #[test]
    fn test_build_unresolved_reference() {
        let definition = TypeDefinition::new("ADT_A01.CONTENT").with_elements(vec![
            Element::new("MSH"),
            Element::new("ADT_A01.PROCEDURE"),
        ]);

        let result = build(&definition, &Specification::new());

        match result {
            Err(Error::UnresolvedReference { group, reference }) => {
                assert_eq!(group, "ADT_A01.CONTENT");
                assert_eq!(reference, "ADT_A01.PROCEDURE");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_build_cyclic_reference() {
        let spec = Specification::new().with_message_type(
            TypeDefinition::new("XXX_Y01.LOOP.CONTENT")
                .with_elements(vec![Element::new("PID"), Element::new("XXX_Y01.LOOP")]),
        );
        let definition = TypeDefinition::new("XXX_Y01.CONTENT")
            .with_elements(vec![Element::new("XXX_Y01.LOOP")]);

        let result = build(&definition, &spec);

        assert!(matches!(result, Err(Error::CyclicReference { .. })));
    }

    #[test]
    fn test_build_reuses_subtype_in_siblings() {
        // The same subtype may legitimately appear twice under one parent.
        let spec = Specification::new().with_message_type(
            TypeDefinition::new("XXX_Y01.NOTE.CONTENT").with_elements(vec![Element::new("NTE")]),
        );
        let definition = TypeDefinition::new("XXX_Y01.CONTENT").with_elements(vec![
            Element::new("XXX_Y01.NOTE"),
            Element::new("XXX_Y01.NOTE"),
        ]);

        let group = build(&definition, &spec).unwrap();

        assert_eq!(group.elements.len(), 2);
        assert!(group.elements.iter().all(GroupElement::is_group));
    }
}
