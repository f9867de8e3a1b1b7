//! Fixes for known defects in the published HL7 schemas

use crate::model::{Element, TypeDefinition};
use crate::registry::Specification;
use tracing::{debug, trace};

/// Largest numbering gap that is backfilled; wider gaps are left alone.
pub const MAX_BACKFILL_GAP: u32 = 100;

/// Fill gaps in element numbering with deprecated placeholders.
///
/// Later schema versions drop withdrawn fields instead of keeping them, e.g.
/// a segment listing `PID.1` followed by `PID.4`. Generated types must keep
/// every position to stay backwards compatible, so `PID.2` and `PID.3` are
/// reinstated as optional, non-repeating, deprecated elements.
pub fn amend_elements(definition: &mut TypeDefinition) {
    if definition.elements.is_empty() {
        return;
    }

    let mut expect_next = 1;
    let mut amended = Vec::with_capacity(definition.elements.len());

    for element in definition.elements.drain(..) {
        let Some((offset, current)) = element.position() else {
            amended.push(element);
            continue;
        };

        if current.saturating_sub(expect_next) > MAX_BACKFILL_GAP {
            debug!(
                definition = %definition.name,
                reference = %element.reference,
                "Numbering gap too wide, not backfilling"
            );
            expect_next = current.saturating_add(1);
            amended.push(element);
            continue;
        }

        for missing in expect_next..current {
            let placeholder = Element {
                reference: format!("{}{}", &element.reference[..offset], missing),
                min_occurs: "0".to_string(),
                max_occurs: "1".to_string(),
                deprecated: true,
            };
            trace!(
                definition = %definition.name,
                from = %element.reference,
                added = %placeholder.reference,
                "Backfilling deprecated field"
            );
            amended.push(placeholder);
        }
        expect_next = current.saturating_add(1);
        amended.push(element);
    }

    definition.elements = amended;
}

/// Apply the scripted corrections that code generation relies on.
///
/// `max_version` is the three digit version the specification was loaded up
/// to; some corrections only apply to definitions introduced after 2.2 or 2.3.
pub fn apply_corrections(spec: &mut Specification, max_version: u32) {
    // The long name of XTN.1 is a format, which can't be turned into a name.
    if max_version > 230 {
        set_long_name(spec, "XTN.1.CONTENT", "Number");
    }
    // ED has two fields named data.
    if max_version > 220 {
        set_long_name(spec, "ED.3.CONTENT", "Data Subtype");
    }
    // The field separator is implicit in the text encoding.
    if spec.fields.remove("MSH.1.CONTENT").is_none() {
        debug!("No MSH.1 field to remove");
    }
    // MSH.2 is declared ST but holds the unescaped delimiters.
    match spec.fields.get_mut("MSH.2.CONTENT") {
        Some(field) => field.type_name = Some("Delimiters".to_string()),
        None => debug!("No MSH.2 field to retype"),
    }
    // CNS changed from a datatype to a segment in 2.4.
    if max_version > 230 {
        match spec.composite_types.get_mut("CNS") {
            Some(composite) => composite.name = "CNS231".to_string(),
            None => debug!("No CNS composite type to rename"),
        }
    }
}

fn set_long_name(spec: &mut Specification, field: &str, long_name: &str) {
    match spec.fields.get_mut(field) {
        Some(definition) => definition.long_name = Some(long_name.to_string()),
        None => debug!(field, "Correction target missing, skipping"),
    }
}
