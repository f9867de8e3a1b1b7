//! Specification model definitions

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Suffix the XML schemas append to every complex type name.
pub const CONTENT_SUFFIX: &str = ".CONTENT";

// Identifier shapes used by the HL7 XML schemas.
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3}\.\d+\.CONTENT$").expect("valid field pattern"));
static SEGMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3}\.CONTENT$").expect("valid segment pattern"));
static MESSAGE_TYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{3}_[A-Za-z0-9]{3}\.CONTENT$").expect("valid message type pattern")
});
// The optional extra dot catches PPV_PCA..ORDER_DETAIL_SEGMENT; the hyphen
// catches SDR_S31.ANTI-MICROBIAL_DEVICE_DATA.
static MESSAGE_SUBTYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{3}_[A-Za-z0-9]{3}\.?\.[A-Za-z0-9_-]+\.CONTENT$")
        .expect("valid message subtype pattern")
});

/// A reference to a segment, datatype or group within a complex type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Referenced identifier, e.g. `PID`, `CE` or `ADT_A01.PROCEDURE`
    #[serde(rename = "ref")]
    pub reference: String,

    /// Schema cardinality lower bound, usually `"0"` or `"1"`
    #[serde(default = "default_occurs", alias = "minOccurs")]
    pub min_occurs: String,

    /// Schema cardinality upper bound, usually `"1"` or `"unbounded"`
    #[serde(default = "default_occurs", alias = "maxOccurs")]
    pub max_occurs: String,

    /// Set for placeholder elements backfilled over gaps in field numbering
    #[serde(default)]
    pub deprecated: bool,
}

fn default_occurs() -> String {
    "1".to_string()
}

impl Element {
    /// Create an element with the XML schema default cardinality (exactly once)
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            min_occurs: default_occurs(),
            max_occurs: default_occurs(),
            deprecated: false,
        }
    }

    /// Set the cardinality strings
    pub fn occurs(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min_occurs = min.into();
        self.max_occurs = max.into();
        self
    }

    /// Mark the element as optional (`minOccurs="0"`)
    pub fn optional(mut self) -> Self {
        self.min_occurs = "0".to_string();
        self
    }

    /// Mark the element as repeating (`maxOccurs="unbounded"`)
    pub fn repeated(mut self) -> Self {
        self.max_occurs = "unbounded".to_string();
        self
    }

    /// Segment references are exactly three characters long.
    pub fn is_segment(&self) -> bool {
        self.reference.len() == 3
    }

    /// Datatype references are exactly two characters long.
    pub fn is_data_type(&self) -> bool {
        self.reference.len() == 2
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs == "1"
    }

    pub fn is_repeated(&self) -> bool {
        self.max_occurs != "1"
    }

    /// True when both cardinality strings are ones the schemas are known to use.
    pub fn has_known_cardinality(&self) -> bool {
        let known_bound = |s: &str| s == "unbounded" || s.parse::<u32>().is_ok();
        known_bound(&self.min_occurs) && known_bound(&self.max_occurs)
    }

    /// Position number in a field reference, e.g. 4 for `PID.4`.
    ///
    /// Returns the byte offset where the number starts together with the number.
    pub fn position(&self) -> Option<(usize, u32)> {
        let dot = self.reference.find('.')?;
        let digits: String = self.reference[dot + 1..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok().map(|n| (dot + 1, n))
    }
}

/// Classification of a complex type by the shape of its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// A segment field, e.g. `PID.3.CONTENT`
    Field,
    /// A segment, e.g. `PID.CONTENT`
    Segment,
    /// A top-level message type, e.g. `ADT_A01.CONTENT` or `ACK.CONTENT`
    MessageType,
    /// A group nested within a message type, e.g. `ADT_A01.PROCEDURE.CONTENT`
    MessageSubtype,
    /// Anything else, e.g. composite datatypes such as `CE`
    Other,
}

/// A named segment, datatype or message type definition from the schemas
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,

    /// Elements of the `sequence` construct
    #[serde(default)]
    pub elements: Vec<Element>,

    /// Elements of the `choice` construct; only one of them is set in a message
    #[serde(default)]
    pub choices: Vec<Element>,

    #[serde(default)]
    pub item: Option<String>,

    /// The appinfo type. Some schemas spell it `Type`, others `type`.
    #[serde(default, rename = "type", alias = "Type")]
    pub type_name: Option<String>,

    #[serde(default, alias = "LongName")]
    pub long_name: Option<String>,

    /// Schema version the definition was taken from
    #[serde(default)]
    pub version: String,
}

impl TypeDefinition {
    /// Create an empty definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add sequence elements
    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = elements;
        self
    }

    /// Add choice elements
    pub fn with_choices(mut self, choices: Vec<Element>) -> Self {
        self.choices = choices;
        self
    }

    /// Set the appinfo type
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the long name
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    /// The HL7 datatype of the definition, with `varies` mapped to `Any`.
    pub fn data_type(&self) -> &str {
        match self.type_name.as_deref() {
            Some("varies") => "Any",
            Some(t) => t,
            None => "",
        }
    }

    /// Segments (and message types) carry no appinfo type; fields do.
    pub fn is_segment(&self) -> bool {
        self.data_type().is_empty()
    }

    pub fn is_composite(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Segment code, e.g. `PID` for `PID.CONTENT`.
    pub fn segment_name(&self) -> &str {
        self.name.get(..3).unwrap_or(&self.name)
    }

    /// Identifier-safe message type name, e.g. `ADT_A01` for `ADT_A01.CONTENT`.
    pub fn message_type_name(&self) -> String {
        nameify(&self.name)
    }

    /// Name of the group built from this definition.
    pub fn group_name(&self) -> String {
        self.name.replacen(CONTENT_SUFFIX, "", 1)
    }

    /// Sequence elements followed by choice elements.
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().chain(self.choices.iter())
    }

    /// Index in [`all_elements`](Self::all_elements) of the first choice element.
    pub fn first_choice_index(&self) -> usize {
        self.elements.len()
    }

    pub fn kind(&self) -> DefinitionKind {
        classify(&self.name)
    }
}

/// Classify a schema identifier by its shape.
pub fn classify(name: &str) -> DefinitionKind {
    if name == "ACK.CONTENT" || MESSAGE_TYPE_NAME.is_match(name) {
        DefinitionKind::MessageType
    } else if FIELD_NAME.is_match(name) {
        DefinitionKind::Field
    } else if SEGMENT_NAME.is_match(name) {
        DefinitionKind::Segment
    } else if MESSAGE_SUBTYPE_NAME.is_match(name) {
        DefinitionKind::MessageSubtype
    } else {
        DefinitionKind::Other
    }
}

/// Remove the `HL7` prefix that some long names carry.
pub fn remove_hl7_prefix(s: &str) -> &str {
    if s == "HL7 Data Type" || s == "HL7 Error Code" {
        return s;
    }
    let s = s.strip_prefix("HL7 ").unwrap_or(s);
    s.strip_prefix("HL7").unwrap_or(s)
}

/// Turn a schema identifier into a type name: the `.CONTENT` suffix is
/// dropped, `.` and `-` become `_`, and a doubled `_` is collapsed.
pub fn nameify(raw: &str) -> String {
    let trimmed = remove_hl7_prefix(raw);
    let trimmed = trimmed.strip_suffix(CONTENT_SUFFIX).unwrap_or(trimmed);
    trimmed.replace(['.', '-'], "_").replace("__", "_")
}
