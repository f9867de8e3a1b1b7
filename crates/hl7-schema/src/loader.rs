//! Specification loader with version ordering and corrections

use crate::corrections::{amend_elements, apply_corrections};
use crate::model::{DefinitionKind, TypeDefinition};
use crate::registry::Specification;
use crate::version::{sortable_version, version_name};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, trace};

/// Names never loaded, because the generated code provides its own
/// implementation of them.
pub const DEFAULT_BLOCK_LIST: &[&str] = &[
    "FT",
    "TS",
    "TX",
    "TX_CHALLENGE",
    "anyHL7Segment.TYPE",
    "anyZSegment.TYPE",
];

/// Version stamped on definitions loaded from synthetic extras.
pub const SYNTHETIC_VERSION: &str = "SYNTHETIC";

/// Configuration for loading a specification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Highest version to load, as a three digit integer: 240 for 2.4, 251 for 2.5.1
    pub max_version: u32,
    /// Names to skip in addition to [`DEFAULT_BLOCK_LIST`]
    pub block_list: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_version: 251,
            block_list: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highest version to load
    pub fn max_version(mut self, max_version: u32) -> Self {
        self.max_version = max_version;
        self
    }

    /// Skip definitions with this name
    pub fn block(mut self, name: impl Into<String>) -> Self {
        self.block_list.push(name.into());
        self
    }

    /// Whether a definition with this name is skipped
    pub fn is_blocked(&self, name: &str) -> bool {
        DEFAULT_BLOCK_LIST.contains(&name) || self.block_list.iter().any(|b| b == name)
    }
}

/// The complex types of one schema version
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecificationDocument {
    pub version: String,
    /// Segments and segment fields (segments.xsd and fields.xsd)
    #[serde(default)]
    pub segments: Vec<TypeDefinition>,
    /// Datatypes (datatypes.xsd)
    #[serde(default)]
    pub datatypes: Vec<TypeDefinition>,
    /// Message types and their groups (ACK.xsd and ???_???.xsd)
    #[serde(default)]
    pub messages: Vec<TypeDefinition>,
}

/// Locally synthesized messages, segments or fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtrasDocument {
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

/// Loads specification documents into a corrected [`Specification`]
#[derive(Debug, Clone, Default)]
pub struct SpecificationLoader {
    config: LoaderConfig,
}

impl SpecificationLoader {
    /// Create a loader with the given configuration
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read a specification document, as YAML or JSON depending on the extension
    pub fn read_document(&self, path: &Path) -> Result<SpecificationDocument> {
        let content = read_file(path)?;
        if is_yaml(path) {
            self.parse_yaml(&content)
        } else {
            self.parse_json(&content)
        }
    }

    /// Read an extras document, as YAML or JSON depending on the extension
    pub fn read_extras(&self, path: &Path) -> Result<ExtrasDocument> {
        let content = read_file(path)?;
        if is_yaml(path) {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {}", e)))
        }
    }

    /// Parse a specification document from a JSON string
    pub fn parse_json(&self, json: &str) -> Result<SpecificationDocument> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {}", e)))
    }

    /// Parse a specification document from a YAML string
    pub fn parse_yaml(&self, yaml: &str) -> Result<SpecificationDocument> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {}", e)))
    }

    /// Read and load specification documents and extras from disk
    pub fn load_files<P: AsRef<Path>>(&self, documents: &[P], extras: &[P]) -> Result<Specification> {
        let documents = documents
            .iter()
            .map(|p| self.read_document(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let extras = extras
            .iter()
            .map(|p| self.read_extras(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.load(documents, extras)
    }

    /// Build a corrected specification from parsed documents.
    ///
    /// Documents are applied oldest version first so the most recent
    /// definition of each type wins; versions above the configured maximum
    /// are skipped. Field numbering gaps are backfilled, extras are added, and
    /// the scripted corrections are applied last.
    pub fn load(
        &self,
        documents: Vec<SpecificationDocument>,
        extras: Vec<ExtrasDocument>,
    ) -> Result<Specification> {
        let mut ordered = documents
            .into_iter()
            .map(|d| sortable_version(&d.version).map(|v| (v, d)))
            .collect::<Result<Vec<_>>>()?;
        ordered.sort_by_key(|(v, _)| *v);

        let mut spec = Specification::new();
        for (version, document) in ordered {
            if version > self.config.max_version {
                info!(
                    "Skipping version {} and above (max version {})",
                    document.version,
                    version_name(self.config.max_version)
                );
                break;
            }
            info!("Processing version {}", document.version);
            self.add_document(document, &mut spec)?;
        }

        for field in spec.fields.values_mut() {
            amend_elements(field);
        }
        for segment in spec.segments.values_mut() {
            amend_elements(segment);
        }

        for document in extras {
            self.add_extras(document, &mut spec);
        }

        info!(
            composite_types = spec.composite_types.len(),
            segments = spec.segments.len(),
            message_types = spec.message_types.len(),
            fields = spec.fields.len(),
            "Finished processing specification"
        );

        apply_corrections(&mut spec, self.config.max_version);
        Ok(spec)
    }

    /// Classify the definitions of one version into the specification tables
    pub fn add_document(
        &self,
        document: SpecificationDocument,
        spec: &mut Specification,
    ) -> Result<()> {
        let version = document.version;
        let stamp = |mut c: TypeDefinition| {
            c.version = version.clone();
            c
        };

        for c in document.segments {
            if self.config.is_blocked(&c.name) {
                trace!("Skipping block-listed {}", c.name);
                continue;
            }
            let c = stamp(c);
            if c.is_segment() {
                if c.kind() == DefinitionKind::Segment {
                    spec.insert_segment(c);
                }
                continue;
            }
            if c.kind() != DefinitionKind::Field {
                return Err(Error::InvalidFormat(format!("Not a field name: {}", c.name)));
            }
            spec.insert_field(c);
        }

        for c in document.datatypes {
            if self.config.is_blocked(&c.name) {
                trace!("Skipping block-listed {}", c.name);
                continue;
            }
            let c = stamp(c);
            if c.is_composite() {
                spec.insert_composite_type(c.clone());
            }
            spec.insert_field(c);
        }

        for c in document.messages {
            if self.config.is_blocked(&c.name) {
                trace!("Skipping block-listed {}", c.name);
                continue;
            }
            let c = stamp(c);
            if c.is_segment() {
                spec.insert_message_type(c);
            }
        }

        debug!(version = %version, definitions = spec.len(), "Added document");
        Ok(())
    }

    /// Classify synthetic definitions into the specification tables
    pub fn add_extras(&self, document: ExtrasDocument, spec: &mut Specification) {
        for mut c in document.types {
            if self.config.is_blocked(&c.name) {
                continue;
            }
            c.version = SYNTHETIC_VERSION.to_string();
            match (c.is_segment(), c.kind()) {
                (true, DefinitionKind::Segment) => spec.insert_segment(c),
                (true, _) => spec.insert_message_type(c),
                (false, DefinitionKind::Field) => spec.insert_field(c),
                _ => trace!("Ignoring extra definition {}", c.name),
            }
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    trace!("Loading specification document: {:?}", path);
    Ok(std::fs::read_to_string(path)?)
}
