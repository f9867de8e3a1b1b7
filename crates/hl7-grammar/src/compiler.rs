//! Message compilation driver
//!
//! Runs the grammar passes over message type definitions: raw group
//! construction, subgroup inlining, name resolution and follow-set analysis.

use crate::builder::build_group;
use crate::follow::{FollowSets, compute_all};
use crate::inline::inline_subgroups;
use crate::naming::resolve_names;
use crate::{Error, Group, Result};
use hl7_schema::{Specification, TypeDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// References that stand for "any other segment" and never become elements
pub const DEFAULT_CATCH_ALL_REFERENCES: &[&str] = &["anyZSegment", "anyHL7Segment", "IsHL7DataType"];

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// References skipped while building groups
    pub catch_all_references: Vec<String>,

    /// Also compile message subtypes as standalone messages
    pub include_subtypes: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            catch_all_references: DEFAULT_CATCH_ALL_REFERENCES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            include_subtypes: false,
        }
    }
}

impl CompilerConfig {
    /// Create a configuration with the default catch-all references
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catch-all reference
    pub fn catch_all(mut self, reference: impl Into<String>) -> Self {
        self.catch_all_references.push(reference.into());
        self
    }

    /// Set whether message subtypes are compiled on their own
    pub fn include_subtypes(mut self, include: bool) -> Self {
        self.include_subtypes = include;
        self
    }

    pub fn is_catch_all(&self, reference: &str) -> bool {
        self.catch_all_references.iter().any(|r| r == reference)
    }
}

/// A message type after every grammar pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledMessage {
    /// The inlined, named group tree
    pub group: Group,

    /// Follow sets of every segment element in the tree
    pub follow_sets: FollowSets,
}

/// The result of compiling a whole specification
#[derive(Debug, Clone, Default, Serialize)]
pub struct Compilation {
    /// Compiled messages by message type name, e.g. `ADT_A01`
    pub messages: BTreeMap<String, CompiledMessage>,

    /// Follow sets of every compiled message, merged
    pub follow_sets: FollowSets,
}

/// Compiles message type definitions of a specification into group trees
/// and follow sets.
pub struct MessageCompiler<'s> {
    spec: &'s Specification,
    config: CompilerConfig,
}

impl<'s> MessageCompiler<'s> {
    pub fn new(spec: &'s Specification) -> Self {
        Self::with_config(spec, CompilerConfig::default())
    }

    pub fn with_config(spec: &'s Specification, config: CompilerConfig) -> Self {
        Self { spec, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one message type definition.
    ///
    /// # Errors
    ///
    /// Fails if the definition, or a message subtype it refers to, holds a
    /// reference that cannot be resolved.
    pub fn compile_message(&self, definition: &TypeDefinition) -> Result<CompiledMessage> {
        let mut group = build_group(definition, self.spec, &self.config)?;
        inline_subgroups(&mut group);
        resolve_names(&mut group);
        let follow_sets = compute_all(&group);

        debug!(
            message = %group.name,
            elements = group.elements.len(),
            follow_sets = follow_sets.len(),
            "Compiled message"
        );
        Ok(CompiledMessage { group, follow_sets })
    }

    /// Compile the message type called `name`, e.g. `ADT_A01`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDefinition`] if there is no such message type.
    pub fn compile_named(&self, name: &str) -> Result<CompiledMessage> {
        let definition = self
            .spec
            .message_type(name)
            .ok_or_else(|| Error::MissingDefinition {
                name: name.to_string(),
            })?;
        self.compile_message(definition)
    }

    /// Compile every top-level message type (and, if configured, every
    /// message subtype) in name order.
    ///
    /// # Errors
    ///
    /// Stops at the first message that fails to compile.
    pub fn compile_all(&self) -> Result<Compilation> {
        let definitions: Vec<&TypeDefinition> = if self.config.include_subtypes {
            self.spec.message_types.values().collect()
        } else {
            self.spec.top_level_message_types().collect()
        };

        let mut compilation = Compilation::default();
        for definition in definitions {
            let compiled = self.compile_message(definition)?;
            compilation.follow_sets.merge(compiled.follow_sets.clone());
            compilation
                .messages
                .insert(compiled.group.name.clone(), compiled);
        }

        info!(
            messages = compilation.messages.len(),
            follow_sets = compilation.follow_sets.len(),
            "Compiled specification"
        );
        Ok(compilation)
    }
}
