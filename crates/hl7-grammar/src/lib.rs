//! # hl7-grammar
//!
//! Compiles HL7v2 message type definitions into nested group trees and the
//! follow sets a tolerant message parser needs.
//!
//! ## Passes
//!
//! 1. **Build**: mirror a message type definition as a raw group tree
//! 2. **Inline**: splice non-repeating, non-colliding nested groups into their parents
//! 3. **Name**: give every element a unique name and every group a unique type name
//! 4. **Follow sets**: for each segment, compute the segments that may come next
//!
//! [`MessageCompiler`] runs all four over one message type or a whole
//! specification.

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

/// Raw group construction from definitions
pub mod builder;

/// Compilation driver and configuration
pub mod compiler;

/// Follow-set analysis
pub mod follow;

/// Group tree types
pub mod group;

/// Subgroup inlining
pub mod inline;

/// Element and group naming
pub mod naming;

/// Paths and depth-first traversal
pub mod path;

pub use builder::build_group;
pub use compiler::{Compilation, CompiledMessage, CompilerConfig, MessageCompiler};
pub use follow::{FollowSet, FollowSets, compute_all, compute_one};
pub use group::{ElementKind, Group, GroupElement, collect_groups};
pub use inline::inline_subgroups;
pub use naming::{deduplicate, key_segment, resolve_names};
pub use path::{GroupPath, PathFrame, walk};

use thiserror::Error;

/// Errors that can occur while compiling message types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unresolved reference '{reference}' in {group}")]
    UnresolvedReference { group: String, reference: String },

    #[error("Message type '{reference}' refers back to itself")]
    CyclicReference { reference: String },

    #[error("No message type named '{name}'")]
    MissingDefinition { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
