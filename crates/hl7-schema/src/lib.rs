//! # hl7-schema
//!
//! Specification model, document loader, and scripted corrections for HL7v2.
//!
//! Definitions are loaded version by version (oldest first), so the most recent
//! definition of each segment, field, datatype and message type wins. After
//! loading, a handful of known schema defects are corrected before the
//! specification is handed to the grammar compiler.

pub mod corrections;
pub mod loader;
pub mod model;
pub mod registry;
pub mod version;

pub use loader::{LoaderConfig, SpecificationDocument, SpecificationLoader};
pub use model::{DefinitionKind, Element, TypeDefinition};
pub use registry::Specification;
pub use version::{sortable_version, version_name};

use thiserror::Error;

/// Errors that can occur when loading a specification
#[derive(Error, Debug)]
pub enum Error {
    #[error("Specification document not found: {0}")]
    NotFound(String),

    #[error("Invalid specification format: {0}")]
    InvalidFormat(String),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
