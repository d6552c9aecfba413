//! Terraform source model building.
//!
//! This module parses `.tf` documents into a queryable model of the
//! resource, data-source and module blocks they declare. The model is the
//! sole input of action derivation; nothing here talks to AWS.

pub mod model;
pub mod parser;

pub use model::{BlockKind, BuildDiagnostics, ModuleBlock, SourceBlock, SourceModel};
pub use parser::{HclParseError, SourceModelBuilder};
