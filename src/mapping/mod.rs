//! Action mapping tables and required-action derivation.
//!
//! The table maps Terraform type names to the IAM actions they require.
//! The builtin table ships embedded in the binary; `--mappings-file`
//! substitutes an external YAML document with the same schema. Derivation
//! walks the source model against the table and produces the deduplicated
//! required-action set.

pub mod deriver;
pub mod schema;
pub mod table;
pub mod yaml_parser;

pub use deriver::derive_required_actions;
pub use schema::ActionMapping;
pub use table::{ActionTable, MappingError};
