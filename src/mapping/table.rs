//! The static action mapping table.
//!
//! The table is loaded once at startup, either from the embedded builtin
//! document or from an operator-supplied YAML file, and is immutable
//! thereafter. It is passed by reference wherever a lookup is needed so
//! tests can inject synthetic tables.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::schema::ActionMapping;
use super::yaml_parser::{self, ParseError};

/// The builtin table, embedded at compile time.
const BUILTIN_TABLE: &str = include_str!("builtin.yaml");

/// Maximum mappings file size (1 MB) to prevent resource exhaustion.
const MAX_TABLE_FILE_SIZE: u64 = 1024 * 1024;

/// Errors that can occur while loading a mapping table.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {0}: {1}")]
    Parse(String, ParseError),

    #[error("Mappings file too large: {0}")]
    FileTooLarge(String),
}

/// Immutable lookup from type name to its required actions.
///
/// Absence of an entry is not an error: the type contributes nothing to
/// the derived requirement and is reported as unmapped.
#[derive(Debug)]
pub struct ActionTable {
    entries: HashMap<String, ActionMapping>,
}

impl ActionTable {
    /// Creates a table from pre-built entries (used by tests to inject
    /// synthetic tables).
    pub fn new(entries: HashMap<String, ActionMapping>) -> Self {
        Self { entries }
    }

    /// The embedded builtin table.
    pub fn builtin() -> Self {
        let entries =
            yaml_parser::parse_table(BUILTIN_TABLE).expect("builtin mapping table must parse");
        Self { entries }
    }

    /// Loads the table from an external YAML file.
    pub fn from_file(path: &Path) -> Result<Self, MappingError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_TABLE_FILE_SIZE {
            return Err(MappingError::FileTooLarge(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let entries = yaml_parser::parse_table(&content)
            .map_err(|e| MappingError::Parse(path.display().to_string(), e))?;

        log::debug!("Loaded {} mapping entries from {:?}", entries.len(), path);

        Ok(Self { entries })
    }

    /// Loads an external table when a path is given, the builtin one
    /// otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, MappingError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&ActionMapping> {
        self.entries.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
