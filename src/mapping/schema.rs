//! Mapping schema types for action mapping tables.
//!
//! The table maps a Terraform resource/data-source type name to the IAM
//! actions it requires, split into read and write sets.

/// Actions required by one resource or data-source type.
///
/// `read` actions are needed to reference or observe the type; `write`
/// actions are needed to create or mutate it. Data-source blocks only ever
/// contribute the read set.
#[derive(Debug, Clone, Default)]
pub struct ActionMapping {
    /// Actions needed to read/observe the type
    pub read: Vec<String>,

    /// Actions needed to create/mutate the type
    pub write: Vec<String>,
}

impl ActionMapping {
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }
}
