//! YAML parser for action mapping tables.
//!
//! This module parses a YAML table document into a map of
//! `type name -> ActionMapping` using the saphyr YAML library.

use std::collections::HashMap;

use saphyr::{LoadableYamlNode, Yaml};
use thiserror::Error;

use super::schema::ActionMapping;

/// Errors that can occur during YAML parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("Empty YAML document")]
    Empty,

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Parses YAML content into an action table.
///
/// # Example
///
/// ```ignore
/// let yaml = r#"
/// aws_ssm_parameter:
///   read:
///     - "ssm:GetParameter"
///   write:
///     - "ssm:PutParameter"
/// "#;
///
/// let table = parse_table(yaml).unwrap();
/// assert!(table.contains_key("aws_ssm_parameter"));
/// ```
pub fn parse_table(content: &str) -> Result<HashMap<String, ActionMapping>, ParseError> {
    let docs = Yaml::load_from_str(content).map_err(|e| ParseError::Yaml(e.to_string()))?;

    if docs.is_empty() {
        return Err(ParseError::Empty);
    }

    let doc = &docs[0];

    let mapping = doc.as_mapping().ok_or_else(|| {
        ParseError::InvalidStructure("Root document must be a mapping".to_string())
    })?;

    let mut entries = HashMap::new();

    for (key, value) in mapping {
        let type_name = match key.as_str() {
            Some(s) => s.to_string(),
            None => {
                return Err(ParseError::InvalidStructure(
                    "Type names must be strings".to_string(),
                ));
            }
        };

        entries.insert(type_name, parse_entry(value)?);
    }

    Ok(entries)
}

/// Parses one type's `read`/`write` action sets.
fn parse_entry(yaml: &Yaml) -> Result<ActionMapping, ParseError> {
    let mapping = yaml.as_mapping().ok_or_else(|| {
        ParseError::InvalidStructure("Each type entry must be a mapping".to_string())
    })?;

    let mut entry = ActionMapping::default();

    for (key, value) in mapping {
        match key.as_str() {
            Some("read") => entry.read = parse_action_list(value)?,
            Some("write") => entry.write = parse_action_list(value)?,
            Some(other) => {
                return Err(ParseError::InvalidStructure(format!(
                    "Unknown key {:?} in type entry (expected read/write)",
                    other
                )));
            }
            None => continue, // Skip non-string keys
        }
    }

    Ok(entry)
}

/// Parses a sequence of action name strings. Null means empty.
fn parse_action_list(yaml: &Yaml) -> Result<Vec<String>, ParseError> {
    if yaml.is_null() || yaml.is_badvalue() {
        return Ok(Vec::new());
    }

    if let Some(arr) = yaml.as_sequence() {
        return Ok(arr
            .iter()
            .filter_map(|v: &Yaml| v.as_str().map(|s| s.to_string()))
            .collect());
    }

    Err(ParseError::InvalidStructure(
        "Expected an array of action names".to_string(),
    ))
}
