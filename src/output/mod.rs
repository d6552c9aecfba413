//! Report output.
//!
//! Formats the gap report (or, in requirements-only mode, the bare
//! requirement listing) and writes it to stdout or a file.

pub mod formatter;
pub mod json;
pub mod plain;

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::analyzer::{GapReport, UnmappedType};
use crate::cli::OutputFormat;
use crate::iam::EffectivePermissionSet;
use crate::terraform::BuildDiagnostics;
use formatter::create_formatter;

/// Errors that can occur during output generation.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes reports to stdout or a file.
pub struct OutputWriter {
    format: OutputFormat,
    output_file: Option<PathBuf>,
    no_color: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, output_file: Option<PathBuf>, no_color: bool) -> Self {
        Self {
            format,
            output_file,
            no_color,
        }
    }

    /// Color is used only for plain output on stdout.
    fn use_color(&self) -> bool {
        !self.no_color && self.output_file.is_none()
    }

    /// Writes the full gap report.
    pub fn write(
        &self,
        report: &GapReport,
        effective: &EffectivePermissionSet,
    ) -> Result<(), OutputError> {
        let formatter = create_formatter(self.format, self.use_color());
        self.emit(formatter.format(report, effective))
    }

    /// Writes the requirements-only listing: the derived actions plus the
    /// completeness caveats, without any verdicts.
    pub fn write_requirements(
        &self,
        required: &BTreeSet<String>,
        unmapped: &[UnmappedType],
        diagnostics: &BuildDiagnostics,
    ) -> Result<(), OutputError> {
        for unmapped_type in unmapped {
            log::warn!("No action mapping entry for: {}", unmapped_type.label());
        }
        if !diagnostics.discarded_blocks.is_empty() {
            log::warn!(
                "{} malformed block(s) discarded during parsing",
                diagnostics.discarded_blocks.len()
            );
        }

        let output = match self.format {
            OutputFormat::Plain => {
                let mut lines: Vec<&str> = required.iter().map(String::as_str).collect();
                lines.sort_unstable();
                let mut out = lines.join("\n");
                if !out.is_empty() {
                    out.push('\n');
                }
                out
            }
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct Requirements<'a> {
                    required_actions: Vec<&'a str>,
                    unmapped_types: Vec<String>,
                    discarded_blocks: usize,
                }

                let document = Requirements {
                    required_actions: required.iter().map(String::as_str).collect(),
                    unmapped_types: unmapped.iter().map(|u| u.label()).collect(),
                    discarded_blocks: diagnostics.discarded_blocks.len(),
                };

                let mut out = serde_json::to_string_pretty(&document)
                    .expect("JSON serialization should not fail");
                out.push('\n');
                out
            }
        };

        self.emit(output)
    }

    fn emit(&self, output: String) -> Result<(), OutputError> {
        match &self.output_file {
            Some(path) => {
                fs::write(path, output)?;
                log::info!("Report written to {:?}", path);
                Ok(())
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(output.as_bytes())?;
                Ok(())
            }
        }
    }
}
