use std::path::{Path, PathBuf};

use hcl::{Block, Body, Expression};
use log::{debug, warn};
use thiserror::Error;

use super::model::{BlockKind, BuildDiagnostics, DiscardedBlock, ModuleBlock, SourceBlock, SourceModel};
use crate::cli::DuplicateModules;

/// Maximum size for .tf files (10 MB) - prevents memory exhaustion from extremely large files.
const MAX_TF_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Builds a [`SourceModel`] from a Terraform file or directory.
///
/// The builder extracts resource, data and module blocks from .tf files.
/// A document that fails to parse is fatal; oversized files and
/// under-labeled blocks are tolerated and recorded in the diagnostics.
pub struct SourceModelBuilder {
    duplicate_modules: DuplicateModules,
}

impl SourceModelBuilder {
    pub fn new(duplicate_modules: DuplicateModules) -> Self {
        Self { duplicate_modules }
    }

    /// Parses the target path and returns the model with its build
    /// diagnostics.
    ///
    /// A file target is parsed directly. A directory target selects the
    /// `.tf` files directly inside it (no recursive walk), in file-name
    /// order so that duplicate-module handling is deterministic.
    pub fn build(&self, target: &Path) -> Result<(SourceModel, BuildDiagnostics), HclParseError> {
        let targets = if target.is_dir() {
            Self::collect_tf_files_in_dir(target)?
        } else {
            vec![target.to_path_buf()]
        };

        let mut model = SourceModel::new();
        let mut diagnostics = BuildDiagnostics::default();

        for file_path in targets {
            // Skip oversized files to prevent memory exhaustion
            if let Ok(metadata) = std::fs::metadata(&file_path) {
                if metadata.len() > MAX_TF_FILE_SIZE {
                    warn!(
                        "Skipping oversized .tf file ({} bytes): {:?}",
                        metadata.len(),
                        file_path
                    );
                    diagnostics.skipped_files.push(file_path);
                    continue;
                }
            }

            let content = std::fs::read_to_string(&file_path)
                .map_err(|e| HclParseError::Io(format!("{}: {}", file_path.display(), e)))?;

            let body: Body = hcl::from_str(&content)
                .map_err(|e| HclParseError::Hcl(format!("{}: {}", file_path.display(), e)))?;

            self.extract_from_body(&body, &file_path, &mut model, &mut diagnostics)?;
        }

        debug!(
            "Parsed {} resource/data blocks, {} modules, {} variables",
            model.block_count(),
            model.modules.len(),
            model.variables.len()
        );

        for discarded in &diagnostics.discarded_blocks {
            warn!(
                "Discarding {} block with labels {:?} in {:?}: type and name labels are required",
                discarded.kind.as_str(),
                discarded.labels,
                discarded.file
            );
        }

        Ok((model, diagnostics))
    }

    /// Collects all .tf files directly in a directory (not recursive),
    /// sorted by path.
    fn collect_tf_files_in_dir(dir: &Path) -> Result<Vec<PathBuf>, HclParseError> {
        let mut files = Vec::new();

        let entries = std::fs::read_dir(dir)
            .map_err(|e| HclParseError::Io(format!("{}: {}", dir.display(), e)))?;

        for entry in entries {
            let entry =
                entry.map_err(|e| HclParseError::Io(format!("{}: {}", dir.display(), e)))?;
            let path = entry.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "tf") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Extracts resource, data, module and variable blocks from one
    /// document body into the model.
    fn extract_from_body(
        &self,
        body: &Body,
        file: &Path,
        model: &mut SourceModel,
        diagnostics: &mut BuildDiagnostics,
    ) -> Result<(), HclParseError> {
        for block in body.blocks() {
            match block.identifier.as_str() {
                "resource" => {
                    Self::collect_source_block(block, BlockKind::Resource, file, model, diagnostics)
                }
                "data" => {
                    Self::collect_source_block(block, BlockKind::Data, file, model, diagnostics)
                }
                "module" => self.collect_module_block(block, file, model)?,
                "variable" => Self::collect_variable_default(block, model),
                // Known block kinds with no bearing on action derivation,
                // and anything unrecognized, are ignored without error.
                _ => {}
            }
        }

        Ok(())
    }

    /// Records a resource or data block, discarding it when the two
    /// required labels are not both present.
    fn collect_source_block(
        block: &Block,
        kind: BlockKind,
        file: &Path,
        model: &mut SourceModel,
        diagnostics: &mut BuildDiagnostics,
    ) {
        let labels: Vec<&str> = block.labels.iter().map(|l| l.as_str()).collect();

        if labels.len() < 2 {
            diagnostics.discarded_blocks.push(DiscardedBlock {
                kind,
                labels: labels.iter().map(|l| l.to_string()).collect(),
                file: file.to_path_buf(),
            });
            return;
        }

        let source_block = SourceBlock {
            kind,
            type_name: labels[0].to_string(),
            name: labels[1].to_string(),
            body: block.body().clone(),
            file: file.to_path_buf(),
        };

        debug!("Retained {}", source_block.address());

        let aggregate = match kind {
            BlockKind::Resource => &mut model.resources,
            BlockKind::Data => &mut model.data_sources,
        };
        aggregate
            .entry(source_block.type_name.clone())
            .or_default()
            .push(source_block);
    }

    /// Records a module block, applying the duplicate-name policy when a
    /// module of the same name was already declared.
    fn collect_module_block(
        &self,
        block: &Block,
        file: &Path,
        model: &mut SourceModel,
    ) -> Result<(), HclParseError> {
        let Some(name) = block.labels.first().map(|l| l.as_str().to_string()) else {
            // A module block without a name label cannot be addressed at all.
            warn!("Discarding unnamed module block in {:?}", file);
            return Ok(());
        };

        let module = ModuleBlock {
            name: name.clone(),
            source: Self::get_expression_as_string(block.body(), "source"),
            file: file.to_path_buf(),
        };

        match model.modules.get_mut(&name) {
            None => {
                model.modules.insert(name, vec![module]);
            }
            Some(existing) => match self.duplicate_modules {
                DuplicateModules::Override => {
                    debug!(
                        "Module {:?} redeclared in {:?}, overriding earlier declaration",
                        name, file
                    );
                    *existing = vec![module];
                }
                DuplicateModules::Merge => existing.push(module),
                DuplicateModules::Error => {
                    return Err(HclParseError::DuplicateModule(name));
                }
            },
        }

        Ok(())
    }

    /// Harvests a variable's string `default` into the eval context.
    fn collect_variable_default(block: &Block, model: &mut SourceModel) {
        let Some(name) = block.labels.first().map(|l| l.as_str()) else {
            return;
        };

        if let Some(default) = Self::get_string_attr(block.body(), "default") {
            model.variables.insert(name.to_string(), default);
        }
    }

    /// Gets a string attribute value, returning None if it contains interpolation.
    fn get_string_attr(body: &Body, name: &str) -> Option<String> {
        body.attributes()
            .find(|a| a.key.as_str() == name)
            .and_then(|a| {
                if let Expression::String(s) = &a.expr {
                    Some(s.clone())
                } else {
                    None
                }
            })
    }

    /// Gets an expression as its string representation (preserves interpolation syntax).
    fn get_expression_as_string(body: &Body, name: &str) -> Option<String> {
        body.attributes()
            .find(|a| a.key.as_str() == name)
            .map(|a| Self::expression_to_string(&a.expr))
    }

    /// Converts an HCL expression to its string representation.
    /// For templates with interpolation, returns the full template string.
    fn expression_to_string(expr: &Expression) -> String {
        match expr {
            Expression::String(s) => s.clone(),
            Expression::TemplateExpr(t) => {
                // Template expressions contain interpolation like ${var.foo}
                // We serialize them back to their original form
                format!("{}", t)
            }
            _ => format!("{:?}", expr), // Fallback for complex expressions
        }
    }
}

#[derive(Debug, Error)]
pub enum HclParseError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("HCL parse error: {0}")]
    Hcl(String),

    #[error("Module {0:?} declared more than once (see --duplicate-modules)")]
    DuplicateModule(String),
}
