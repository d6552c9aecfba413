use std::path::{Path, PathBuf};

use crate::cli::{Cli, DuplicateModules, OutputFormat};
use crate::error::PermgapError;

#[derive(Debug)]
pub struct Config {
    pub no_color: bool,
    pub verbose: bool,
    pub target: PathBuf,
    pub output_file: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub mappings_file: Option<PathBuf>,
    pub duplicate_modules: DuplicateModules,
    pub max_concurrency: usize,
    pub principal_arn: Option<String>,
    pub requirements_only: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, PermgapError> {
        let target = match cli.target {
            Some(path) => Self::resolve_path(&path)?,
            None => std::env::current_dir().map_err(|e| {
                PermgapError::Config(format!("Cannot determine current directory: {}", e))
            })?,
        };

        // The target may be a single .tf file or a directory of them.
        if !target.exists() {
            return Err(PermgapError::Config(format!(
                "Target does not exist: {}",
                target.display()
            )));
        }

        // Canonicalize to resolve symlinks and normalize path components
        let target = target.canonicalize().map_err(|e| {
            PermgapError::Config(format!(
                "Cannot canonicalize target {}: {}",
                target.display(),
                e
            ))
        })?;

        if cli.max_concurrency == 0 {
            return Err(PermgapError::Config(
                "--max-concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(mappings_file) = &cli.mappings_file {
            if !mappings_file.is_file() {
                return Err(PermgapError::Config(format!(
                    "Mappings file does not exist: {}",
                    mappings_file.display()
                )));
            }
        }

        Ok(Self {
            no_color: cli.no_color,
            verbose: cli.verbose,
            target,
            output_file: cli.output_file,
            output_format: cli.output_format,
            mappings_file: cli.mappings_file,
            duplicate_modules: cli.duplicate_modules,
            max_concurrency: cli.max_concurrency,
            principal_arn: cli.principal_arn,
            requirements_only: cli.requirements_only,
        })
    }

    /// Resolves a path to an absolute path.
    /// - Absolute paths are returned as-is
    /// - Relative paths are resolved relative to current directory
    pub fn resolve_path(path: &Path) -> Result<PathBuf, PermgapError> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().map_err(|e| {
                PermgapError::Config(format!("Cannot determine current directory: {}", e))
            })?;
            Ok(current_dir.join(path))
        }
    }
}
