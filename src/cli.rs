use std::path::PathBuf;

use clap::Parser;

/// Permission Gap Analyzer
///
/// Derives the AWS IAM actions a Terraform configuration needs and checks
/// them against a principal's effective permissions using the IAM policy
/// simulator.
///
/// DISCLAIMER: The derived action set is a lower bound. Resource types
/// without a mapping entry contribute nothing and are listed as unmapped;
/// review the caveats section of the report before trusting a clean result.
#[derive(Parser, Debug)]
#[command(name = "permgap")]
#[command(version)]
#[command(about, long_about)]
pub struct Cli {
    /// Suppress colored output (useful for CI/CD pipelines)
    #[arg(short = 'n', long = "no-color")]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Terraform file or directory to analyze
    #[arg(short = 'd', long = "target")]
    pub target: Option<PathBuf>,

    /// File to write the report to instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Output format: plain, json
    #[arg(short = 'f', long = "output-format", default_value = "plain")]
    pub output_format: OutputFormat,

    /// YAML file overriding the builtin action mapping table
    #[arg(short = 'm', long = "mappings-file")]
    pub mappings_file: Option<PathBuf>,

    /// How to treat duplicate module names across files
    #[arg(long = "duplicate-modules", default_value = "override")]
    pub duplicate_modules: DuplicateModules,

    /// Maximum number of concurrent per-group policy fetches
    #[arg(long = "max-concurrency", default_value_t = 4)]
    pub max_concurrency: usize,

    /// Analyze this principal instead of the caller identity
    #[arg(long = "principal-arn", env = "PERMGAP_PRINCIPAL_ARN")]
    pub principal_arn: Option<String>,

    /// Stop after deriving required actions; no AWS calls are made
    #[arg(long = "requirements-only")]
    pub requirements_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Merge policy for module blocks declared under the same name in more
/// than one document of a directory scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicateModules {
    /// Last declaration wins
    #[default]
    Override,
    /// Duplicate names fail the build
    Error,
    /// All declarations are kept
    Merge,
}
