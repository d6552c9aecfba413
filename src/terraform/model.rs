use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Kind of a declared Terraform block that participates in action
/// derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Resource,
    Data,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Resource => "resource",
            BlockKind::Data => "data",
        }
    }
}

/// A single resource or data-source block retained in the model.
///
/// Blocks are immutable once parsed. The attribute body is kept raw; it is
/// never evaluated during action derivation.
#[derive(Debug, Clone)]
pub struct SourceBlock {
    /// Whether this is a `resource` or a `data` block
    pub kind: BlockKind,

    /// Type name, e.g., "aws_ssm_parameter"
    pub type_name: String,

    /// Name label, e.g., "main"
    pub name: String,

    /// Raw HCL attribute body
    pub body: hcl::Body,

    /// File the block was parsed from
    pub file: PathBuf,
}

impl SourceBlock {
    /// Full address of this block, e.g., "aws_ssm_parameter.main" or
    /// "data.aws_ssm_parameter.lookup".
    pub fn address(&self) -> String {
        match self.kind {
            BlockKind::Resource => format!("{}.{}", self.type_name, self.name),
            BlockKind::Data => format!("data.{}.{}", self.type_name, self.name),
        }
    }
}

/// A `module` block. Only the name and the raw `source` attribute are
/// retained; module bodies do not contribute to action derivation.
#[derive(Debug, Clone)]
pub struct ModuleBlock {
    /// Name label of the module block
    pub name: String,

    /// Raw `source` attribute. Interpolation syntax like `${var.x}` is
    /// preserved; see [`SourceModel::resolved_module_source`].
    pub source: Option<String>,

    /// File the block was parsed from
    pub file: PathBuf,
}

/// The parsed source model of a Terraform configuration.
///
/// Resources and data sources are keyed by type name, modules by their
/// name label. Every retained [`SourceBlock`] carries both of its labels;
/// under-labeled blocks are discarded during construction and recorded in
/// [`BuildDiagnostics`].
#[derive(Debug, Default)]
pub struct SourceModel {
    /// Resource blocks, keyed by type name
    pub resources: HashMap<String, Vec<SourceBlock>>,

    /// Data-source blocks, keyed by type name
    pub data_sources: HashMap<String, Vec<SourceBlock>>,

    /// Module blocks, keyed by module name
    pub modules: HashMap<String, Vec<ModuleBlock>>,

    /// Variable defaults harvested from `variable` blocks. Used only to
    /// resolve module `source` attributes for reporting.
    pub variables: HashMap<String, String>,
}

impl SourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the model contains no resource or data-source blocks.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.data_sources.is_empty()
    }

    /// Number of retained resource and data-source blocks.
    pub fn block_count(&self) -> usize {
        self.resources.values().map(Vec::len).sum::<usize>()
            + self.data_sources.values().map(Vec::len).sum::<usize>()
    }

    /// All distinct (kind, type name) pairs present in the model.
    pub fn observed_types(&self) -> Vec<(BlockKind, &str)> {
        self.resources
            .keys()
            .map(|t| (BlockKind::Resource, t.as_str()))
            .chain(
                self.data_sources
                    .keys()
                    .map(|t| (BlockKind::Data, t.as_str())),
            )
            .collect()
    }

    /// Resolves a module's `source` attribute against the variable
    /// defaults, substituting `${var.name}` interpolations. Unresolvable
    /// references are left in place.
    pub fn resolved_module_source(&self, module: &ModuleBlock) -> Option<String> {
        static VAR_REF: OnceLock<Regex> = OnceLock::new();

        let source = module.source.as_deref()?;
        let re = VAR_REF
            .get_or_init(|| Regex::new(r"\$\{var\.([A-Za-z0-9_-]+)\}").expect("valid pattern"));

        let resolved = re.replace_all(source, |caps: &regex::Captures| {
            match self.variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        });

        Some(resolved.into_owned())
    }
}

/// Non-fatal findings produced while building a [`SourceModel`].
///
/// Discarded blocks and skipped files mean the derived requirement is an
/// under-approximation; callers surface them to the operator.
#[derive(Debug, Default)]
pub struct BuildDiagnostics {
    /// Blocks dropped for missing labels
    pub discarded_blocks: Vec<DiscardedBlock>,

    /// Files skipped without being parsed (e.g., oversized)
    pub skipped_files: Vec<PathBuf>,
}

impl BuildDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.discarded_blocks.is_empty() && self.skipped_files.is_empty()
    }
}

/// A resource or data block discarded for carrying fewer than two labels.
#[derive(Debug, Clone)]
pub struct DiscardedBlock {
    pub kind: BlockKind,

    /// Whatever labels the block did carry
    pub labels: Vec<String>,

    pub file: PathBuf,
}
