//! Gap analysis.
//!
//! Submits the derived required-action set to a policy simulator and
//! interprets the per-action decisions into a report. The analyzer never
//! evaluates policy grammar itself and never retries: a simulation
//! failure produces no report at all, because an absent verdict must
//! never read as "allowed".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use log::debug;

use crate::iam::{PolicySimulator, PrincipalIdentity, SimulationError, Verdict};
use crate::mapping::ActionTable;
use crate::terraform::{BlockKind, BuildDiagnostics, SourceModel};

/// A declared type with no action mapping entry.
///
/// Unmapped types contribute nothing to the derived requirement, so their
/// presence means the requirement set is an under-approximation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedType {
    pub kind: BlockKind,
    pub type_name: String,
}

impl UnmappedType {
    /// Display label, e.g. "aws_foo" or "data.aws_foo".
    pub fn label(&self) -> String {
        match self.kind {
            BlockKind::Resource => self.type_name.clone(),
            BlockKind::Data => format!("data.{}", self.type_name),
        }
    }
}

/// The result of one analysis run.
#[derive(Debug)]
pub struct GapReport {
    pub principal_arn: String,

    /// Per-action verdicts, keyed by action name
    pub verdicts: BTreeMap<String, Verdict>,

    /// Types in the model without a mapping entry
    pub unmapped_types: Vec<UnmappedType>,

    /// Malformed blocks discarded while building the model
    pub discarded_blocks: usize,

    pub generated_at: DateTime<Utc>,
}

impl GapReport {
    /// (allowed, denied, indeterminate) counts.
    pub fn verdict_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for verdict in self.verdicts.values() {
            match verdict {
                Verdict::Allowed => counts.0 += 1,
                Verdict::Denied => counts.1 += 1,
                Verdict::Indeterminate => counts.2 += 1,
            }
        }
        counts
    }

    /// True when the requirement side is known to be incomplete.
    pub fn has_caveats(&self) -> bool {
        !self.unmapped_types.is_empty() || self.discarded_blocks > 0
    }
}

/// Computes the declared types absent from the mapping table, sorted for
/// stable reporting.
pub fn unmapped_types(model: &SourceModel, table: &ActionTable) -> Vec<UnmappedType> {
    let mut unmapped: Vec<UnmappedType> = model
        .observed_types()
        .into_iter()
        .filter(|(_, type_name)| !table.contains(type_name))
        .map(|(kind, type_name)| UnmappedType {
            kind,
            type_name: type_name.to_string(),
        })
        .collect();

    unmapped.sort_by(|a, b| {
        (a.kind, a.type_name.as_str()).cmp(&(b.kind, b.type_name.as_str()))
    });
    unmapped
}

/// Reconciles required vs. effective permissions through a simulator.
pub struct GapAnalyzer<'a, S: PolicySimulator> {
    simulator: &'a S,
}

impl<'a, S: PolicySimulator> GapAnalyzer<'a, S> {
    pub fn new(simulator: &'a S) -> Self {
        Self { simulator }
    }

    /// Produces the gap report for one principal.
    ///
    /// An empty required set short-circuits without a simulation call.
    pub async fn analyze(
        &self,
        required: &BTreeSet<String>,
        model: &SourceModel,
        table: &ActionTable,
        identity: &PrincipalIdentity,
        diagnostics: &BuildDiagnostics,
    ) -> Result<GapReport, SimulationError> {
        let unmapped = unmapped_types(model, table);

        let mut verdicts = BTreeMap::new();

        if required.is_empty() {
            debug!("No required actions, skipping simulation");
        } else {
            let actions: Vec<String> = required.iter().cloned().collect();
            let decisions = self.simulator.simulate(&identity.arn, &actions).await?;

            debug!(
                "Simulator returned {} decision(s) for {} action(s)",
                decisions.len(),
                actions.len()
            );

            for decision in decisions {
                verdicts.insert(decision.action, decision.verdict);
            }

            // Fail closed: an action the simulator did not decide stays
            // indeterminate rather than disappearing from the report.
            for action in required {
                verdicts
                    .entry(action.clone())
                    .or_insert(Verdict::Indeterminate);
            }
        }

        Ok(GapReport {
            principal_arn: identity.arn.clone(),
            verdicts,
            unmapped_types: unmapped,
            discarded_blocks: diagnostics.discarded_blocks.len(),
            generated_at: Utc::now(),
        })
    }
}
