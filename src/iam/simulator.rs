//! Policy simulation contract.
//!
//! The gap analyzer never evaluates policy grammar itself; it submits the
//! required actions to a simulator and interprets the per-action
//! decisions. The AWS implementation lives in [`super::aws`].

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of simulating one action for a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied,
    /// The simulation could not decide, e.g. because the action's
    /// evaluation depends on condition context that is unavailable
    /// without a concrete resource.
    Indeterminate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Denied => "denied",
            Verdict::Indeterminate => "indeterminate",
        }
    }
}

/// One simulated action with its verdict.
#[derive(Debug, Clone)]
pub struct ActionDecision {
    pub action: String,
    pub verdict: Verdict,
}

/// Errors raised by a simulator. A simulation failure aborts the
/// analysis; no report is produced from partial results.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{0}")]
    Api(String),
}

/// Evaluates whether a principal's aggregated policies allow a set of
/// actions.
#[async_trait]
pub trait PolicySimulator: Send + Sync {
    /// Returns one decision per submitted action.
    async fn simulate(
        &self,
        principal_arn: &str,
        actions: &[String],
    ) -> Result<Vec<ActionDecision>, SimulationError>;
}
