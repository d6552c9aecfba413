//! IAM-facing components.
//!
//! Identity resolution, the policy store contract and its AWS-backed
//! implementation, effective-permission aggregation, and the policy
//! simulation contract. The aggregation and analysis cores only ever see
//! the [`store::PolicyStore`] and [`simulator::PolicySimulator`] traits,
//! so tests run against in-memory implementations.

pub mod aggregator;
pub mod aws;
pub mod identity;
pub mod simulator;
pub mod store;

pub use aggregator::{
    EffectivePermissionSet, PermissionAggregator, PolicyDocument, PolicyProvenance,
};
pub use aws::{AwsPolicySimulator, AwsPolicyStore};
pub use identity::PrincipalIdentity;
pub use simulator::{ActionDecision, PolicySimulator, SimulationError, Verdict};
pub use store::{ManagedPolicyRef, Page, PolicyStore, StoreError};
