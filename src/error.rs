use thiserror::Error;

use crate::iam::identity::IdentityError;
use crate::iam::simulator::SimulationError;
use crate::iam::store::StoreError;
use crate::mapping::MappingError;
use crate::output::OutputError;
use crate::terraform::HclParseError;

#[derive(Error, Debug)]
pub enum PermgapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] HclParseError),

    #[error("Mapping table error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Identity resolution failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Policy aggregation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Policy simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub type Result<T> = std::result::Result<T, PermgapError>;
