//! Harness error taxonomy.
//!
//! Only failures that invalidate a whole run are errors here. A node
//! that fails to join is logged and left out of the mesh; a packet that
//! never arrives is a statistic. Both are reported, not raised.

use thiserror::Error;

use crate::nwk::NwkStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// The coordinator could not form a network. Nothing downstream can run.
    #[error("network formation failed: {0}")]
    FormationFailed(NwkStatus),

    /// A node's discovery scan found nothing to join.
    #[error("node {node}: network discovery failed: {status}")]
    DiscoveryFailed { node: usize, status: NwkStatus },

    /// A node index outside the scenario's population.
    #[error("unknown node index {0}")]
    UnknownNode(usize),

    /// The scenario description is internally inconsistent.
    #[error("invalid scenario: {0}")]
    InvalidConfig(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
