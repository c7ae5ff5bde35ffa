use thiserror::Error;

use gw_core::AgentId;
use gw_model::ModelError;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("peer {0} is not on the peer board")]
    UnknownPeer(AgentId),

    #[error("peer {peer} has {got} fields, expected {expected}")]
    IncompatiblePeer { peer: AgentId, expected: usize, got: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl BehaviorError {
    /// `true` for an infeasible solve, which the policy may skip over.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, BehaviorError::Model(ModelError::Infeasible { .. }))
    }
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
