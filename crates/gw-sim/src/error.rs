use thiserror::Error;

use gw_agent::AgentError;
use gw_core::AgentId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("farmer at position {position} has id {got}; ids must run 0..n in order")]
    AgentOrder { position: usize, got: AgentId },

    #[error("agent {agent} lists unknown peer {peer}")]
    UnknownPeer { agent: AgentId, peer: AgentId },

    #[error("agent {agent} failed to bootstrap: {source}")]
    Bootstrap {
        agent:  AgentId,
        #[source]
        source: AgentError,
    },

    #[error("aquifer {id:?} failed to step: {source}")]
    Aquifer {
        id:     String,
        #[source]
        source: AgentError,
    },

    #[error("agent {0} not found")]
    UnknownAgent(AgentId),
}

pub type SimResult<T> = Result<T, SimError>;
