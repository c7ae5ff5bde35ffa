use thiserror::Error;

use gw_behavior::BehaviorError;
use gw_core::{AgentId, CoreError, Year};
use gw_model::ModelError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid farmer profile: {0}")]
    Profile(String),

    #[error("aquifer {0:?} is not registered")]
    UnknownAquifer(String),

    /// A field, well, finance or aquifer step failed.
    #[error("{what} failed: {message}")]
    Collaborator { what: String, message: String },

    /// A collaborator failed after realization of `year` had started.  The
    /// farmer's state is unchanged; `stepped` lists the collaborators that
    /// had already advanced a year.
    #[error("realizing {year} failed after {stepped:?} stepped: {source}")]
    Realization {
        year:    Year,
        stepped: Vec<String>,
        #[source]
        source:  Box<AgentError>,
    },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("snapshot belongs to agent {got}, not {expected}")]
    SnapshotMismatch { expected: AgentId, got: AgentId },

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AgentError {
    /// Shorthand for collaborator implementations.
    pub fn collaborator(what: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::Collaborator { what: what.into(), message: message.into() }
    }

    /// `true` if the underlying solve was infeasible.
    pub fn is_infeasible(&self) -> bool {
        match self {
            AgentError::Behavior(e) => e.is_infeasible(),
            AgentError::Model(ModelError::Infeasible { .. }) => true,
            _ => false,
        }
    }

    /// The extracted conflict, if diagnostics were requested and found one.
    pub fn conflict(&self) -> Option<&gw_model::Conflict> {
        match self {
            AgentError::Behavior(BehaviorError::Model(ModelError::Infeasible { conflict }))
            | AgentError::Model(ModelError::Infeasible { conflict }) => conflict.as_ref(),
            _ => None,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
