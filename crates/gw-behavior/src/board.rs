//! Read-only registry of the previous year's finalized peer choices.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use gw_core::AgentId;

use crate::{BehaviorError, BehaviorResult, FieldDecision};

/// What an agent publishes to its peers at the end of a year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub choices: Vec<FieldDecision>,
}

/// Built once per year before the decision phase; immutable during it.
#[derive(Clone, Debug, Default)]
pub struct PeerBoard {
    records: FxHashMap<AgentId, PeerRecord>,
}

impl PeerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, agent: AgentId, record: PeerRecord) {
        self.records.insert(agent, record);
    }

    pub fn get(&self, agent: AgentId) -> Option<&PeerRecord> {
        self.records.get(&agent)
    }

    pub fn lookup(&self, agent: AgentId) -> BehaviorResult<&PeerRecord> {
        self.get(agent).ok_or(BehaviorError::UnknownPeer(agent))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(AgentId, PeerRecord)> for PeerBoard {
    fn from_iter<I: IntoIterator<Item = (AgentId, PeerRecord)>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
