//! Persistent per-farmer state and its serializable snapshot.

use serde::{Deserialize, Serialize};

use gw_behavior::{DecisionMode, FieldDecision, Thresholds};
use gw_core::{AgentId, Year};
use gw_model::{Solution, WaterRightSpec};

use crate::{AgentError, AgentResult, NeedsTable};

/// Everything a farmer carries from one year to the next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// The last realized year.
    pub year:          Year,
    /// Mode the next decision runs.
    pub mode:          DecisionMode,
    pub thresholds:    Thresholds,
    pub satisfaction:  f64,
    /// `Sa` forecast of the eval metric by the last adopted solve.
    pub expected_sa:   f64,
    pub uncertainty:   f64,
    pub needs:         NeedsTable,
    /// The last adopted solution.
    pub solution:      Solution,
    /// Realized discrete choices, one per field.  What peers see.
    pub choices:       Vec<FieldDecision>,
    /// Best peer of the last social comparison.
    pub selected_peer: Option<AgentId>,
    /// Water rights with their carry-over after the last realized year.
    pub water_rights:  Vec<WaterRightSpec>,
}

/// A farmer's state, tagged with its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmerSnapshot {
    pub agent: AgentId,
    pub state: AgentState,
}

impl FarmerSnapshot {
    pub fn to_json(&self) -> AgentResult<String> {
        serde_json::to_string(self).map_err(|e| AgentError::Snapshot(e.to_string()))
    }

    pub fn from_json(s: &str) -> AgentResult<Self> {
        serde_json::from_str(s).map_err(|e| AgentError::Snapshot(e.to_string()))
    }
}
