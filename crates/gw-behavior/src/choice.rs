use serde::{Deserialize, Serialize};

use gw_model::{FieldSolution, Solution};

/// The discrete choices made on one field: what peers observe and copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDecision {
    /// Crop per sub-area.
    pub crops:   Vec<String>,
    /// Rain-fed flag per sub-area.
    pub rainfed: Vec<bool>,
    pub tech:    String,
}

impl FieldDecision {
    pub fn from_field(f: &FieldSolution) -> Self {
        Self { crops: f.crops.clone(), rainfed: f.rainfed.clone(), tech: f.tech.clone() }
    }

    /// Per-field choices of a solution, in field order.
    pub fn all_from(solution: &Solution) -> Vec<FieldDecision> {
        solution.fields.iter().map(Self::from_field).collect()
    }
}
