//! What a single solve should pin, and the trait that runs it.

use gw_core::AgentId;
use gw_model::Solution;

use crate::{BehaviorResult, FieldDecision};

/// Which discrete decisions are pinned to the supplied choices.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PinSet {
    /// Crop, rain-fed flag and technology pinned: optimize irrigation only.
    All,
    /// Crop and technology pinned; rain-fed flags optimized.
    CropAndTech,
    /// Nothing pinned.
    None,
}

/// Which precipitation the solve plans with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PrecipitationBasis {
    /// The observed precipitation of the year (initialization run).
    Observed,
    /// The agent's perceived forecast.
    Perceived,
}

/// One model build + solve requested by the policy.
#[derive(Clone, Copy, Debug)]
pub struct SolveRequest<'a> {
    /// `None` for the agent's own choices, `Some(peer)` for a peer's.
    pub source:        Option<AgentId>,
    /// One entry per field, in the agent's field order.
    pub choices:       &'a [FieldDecision],
    pub pins:          PinSet,
    pub precipitation: PrecipitationBasis,
}

/// Runs solves on behalf of the policy.  Implemented by the agent runtime,
/// which owns the field, well and water-right inputs.
pub trait ChoiceSolver {
    fn solve(&mut self, request: &SolveRequest<'_>) -> BehaviorResult<Solution>;
}
