//! Simulation observer trait for progress reporting and data collection.

use gw_agent::{AgentError, AgentYear};
use gw_core::{AgentId, Year};

use crate::YearSummary;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] and
/// [`Sim::step_year`][crate::Sim::step_year].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  The bootstrap year is reported like any
/// other year, before the first simulated one.
pub trait SimObserver {
    fn on_year_start(&mut self, _year: Year) {}

    /// Called once per successful farmer-year, in ascending `AgentId` order.
    fn on_agent_year(&mut self, _record: &AgentYear) {}

    /// A farmer's year failed.  Its state is unchanged and it takes part in
    /// the next year with its previous choices.
    fn on_agent_failed(&mut self, _agent: AgentId, _year: Year, _error: &AgentError) {}

    fn on_year_end(&mut self, _summary: &YearSummary) {}

    /// Called once after the final year completes.
    fn on_sim_end(&mut self, _final_year: Year) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
