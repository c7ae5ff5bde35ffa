//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use gw_agent::{AgentError, AgentYear};
use gw_core::{AgentId, Year};
use gw_sim::{SimObserver, YearSummary};

use crate::row::{AgentFailureRow, AgentYearRow, YearSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes every record to an [`OutputWriter`].
///
/// `SimObserver` methods return nothing, so write errors are stored.  After
/// `sim.run()` returns, check with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error, `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_agent_year(&mut self, record: &AgentYear) {
        let result = self.writer.write_agent_year(&AgentYearRow::from(record));
        self.store_err(result);
    }

    fn on_agent_failed(&mut self, agent: AgentId, year: Year, error: &AgentError) {
        let row = AgentFailureRow { agent_id: agent.0, year: year.0, error: error.to_string() };
        let result = self.writer.write_failure(&row);
        self.store_err(result);
    }

    fn on_year_end(&mut self, summary: &YearSummary) {
        let result = self.writer.write_year_summary(&YearSummaryRow::from(summary));
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_year: Year) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
