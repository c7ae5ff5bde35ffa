//! The `OutputWriter` trait.

use crate::{AgentFailureRow, AgentYearRow, OutputResult, YearSummaryRow};

/// Sink for simulation rows.
///
/// Errors are returned to [`SimOutputObserver`][crate::SimOutputObserver],
/// which stores the first one for [`take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    fn write_agent_year(&mut self, row: &AgentYearRow) -> OutputResult<()>;

    fn write_failure(&mut self, row: &AgentFailureRow) -> OutputResult<()>;

    fn write_year_summary(&mut self, row: &YearSummaryRow) -> OutputResult<()>;

    /// Flush all underlying handles.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
