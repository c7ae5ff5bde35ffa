//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `agent_years.csv`
//! - `agent_failures.csv`
//! - `year_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentFailureRow, AgentYearRow, OutputResult, YearSummaryRow};

pub const AGENT_YEAR_HEADER: [&str; 16] = [
    "agent_id", "year", "mode", "adopted", "status", "objective", "crops", "techs", "volume",
    "profit", "yield_pct", "energy", "satisfaction", "expected_sa", "uncertainty", "next_mode",
];

pub const FAILURE_HEADER: [&str; 3] = ["agent_id", "year", "error"];

pub const SUMMARY_HEADER: [&str; 7] = [
    "year", "completed", "failed", "mean_satisfaction", "mean_uncertainty", "total_volume",
    "total_profit",
];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    agent_years: Writer<File>,
    failures:    Writer<File>,
    summaries:   Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three files and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut agent_years = Writer::from_path(dir.join("agent_years.csv"))?;
        agent_years.write_record(AGENT_YEAR_HEADER)?;

        let mut failures = Writer::from_path(dir.join("agent_failures.csv"))?;
        failures.write_record(FAILURE_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("year_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        Ok(Self { agent_years, failures, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_agent_year(&mut self, row: &AgentYearRow) -> OutputResult<()> {
        self.agent_years.write_record(&[
            row.agent_id.to_string(),
            row.year.to_string(),
            row.mode.clone(),
            row.adopted.clone(),
            row.status.clone(),
            row.objective.to_string(),
            row.crops.clone(),
            row.techs.clone(),
            row.volume.to_string(),
            row.profit.to_string(),
            row.yield_pct.to_string(),
            row.energy.to_string(),
            row.satisfaction.to_string(),
            row.expected_sa.to_string(),
            row.uncertainty.to_string(),
            row.next_mode.clone(),
        ])?;
        Ok(())
    }

    fn write_failure(&mut self, row: &AgentFailureRow) -> OutputResult<()> {
        self.failures.write_record(&[row.agent_id.to_string(), row.year.to_string(), row.error.clone()])?;
        Ok(())
    }

    fn write_year_summary(&mut self, row: &YearSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.year.to_string(),
            row.completed.to_string(),
            row.failed.to_string(),
            row.mean_satisfaction.to_string(),
            row.mean_uncertainty.to_string(),
            row.total_volume.to_string(),
            row.total_profit.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.agent_years.flush()?;
        self.failures.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
