//! `gw-output`: simulation output writers.
//!
//! | File                  | One row per                                     |
//! |-----------------------|-------------------------------------------------|
//! | `agent_years.csv`     | completed farmer-year (bootstrap year included) |
//! | `agent_failures.csv`  | farmer-year that failed and was skipped         |
//! | `year_summaries.csv`  | simulated year                                  |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `gw_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gw_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentFailureRow, AgentYearRow, YearSummaryRow};
pub use writer::OutputWriter;
