//! Unit tests for gw-output.

#[cfg(test)]
mod fixture {
    use std::collections::BTreeMap;

    use gw_agent::{AgentYear, NeedsTable, Realization, WellWithdrawal};
    use gw_behavior::{Adopted, DecisionMode, FieldDecision};
    use gw_core::{AgentId, MetricTable, Year};
    use gw_model::SolveStatus;
    use gw_sim::YearSummary;

    pub fn agent_year(agent: u32, year: i32) -> AgentYear {
        AgentYear {
            agent:         AgentId(agent),
            year:          Year(year),
            mode:          Some(DecisionMode::Imitation),
            adopted:       Adopted::Peer(AgentId(3)),
            selected_peer: Some(AgentId(3)),
            status:        SolveStatus::Optimal,
            objective:     4.5,
            gap:           None,
            sa:            MetricTable { profit: Some(0.45), yield_pct: None },
            choices:       vec![
                FieldDecision {
                    crops:   vec!["corn".into(), "sorghum".into()],
                    rainfed: vec![false, true],
                    tech:    "LEPA".into(),
                },
                FieldDecision { crops: vec!["corn".into()], rainfed: vec![false], tech: "center pivot".into() },
            ],
            realized:      Realization {
                volume:    12.5,
                profit:    4.0,
                yield_pct: 0.8,
                energy:    0.3,
                wells:     vec![WellWithdrawal {
                    well:       "w1".into(),
                    aquifer:    "aq".into(),
                    withdrawal: 12.5,
                    lift:       50.0,
                    energy:     0.3,
                }],
            },
            needs:         NeedsTable::default(),
            satisfaction:  0.4,
            expected_sa:   0.45,
            uncertainty:   0.05,
            next_mode:     DecisionMode::SocialComparison,
        }
    }

    pub fn summary(year: i32) -> YearSummary {
        YearSummary {
            year:              Year(year),
            completed:         2,
            failed:            1,
            modes:             vec![],
            mean_satisfaction: 0.5,
            mean_uncertainty:  0.1,
            total_volume:      20.0,
            total_profit:      8.0,
            withdrawals:       BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod rows {
    use gw_behavior::Adopted;

    use super::fixture::{agent_year, summary};
    use crate::{AgentYearRow, YearSummaryRow};

    #[test]
    fn agent_year_flattens_choices() {
        let row = AgentYearRow::from(&agent_year(1, 2011));
        assert_eq!(row.mode, "Imitation");
        assert_eq!(row.adopted, "3");
        assert_eq!(row.status, "optimal");
        assert_eq!(row.crops, "corn|sorghum;corn");
        assert_eq!(row.techs, "LEPA;center pivot");
        assert_eq!(row.next_mode, "SocialComparison");
    }

    #[test]
    fn bootstrap_year_has_no_mode() {
        let mut rec = agent_year(0, 2010);
        rec.mode = None;
        rec.adopted = Adopted::Own;
        rec.selected_peer = None;
        let row = AgentYearRow::from(&rec);
        assert_eq!(row.mode, "");
        assert_eq!(row.adopted, "own");
    }

    #[test]
    fn summary_counts_carry_over() {
        let row = YearSummaryRow::from(&summary(2012));
        assert_eq!((row.year, row.completed, row.failed), (2012, 2, 1));
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{AGENT_YEAR_HEADER, CsvWriter, SUMMARY_HEADER};
    use crate::row::{AgentFailureRow, AgentYearRow, YearSummaryRow};
    use crate::writer::OutputWriter;

    use super::fixture::{agent_year, summary};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(dir.path().join("agent_years.csv")), AGENT_YEAR_HEADER);
        assert_eq!(headers(dir.path().join("year_summaries.csv")), SUMMARY_HEADER);
        assert_eq!(headers(dir.path().join("agent_failures.csv")), ["agent_id", "year", "error"]);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("a");
        CsvWriter::new(&nested).unwrap();
        assert!(nested.join("agent_years.csv").exists());
    }

    #[test]
    fn agent_year_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_agent_year(&AgentYearRow::from(&agent_year(0, 2011))).unwrap();
        w.write_agent_year(&AgentYearRow::from(&agent_year(1, 2011))).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("agent_years.csv")).unwrap();
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[1][0], "1");
        assert_eq!(&records[1][6], "corn|sorghum;corn");
        assert_eq!(records[1][8].parse::<f64>().unwrap(), 12.5);
    }

    #[test]
    fn failure_and_summary_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let failure = AgentFailureRow { agent_id: 2, year: 2012, error: "field failed: outage".into() };
        w.write_failure(&failure).unwrap();
        w.write_year_summary(&YearSummaryRow::from(&summary(2012))).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("agent_failures.csv")).unwrap();
        let rec = rdr.records().next().unwrap().unwrap();
        assert_eq!(&rec[2], "field failed: outage");

        let mut rdr = csv::Reader::from_path(dir.path().join("year_summaries.csv")).unwrap();
        let rec = rdr.records().next().unwrap().unwrap();
        assert_eq!(&rec[0], "2012");
        assert_eq!(rec[5].parse::<f64>().unwrap(), 20.0);
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod observer_tests {
    use gw_agent::AgentError;
    use gw_core::{AgentId, Year};
    use gw_sim::SimObserver;

    use crate::row::{AgentFailureRow, AgentYearRow, YearSummaryRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult, SimOutputObserver};

    use super::fixture::{agent_year, summary};

    /// Collects rows in memory; optionally fails every write.
    #[derive(Default)]
    struct Memory {
        agent_years: Vec<AgentYearRow>,
        failures:    Vec<AgentFailureRow>,
        summaries:   Vec<YearSummaryRow>,
        finished:    usize,
        broken:      bool,
    }

    impl Memory {
        fn check(&self) -> OutputResult<()> {
            if self.broken {
                Err(OutputError::Io(std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }
    }

    impl OutputWriter for Memory {
        fn write_agent_year(&mut self, row: &AgentYearRow) -> OutputResult<()> {
            self.check()?;
            self.agent_years.push(row.clone());
            Ok(())
        }

        fn write_failure(&mut self, row: &AgentFailureRow) -> OutputResult<()> {
            self.check()?;
            self.failures.push(row.clone());
            Ok(())
        }

        fn write_year_summary(&mut self, row: &YearSummaryRow) -> OutputResult<()> {
            self.check()?;
            self.summaries.push(*row);
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    #[test]
    fn forwards_every_callback() {
        let mut obs = SimOutputObserver::new(Memory::default());
        obs.on_year_start(Year(2011));
        obs.on_agent_year(&agent_year(0, 2011));
        obs.on_agent_failed(AgentId(1), Year(2011), &AgentError::collaborator("well", "stuck"));
        obs.on_year_end(&summary(2011));
        obs.on_sim_end(Year(2012));
        assert!(obs.take_error().is_none());

        let mem = obs.into_writer();
        assert_eq!(mem.agent_years.len(), 1);
        assert_eq!(mem.failures[0].agent_id, 1);
        assert!(mem.failures[0].error.contains("stuck"));
        assert_eq!(mem.summaries[0].year, 2011);
        assert_eq!(mem.finished, 1);
    }

    #[test]
    fn keeps_first_error() {
        let mut obs = SimOutputObserver::new(Memory { broken: true, ..Default::default() });
        obs.on_agent_year(&agent_year(0, 2011));
        obs.on_year_end(&summary(2011));
        assert!(matches!(obs.take_error(), Some(OutputError::Io(_))));
        assert!(obs.take_error().is_none());
    }
}
