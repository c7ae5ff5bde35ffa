//! Plain data row types written by output backends.

use gw_agent::AgentYear;
use gw_behavior::Adopted;
use gw_model::SolveStatus;
use gw_sim::YearSummary;

/// One farmer-year.  Multi-field choices are joined with `;` in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentYearRow {
    pub agent_id:      u32,
    pub year:          i32,
    /// Empty for the bootstrap year.
    pub mode:          String,
    /// `own`, or the id of the imitated/compared peer.
    pub adopted:       String,
    pub status:        String,
    pub objective:     f64,
    pub crops:         String,
    pub techs:         String,
    pub volume:        f64,
    pub profit:        f64,
    pub yield_pct:     f64,
    pub energy:        f64,
    pub satisfaction:  f64,
    pub expected_sa:   f64,
    pub uncertainty:   f64,
    pub next_mode:     String,
}

impl From<&AgentYear> for AgentYearRow {
    fn from(r: &AgentYear) -> Self {
        let join = |f: fn(&gw_behavior::FieldDecision) -> String| {
            r.choices.iter().map(f).collect::<Vec<_>>().join(";")
        };
        Self {
            agent_id:     r.agent.0,
            year:         r.year.0,
            mode:         r.mode.map(|m| m.as_str().to_owned()).unwrap_or_default(),
            adopted:      match r.adopted {
                Adopted::Own => "own".to_owned(),
                Adopted::Peer(p) => p.0.to_string(),
            },
            status:       match &r.status {
                SolveStatus::Optimal => "optimal".to_owned(),
                SolveStatus::Infeasible => "infeasible".to_owned(),
                SolveStatus::Other(s) => s.clone(),
            },
            objective:    r.objective,
            crops:        join(|d| d.crops.join("|")),
            techs:        join(|d| d.tech.clone()),
            volume:       r.realized.volume,
            profit:       r.realized.profit,
            yield_pct:    r.realized.yield_pct,
            energy:       r.realized.energy,
            satisfaction: r.satisfaction,
            expected_sa:  r.expected_sa,
            uncertainty:  r.uncertainty,
            next_mode:    r.next_mode.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentFailureRow {
    pub agent_id: u32,
    pub year:     i32,
    pub error:    String,
}

/// Aggregates of one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearSummaryRow {
    pub year:              i32,
    pub completed:         u64,
    pub failed:            u64,
    pub mean_satisfaction: f64,
    pub mean_uncertainty:  f64,
    pub total_volume:      f64,
    pub total_profit:      f64,
}

impl From<&YearSummary> for YearSummaryRow {
    fn from(s: &YearSummary) -> Self {
        Self {
            year:              s.year.0,
            completed:         s.completed as u64,
            failed:            s.failed as u64,
            mean_satisfaction: s.mean_satisfaction,
            mean_uncertainty:  s.mean_uncertainty,
            total_volume:      s.total_volume,
            total_profit:      s.total_profit,
        }
    }
}
