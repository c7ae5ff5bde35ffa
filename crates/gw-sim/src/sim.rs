//! The `Sim` struct and its year loop.

use std::collections::BTreeMap;

use tracing::{info, warn};

use gw_agent::{AgentResult, AgentYear, AquiferRegistry, Farmer, FarmerSnapshot};
use gw_behavior::{DecisionMode, PeerBoard};
use gw_core::{AgentId, SimClock, SimConfig, Year};

use crate::{SimError, SimObserver, SimResult};

// ── YearSummary ───────────────────────────────────────────────────────────────

/// Aggregates of one year over the farmers that completed it.
#[derive(Clone, Debug, PartialEq)]
pub struct YearSummary {
    pub year:              Year,
    pub completed:         usize,
    pub failed:            usize,
    /// How many farmers ran each mode, in [`DecisionMode::ALL`] order.
    /// Empty for the bootstrap year.
    pub modes:             Vec<(DecisionMode, usize)>,
    pub mean_satisfaction: f64,
    pub mean_uncertainty:  f64,
    /// [m-ha]
    pub total_volume:      f64,
    pub total_profit:      f64,
    /// Withdrawal per aquifer [m-ha].
    pub withdrawals:       BTreeMap<String, f64>,
}

impl YearSummary {
    fn collect(year: Year, records: &[AgentYear], failed: usize) -> Self {
        let n = records.len();
        let mean = |f: fn(&AgentYear) -> f64| {
            if n == 0 { 0.0 } else { records.iter().map(f).sum::<f64>() / n as f64 }
        };
        let ran: Vec<DecisionMode> = records.iter().filter_map(|r| r.mode).collect();
        let modes = if ran.is_empty() {
            Vec::new()
        } else {
            DecisionMode::ALL
                .into_iter()
                .map(|m| (m, ran.iter().filter(|&&r| r == m).count()))
                .collect()
        };
        let mut withdrawals = BTreeMap::new();
        for w in records.iter().flat_map(|r| &r.realized.wells) {
            *withdrawals.entry(w.aquifer.clone()).or_insert(0.0) += w.withdrawal;
        }
        Self {
            year,
            completed: n,
            failed,
            modes,
            mean_satisfaction: mean(|r| r.satisfaction),
            mean_uncertainty: mean(|r| r.uncertainty),
            total_volume: records.iter().map(|r| r.realized.volume).sum(),
            total_profit: records.iter().map(|r| r.realized.profit).sum(),
            withdrawals,
        }
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The yearly driver.
///
/// Each call to [`step_year`](Self::step_year):
///
/// 1. **Board**: every farmer publishes its last realized choices into a
///    read-only [`PeerBoard`].
/// 2. **Farmers** (parallel with the `parallel` feature): each farmer
///    decides, realizes and settles the year against the board and the
///    aquifers as they stood at the end of last year.
/// 3. **Report** (sequential, ascending `AgentId`): records and failures go
///    to the observer.
/// 4. **Aquifers**: each aquifer steps once with the summed withdrawal of
///    the wells tapping it.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config: SimConfig,

    /// Tracks the year the next `step_year` simulates.
    pub clock: SimClock,

    /// Farmers indexed by `AgentId`.
    pub(crate) farmers: Vec<Farmer>,

    pub(crate) aquifers: AquiferRegistry,

    /// Bootstrap records not yet shown to an observer.
    pub(crate) pending_bootstrap: Option<Vec<AgentYear>>,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current year to `config.end_year()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.report_bootstrap(observer);
        while self.clock.current_year < self.config.end_year() {
            self.step_year(observer)?;
        }
        observer.on_sim_end(self.clock.current_year);
        Ok(())
    }

    /// Simulate one year.  Farmer failures are reported, not returned; only
    /// an aquifer failure stops the simulation.
    pub fn step_year<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<YearSummary> {
        self.report_bootstrap(observer);
        let year = self.clock.current_year;
        observer.on_year_start(year);

        let board: PeerBoard = self.farmers.iter().map(|f| (f.id(), f.publish())).collect();
        let results = self.step_farmers(year, &board);

        let mut records = Vec::with_capacity(results.len());
        let mut failed = 0;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => {
                    observer.on_agent_year(&record);
                    records.push(record);
                }
                Err(e) => {
                    let agent = AgentId(i as u32);
                    warn!(%agent, %year, error = %e, "farmer year failed");
                    observer.on_agent_failed(agent, year, &e);
                    failed += 1;
                }
            }
        }

        let summary = YearSummary::collect(year, &records, failed);
        self.step_aquifers(&summary.withdrawals)?;
        info!(
            %year,
            completed = summary.completed,
            failed,
            satisfaction = summary.mean_satisfaction,
            volume = summary.total_volume,
            "year finished"
        );
        observer.on_year_end(&summary);
        self.clock.advance();
        Ok(summary)
    }

    pub fn farmers(&self) -> &[Farmer] {
        &self.farmers
    }

    pub fn farmer(&self, agent: AgentId) -> SimResult<&Farmer> {
        self.farmers.get(agent.index()).ok_or(SimError::UnknownAgent(agent))
    }

    pub fn aquifers(&self) -> &AquiferRegistry {
        &self.aquifers
    }

    /// For drivers that adjust aquifers between years.
    pub fn aquifers_mut(&mut self) -> &mut AquiferRegistry {
        &mut self.aquifers
    }

    pub fn snapshots(&self) -> Vec<FarmerSnapshot> {
        self.farmers.iter().map(Farmer::snapshot).collect()
    }

    /// Restore farmer states; each snapshot goes to the farmer with its id.
    pub fn restore(&mut self, snapshots: Vec<FarmerSnapshot>) -> SimResult<()> {
        for snap in snapshots {
            let agent = snap.agent;
            let farmer = self.farmers.get_mut(agent.index()).ok_or(SimError::UnknownAgent(agent))?;
            farmer.restore(snap).map_err(|source| SimError::Bootstrap { agent, source })?;
        }
        Ok(())
    }

    // ── Year phases ───────────────────────────────────────────────────────

    fn report_bootstrap<O: SimObserver>(&mut self, observer: &mut O) {
        let Some(records) = self.pending_bootstrap.take() else {
            return;
        };
        let year = self.clock.start_year;
        observer.on_year_start(year);
        for r in &records {
            observer.on_agent_year(r);
        }
        observer.on_year_end(&YearSummary::collect(year, &records, 0));
    }

    /// Step every farmer; results come back in `AgentId` order.
    fn step_farmers(&mut self, year: Year, board: &PeerBoard) -> Vec<AgentResult<AgentYear>> {
        let aquifers = &self.aquifers;

        #[cfg(not(feature = "parallel"))]
        {
            self.farmers.iter_mut().map(|f| f.step(year, board, aquifers)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let farmers = &mut self.farmers;
            let run = move || {
                farmers
                    .par_iter_mut()
                    .map(|f| f.step(year, board, aquifers))
                    .collect::<Vec<_>>()
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }
    }

    /// Every registered aquifer steps once, with zero if nothing drew on it.
    fn step_aquifers(&mut self, withdrawals: &BTreeMap<String, f64>) -> SimResult<()> {
        let ids: Vec<String> = self.aquifers.ids().map(str::to_owned).collect();
        for id in ids {
            let volume = withdrawals.get(&id).copied().unwrap_or(0.0);
            let step = self.aquifers.get_mut(&id).and_then(|a| a.step(volume));
            step.map_err(|source| SimError::Aquifer { id, source })?;
        }
        Ok(())
    }
}
