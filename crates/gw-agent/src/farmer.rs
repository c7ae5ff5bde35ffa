//! The farmer runtime.
//!
//! One [`Farmer`] owns its collaborators and its [`AgentState`].  A year is
//!
//! ```text
//! decide   - the policy runs the current mode's solves (perceived rain)
//! realize  - first planning year → Field / Well / Finance collaborators
//! settle   - needs → satisfaction, forecast → uncertainty → next mode,
//!            water rights advanced by the year's use
//! ```
//!
//! Every check that can fail without touching a collaborator runs before the
//! first `Field::step`: aquifer lookups and the eval metric's forecast.  A
//! failure there leaves the farmer and its collaborators as they were.
//! Collaborators cannot be rolled back, so once realization has started a
//! failing field, well or finance step is reported as
//! [`AgentError::Realization`], naming the collaborators that already
//! advanced.  The [`AgentState`] is never replaced by a failed year.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gw_behavior::{
    Adopted, ConsumatPolicy, DecisionContext, DecisionMode, FieldDecision, PeerBoard, PeerRecord,
    Thresholds,
};
use gw_core::{AgentId, AgentRng, Metric, MetricTable, ModelConfig, Year, saturating_need};
use gw_model::{Grid, ModelError, Precipitation, Solution, SolveStatus, SolverEnv, WellSpec};

use crate::perception::{blend, perceived_risks};
use crate::runner::ModelRunner;
use crate::{
    AgentError, AgentResult, AgentState, AquiferRegistry, FarmerProfile, FarmerSnapshot, Field,
    FieldInput, FieldOutcome, Finance, NeedsTable, Well, WellInput, WellOutcome,
};

// ── Per-year records ──────────────────────────────────────────────────────────

/// What one well did in a realized year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellWithdrawal {
    pub well:       String,
    pub aquifer:    String,
    /// [m-ha]
    pub withdrawal: f64,
    pub lift:       f64,
    pub energy:     f64,
}

/// Realized outcome of the first planning year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Realization {
    /// Total irrigation volume [m-ha].
    pub volume:    f64,
    pub profit:    f64,
    pub yield_pct: f64,
    pub energy:    f64,
    pub wells:     Vec<WellWithdrawal>,
}

/// One farmer-year as seen by observers and output writers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentYear {
    pub agent:         AgentId,
    pub year:          Year,
    /// The mode that ran; `None` for the bootstrap year.
    pub mode:          Option<DecisionMode>,
    pub adopted:       Adopted,
    pub selected_peer: Option<AgentId>,
    pub status:        SolveStatus,
    pub objective:     f64,
    pub gap:           Option<f64>,
    /// Per-metric `Sa` forecast of the adopted solve.
    pub sa:            MetricTable<Option<f64>>,
    pub choices:       Vec<FieldDecision>,
    pub realized:      Realization,
    pub needs:         NeedsTable,
    pub satisfaction:  f64,
    pub expected_sa:   f64,
    pub uncertainty:   f64,
    pub next_mode:     DecisionMode,
}

// ── FarmerBuilder ─────────────────────────────────────────────────────────────

/// Assembles a [`Farmer`] from its profile and collaborators.
///
/// Collaborators are given in the order of `profile.fields` and
/// `profile.wells`.  [`bootstrap`](Self::bootstrap) runs the initialization
/// solve; [`resume`](Self::resume) restores a snapshot instead.
pub struct FarmerBuilder {
    profile: FarmerProfile,
    config:  Arc<ModelConfig>,
    env:     Arc<SolverEnv>,
    fields:  Vec<Box<dyn Field>>,
    wells:   Vec<Box<dyn Well>>,
    finance: Option<Box<dyn Finance>>,
    seed:    u64,
}

impl FarmerBuilder {
    pub fn new(profile: FarmerProfile, config: Arc<ModelConfig>, env: Arc<SolverEnv>) -> Self {
        Self { profile, config, env, fields: Vec::new(), wells: Vec::new(), finance: None, seed: 0 }
    }

    pub fn profile(&self) -> &FarmerProfile {
        &self.profile
    }

    pub fn field(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn well(mut self, well: impl Well + 'static) -> Self {
        self.wells.push(Box::new(well));
        self
    }

    pub fn finance(mut self, finance: impl Finance + 'static) -> Self {
        self.finance = Some(Box::new(finance));
        self
    }

    /// Global seed; the farmer's random draws depend only on it, the
    /// farmer's id and the year.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate, then solve the initial configuration with observed
    /// precipitation of `year` and realize it.
    pub fn bootstrap(self, year: Year, aquifers: &AquiferRegistry) -> AgentResult<(Farmer, AgentYear)> {
        let mut parts = self.assemble()?;
        for w in &parts.profile.wells {
            if !aquifers.contains(&w.aquifer) {
                return Err(AgentError::UnknownAquifer(w.aquifer.clone()));
            }
        }

        let thresholds = Thresholds::from(&parts.config.consumat);
        let policy = ConsumatPolicy::new(thresholds, parts.profile.decision.fixed_mode);
        let observed = parts.observed(year)?;
        let water_rights = parts.profile.water_rights.clone();
        let initial: Vec<FieldDecision> =
            parts.profile.fields.iter().map(|f| f.initial.clone()).collect();

        let solution = {
            let mut runner = parts.runner(year, &observed, &observed, &water_rights, aquifers)?;
            policy.initialize(&initial, &mut runner)?
        };
        let forecast = parts.forecast(&solution)?;
        let realized = parts.realize(year, &solution, &observed, aquifers)?;
        let (state, record) = parts.settle(
            year,
            Step { mode: None, adopted: Adopted::Own, selected_peer: None },
            solution,
            realized,
            forecast,
            None,
            thresholds,
            &water_rights,
        );
        info!(agent = %parts.profile.id, %year, mode = %state.mode, "farmer bootstrapped");
        Ok((parts.into_farmer(state), record))
    }

    /// Restore a snapshot without solving.
    pub fn resume(self, snapshot: FarmerSnapshot) -> AgentResult<Farmer> {
        let parts = self.assemble()?;
        parts.check_snapshot(&snapshot)?;
        Ok(parts.into_farmer(snapshot.state))
    }

    fn assemble(self) -> AgentResult<Parts> {
        self.profile.validate(&self.config)?;
        let id = self.profile.id;
        if self.fields.len() != self.profile.fields.len() {
            return Err(AgentError::Profile(format!(
                "agent {id}: {} field collaborators for {} fields",
                self.fields.len(),
                self.profile.fields.len()
            )));
        }
        if self.wells.len() != self.profile.wells.len() {
            return Err(AgentError::Profile(format!(
                "agent {id}: {} well collaborators for {} wells",
                self.wells.len(),
                self.profile.wells.len()
            )));
        }
        let finance = self
            .finance
            .ok_or_else(|| AgentError::Profile(format!("agent {id}: no finance collaborator")))?;

        let risks = self
            .profile
            .fields
            .iter()
            .map(|f| {
                perceived_risks(
                    &f.rain_distribution,
                    &self.profile.crop_options,
                    self.profile.decision.perceived_risk,
                )
            })
            .collect();

        Ok(Parts {
            profile: self.profile,
            config:  self.config,
            env:     self.env,
            fields:  self.fields,
            wells:   self.wells,
            finance,
            risks,
            seed:    self.seed,
        })
    }
}

// ── Farmer ────────────────────────────────────────────────────────────────────

/// Everything but the state; shared by the builder and the farmer.
struct Parts {
    profile: FarmerProfile,
    config:  Arc<ModelConfig>,
    env:     Arc<SolverEnv>,
    fields:  Vec<Box<dyn Field>>,
    wells:   Vec<Box<dyn Well>>,
    finance: Box<dyn Finance>,
    /// Perceived risk per field and crop.
    risks:   Vec<BTreeMap<String, f64>>,
    seed:    u64,
}

pub struct Farmer {
    parts: Parts,
    state: AgentState,
}

/// How the adopted solution came about.
struct Step {
    mode:          Option<DecisionMode>,
    adopted:       Adopted,
    selected_peer: Option<AgentId>,
}

/// Checked before realization so that settling cannot fail.
#[derive(Clone, Copy)]
struct Forecast {
    alpha:       f64,
    expected_sa: f64,
}

impl Farmer {
    pub fn id(&self) -> AgentId {
        self.parts.profile.id
    }

    pub fn profile(&self) -> &FarmerProfile {
        &self.parts.profile
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn network(&self) -> &[AgentId] {
        &self.parts.profile.network
    }

    /// The record peers read next year.
    pub fn publish(&self) -> PeerRecord {
        PeerRecord { choices: self.state.choices.clone() }
    }

    pub fn snapshot(&self) -> FarmerSnapshot {
        FarmerSnapshot { agent: self.id(), state: self.state.clone() }
    }

    pub fn restore(&mut self, snapshot: FarmerSnapshot) -> AgentResult<()> {
        self.parts.check_snapshot(&snapshot)?;
        self.state = snapshot.state;
        Ok(())
    }

    /// Decide, realize and settle `year`.
    ///
    /// `board` holds the previous year's finalized peer choices.  On error
    /// the state is left as it was.
    pub fn step(&mut self, year: Year, board: &PeerBoard, aquifers: &AquiferRegistry) -> AgentResult<AgentYear> {
        let p = &self.parts;
        let mode = self.state.mode;
        let observed = p.observed(year)?;
        let perceived: Vec<Precipitation> = p
            .risks
            .iter()
            .zip(&observed)
            .map(|(risks, obs)| blend(risks, obs, p.profile.decision.forecast_trust))
            .collect();

        let decision = {
            let mut runner = p.runner(year, &observed, &perceived, &self.state.water_rights, aquifers)?;
            let policy = ConsumatPolicy::new(self.state.thresholds, p.profile.decision.fixed_mode);
            let ctx = DecisionContext {
                agent:         p.profile.id,
                own:           &self.state.choices,
                network:       &p.profile.network,
                board,
                selected_peer: self.state.selected_peer,
            };
            let mut rng = AgentRng::new(p.seed.wrapping_add(year.0 as u64), p.profile.id);
            let decision = policy.decide(mode, ctx, &mut rng, &mut runner)?;
            debug!(
                agent = %p.profile.id,
                %year,
                %mode,
                adopted = ?decision.adopted,
                solves = runner.solves,
                objective = decision.solution.objective,
                "decided"
            );
            decision
        };

        let forecast = self.parts.forecast(&decision.solution)?;
        let realized = self.parts.realize(year, &decision.solution, &observed, aquifers)?;
        let (state, record) = self.parts.settle(
            year,
            Step { mode: Some(mode), adopted: decision.adopted, selected_peer: decision.selected_peer },
            decision.solution,
            realized,
            forecast,
            Some(self.state.expected_sa),
            self.state.thresholds,
            &self.state.water_rights,
        );
        if state.mode != mode {
            info!(agent = %self.id(), %year, from = %mode, to = %state.mode, "mode transition");
        }
        self.state = state;
        Ok(record)
    }
}

impl Parts {
    fn into_farmer(self, state: AgentState) -> Farmer {
        Farmer { parts: self, state }
    }

    fn check_snapshot(&self, snapshot: &FarmerSnapshot) -> AgentResult<()> {
        if snapshot.agent != self.profile.id {
            return Err(AgentError::SnapshotMismatch { expected: self.profile.id, got: snapshot.agent });
        }
        if snapshot.state.choices.len() != self.profile.fields.len() {
            return Err(AgentError::Snapshot(format!(
                "snapshot has choices for {} fields, profile has {}",
                snapshot.state.choices.len(),
                self.profile.fields.len()
            )));
        }
        Ok(())
    }

    fn observed(&self, year: Year) -> AgentResult<Vec<Precipitation>> {
        self.fields.iter().map(|f| f.precipitation(year)).collect()
    }

    fn runner<'a>(
        &'a self,
        year: Year,
        observed: &'a [Precipitation],
        perceived: &'a [Precipitation],
        water_rights: &'a [gw_model::WaterRightSpec],
        aquifers: &AquiferRegistry,
    ) -> AgentResult<ModelRunner<'a>> {
        let window = self.profile.decision.drawdown_window;
        let wells = self
            .profile
            .wells
            .iter()
            .zip(&self.wells)
            .map(|(w, well)| {
                let state = well.state();
                Ok(WellSpec {
                    id:               w.id.clone(),
                    drawdown_rate:    aquifers.projected_drawdown(&w.aquifer, window)?,
                    lift:             state.lift,
                    thickness:        state.thickness,
                    radius:           w.radius,
                    conductivity:     w.conductivity,
                    specific_yield:   w.specific_yield,
                    pump_eff:         w.pump_eff,
                    well_eff:         w.well_eff,
                    pumping_capacity: w.pumping_capacity,
                })
            })
            .collect::<AgentResult<Vec<_>>>()?;

        Ok(ModelRunner {
            agent: self.profile.id,
            year,
            profile: &self.profile,
            config: &self.config,
            env: &self.env,
            alphas: self.profile.alphas(&self.config),
            observed,
            perceived,
            wells,
            water_rights,
            solves: 0,
        })
    }

    /// The eval metric's weight and the solve's forecast for it.
    fn forecast(&self, solution: &Solution) -> AgentResult<Forecast> {
        let eval = self.profile.decision.eval_metric;
        let alphas = self.profile.alphas(&self.config);
        let alpha = (*alphas.get(eval)).ok_or_else(|| missing(eval, "weight"))?;
        let expected_sa = solution.sa(eval).ok_or_else(|| missing(eval, "forecast"))?;
        Ok(Forecast { alpha, expected_sa })
    }

    /// Hand the first planning year of `solution` to the collaborators.
    fn realize(
        &mut self,
        year: Year,
        solution: &Solution,
        observed: &[Precipitation],
        aquifers: &AquiferRegistry,
    ) -> AgentResult<Realization> {
        let crop_options = &self.profile.crop_options;
        let weight = self.profile.decision.drawdown_weight;
        let drawdowns = self
            .profile
            .wells
            .iter()
            .map(|w| Ok(aquifers.latest_drawdown(&w.aquifer)? * weight))
            .collect::<AgentResult<Vec<f64>>>()?;

        let mut stepped: Vec<String> = Vec::new();
        let failed = |stepped: &mut Vec<String>, source: AgentError| AgentError::Realization {
            year,
            stepped: std::mem::take(stepped),
            source: Box::new(source),
        };

        let mut fields: Vec<FieldOutcome> = Vec::with_capacity(self.fields.len());
        for (((field, sol), prec), fp) in
            self.fields.iter_mut().zip(&solution.fields).zip(observed).zip(&self.profile.fields)
        {
            let irrigation = first_year(&sol.irrigation);
            let indicator = sol.crop_indicator(crop_options);
            let out = field
                .step(&FieldInput {
                    year,
                    irrigation:     &irrigation,
                    crop_indicator: &indicator,
                    crop_options,
                    rainfed:        &sol.rainfed,
                    tech:           &sol.tech,
                    precipitation:  prec,
                })
                .map_err(|e| failed(&mut stepped, e))?;
            stepped.push(format!("field {}", fp.id));
            fields.push(out);
        }
        let volume: f64 = fields.iter().map(|o| o.volume).sum();

        let mut wells: Vec<WellOutcome> = Vec::with_capacity(self.wells.len());
        let mut withdrawals = Vec::with_capacity(self.wells.len());
        for (k, (well, w)) in self.wells.iter_mut().zip(&self.profile.wells).enumerate() {
            let share = solution
                .wells
                .get(k)
                .and_then(|s| s.allocation.first())
                .copied()
                .unwrap_or(0.0);
            let weighted = |value: fn(&FieldOutcome) -> f64| -> f64 {
                fields
                    .iter()
                    .enumerate()
                    .map(|(f, o)| value(o) * solution.allocation_ratio(f, k, 0))
                    .sum()
            };
            let input = WellInput {
                year,
                withdrawal:    volume * share,
                drawdown:      drawdowns[k],
                pumping_rate:  weighted(|o| o.pumping_rate),
                pressure_head: weighted(|o| o.pressure_head),
            };
            let out = well.step(&input).map_err(|e| failed(&mut stepped, e))?;
            stepped.push(format!("well {}", w.id));
            withdrawals.push(WellWithdrawal {
                well:       w.id.clone(),
                aquifer:    w.aquifer.clone(),
                withdrawal: out.withdrawal,
                lift:       out.lift,
                energy:     out.energy,
            });
            wells.push(out);
        }

        let profit = self.finance.step(&fields, &wells).map_err(|e| failed(&mut stepped, e))?;
        let yield_pct = fields.iter().map(|o| o.yield_pct).sum::<f64>() / fields.len().max(1) as f64;
        Ok(Realization {
            volume,
            profit,
            yield_pct,
            energy: wells.iter().map(|w| w.energy).sum(),
            wells: withdrawals,
        })
    }

    /// The state after `year`, and the year's record.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        year: Year,
        step: Step,
        solution: Solution,
        realized: Realization,
        forecast: Forecast,
        previous_expected: Option<f64>,
        thresholds: Thresholds,
        water_rights: &[gw_model::WaterRightSpec],
    ) -> (AgentState, AgentYear) {
        let eval = self.profile.decision.eval_metric;
        let scales = &self.config.consumat.scale;
        let values = MetricTable { profit: realized.profit, yield_pct: realized.yield_pct };
        let needs = NeedsTable::compute(&values, scales, &self.profile.alphas(&self.config), &solution.sa);
        let satisfaction = saturating_need(forecast.alpha, *values.get(eval) / *scales.get(eval));
        let expected_sa = forecast.expected_sa;
        let uncertainty = (previous_expected.unwrap_or(expected_sa) - satisfaction).abs();
        let next_mode = ConsumatPolicy::new(thresholds, self.profile.decision.fixed_mode)
            .next_mode(satisfaction, uncertainty);

        let water_rights = water_rights
            .iter()
            .map(|wr| {
                let used = solution
                    .water_rights
                    .iter()
                    .find(|u| u.id == wr.id)
                    .map_or(0.0, |u| u.first_year_use);
                wr.advance(used)
            })
            .collect();

        let choices = FieldDecision::all_from(&solution);
        let record = AgentYear {
            agent: self.profile.id,
            year,
            mode: step.mode,
            adopted: step.adopted,
            selected_peer: step.selected_peer,
            status: solution.status.clone(),
            objective: solution.objective,
            gap: solution.gap,
            sa: solution.sa,
            choices: choices.clone(),
            realized,
            needs: needs.clone(),
            satisfaction,
            expected_sa,
            uncertainty,
            next_mode,
        };
        let state = AgentState {
            year,
            mode: next_mode,
            thresholds,
            satisfaction,
            expected_sa,
            uncertainty,
            needs,
            solution,
            choices,
            selected_peer: step.selected_peer,
            water_rights,
        };
        (state, record)
    }
}

fn missing(metric: Metric, what: &str) -> AgentError {
    AgentError::Model(ModelError::Construction(format!("no {what} for eval metric {metric}")))
}

/// `(split, crop, 0..1)` slice of a `(split, crop, horizon)` grid.
fn first_year(grid: &Grid<f64>) -> Grid<f64> {
    let [n_s, n_c, _] = grid.dims();
    let mut out = Grid::zeros([n_s, n_c, 1]);
    for s in 0..n_s {
        for c in 0..n_c {
            out.set(s, c, 0, *grid.get(s, c, 0));
        }
    }
    out
}
