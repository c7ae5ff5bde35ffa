//! Toy collaborators: just enough physics to close the yearly loop.

use std::collections::BTreeMap;

use gw_agent::{
    AgentError, AgentResult, Aquifer, Field, FieldInput, FieldOutcome, Finance, Well, WellInput,
    WellOutcome, WellState,
};
use gw_core::{FieldConfig, FinanceConfig, Year};
use gw_model::Precipitation;

// ── Field ─────────────────────────────────────────────────────────────────────

/// Quadratic yield response to irrigation plus observed rain.
pub struct ToyField {
    start: Year,
    rain:  Vec<f64>,
    cfg:   FieldConfig,
}

impl ToyField {
    pub fn new(start: Year, rain: Vec<f64>, cfg: FieldConfig) -> Self {
        Self { start, rain, cfg }
    }
}

impl Field for ToyField {
    fn precipitation(&self, year: Year) -> AgentResult<Precipitation> {
        usize::try_from(year - self.start)
            .ok()
            .and_then(|i| self.rain.get(i))
            .map(|&p| Precipitation::Uniform(p))
            .ok_or_else(|| AgentError::collaborator("field", format!("no rain record for {year}")))
    }

    fn step(&mut self, input: &FieldInput<'_>) -> AgentResult<FieldOutcome> {
        let [n_s, n_c, _] = input.irrigation.dims();
        let unit_area = self.cfg.field_area / n_s as f64;
        let mut out = FieldOutcome::default();

        for s in 0..n_s {
            let Some(c) = (0..n_c).find(|&c| *input.crop_indicator.get(s, c, 0) == 1) else {
                continue;
            };
            let name = &input.crop_options[c];
            let crop = self
                .cfg
                .crops
                .get(name)
                .ok_or_else(|| AgentError::collaborator("field", format!("unknown crop {name:?}")))?;
            let depth = if input.rainfed[s] { 0.0 } else { *input.irrigation.get(s, c, 0) };
            let rain = input.precipitation.for_crop(name).unwrap_or(0.0);

            let rel = ((depth + rain) / crop.max_water).min(1.0);
            let ratio = (crop.a * rel * rel + crop.b * rel + crop.c).clamp(0.0, 1.0);

            out.volume += depth * unit_area * 0.01;
            out.yield_pct += ratio / n_s as f64;
            *out.crop_yield.entry(name.clone()).or_insert(0.0) += ratio * crop.max_yield;
        }

        let tech = self
            .cfg
            .techs
            .get(input.tech)
            .ok_or_else(|| AgentError::collaborator("field", format!("unknown tech {:?}", input.tech)))?;
        out.pumping_rate = tech.slope * out.volume + tech.intercept;
        out.pressure_head = tech.pressure_head;
        Ok(out)
    }
}

// ── Well ──────────────────────────────────────────────────────────────────────

/// Lift follows the aquifer; energy is lifting the withdrawn water.
pub struct ToyWell {
    lift:      f64,
    thickness: f64,
}

impl ToyWell {
    pub fn new(lift: f64, thickness: f64) -> Self {
        Self { lift, thickness }
    }
}

impl Well for ToyWell {
    fn state(&self) -> WellState {
        WellState { lift: self.lift, thickness: self.thickness }
    }

    fn step(&mut self, input: &WellInput) -> AgentResult<WellOutcome> {
        self.lift -= input.drawdown;
        self.thickness += input.drawdown;
        if self.thickness <= 0.0 {
            return Err(AgentError::collaborator("well", "aquifer exhausted"));
        }
        // rho * g * (m-ha -> m3) / pump efficiency, in PJ per metre of head.
        let per_metre = 1000.0 * 9.8016 * 1e4 / 0.77 * 1e-15;
        let head = self.lift + input.pressure_head;
        Ok(WellOutcome {
            withdrawal: input.withdrawal,
            lift:       self.lift,
            energy:     per_metre * input.withdrawal * head,
        })
    }
}

// ── Finance ───────────────────────────────────────────────────────────────────

pub struct ToyFinance {
    cfg: FinanceConfig,
}

impl ToyFinance {
    pub fn new(cfg: FinanceConfig) -> Self {
        Self { cfg }
    }
}

impl Finance for ToyFinance {
    fn step(&mut self, fields: &[FieldOutcome], wells: &[WellOutcome]) -> AgentResult<f64> {
        let mut by_crop: BTreeMap<&str, f64> = BTreeMap::new();
        for (crop, y) in fields.iter().flat_map(|f| &f.crop_yield) {
            *by_crop.entry(crop).or_insert(0.0) += y;
        }
        let revenue: f64 = by_crop
            .iter()
            .map(|(crop, y)| y * self.cfg.crop_profit.get(*crop).copied().unwrap_or(0.0))
            .sum();
        let cost: f64 = wells.iter().map(|w| w.energy * self.cfg.energy_price).sum();
        Ok(revenue - cost)
    }
}

// ── Aquifer ───────────────────────────────────────────────────────────────────

/// Water level falls linearly with total withdrawal.
pub struct LinearAquifer {
    history:     Vec<f64>,
    coefficient: f64,
}

impl LinearAquifer {
    pub fn new(history: Vec<f64>, coefficient: f64) -> Self {
        Self { history, coefficient }
    }
}

impl Aquifer for LinearAquifer {
    fn drawdown_history(&self) -> &[f64] {
        &self.history
    }

    fn step(&mut self, withdrawal: f64) -> AgentResult<f64> {
        let d = -self.coefficient * withdrawal;
        self.history.push(d);
        Ok(d)
    }
}
