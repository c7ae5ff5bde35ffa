//! Consuming builder for [`OptimizationInstance`].
//!
//! Every `add_*` call validates its input eagerly and returns the builder on
//! success.  On failure the builder is consumed, so a rejected input never
//! leaves a half-built instance behind.
//!
//! ```rust,ignore
//! let instance = ModelBuilder::initialize(&env, setup, &config)?
//!     .add_field(FieldSpec::new("f1", Precipitation::Uniform(10.0)))?
//!     .add_well(well)?
//!     .add_water_right(right)?
//!     .add_finance()?
//!     .set_objective(Metric::Profit, None)?
//!     .finish()?;
//! ```

use std::f64::consts::PI;

use tracing::debug;

use gw_core::{Metric, MetricTable, MetricWeights, ModelConfig, WellConstants};

use crate::instance::{
    CropOption, EULER_GAMMA, FieldBlock, J_TO_PJ, M_HA_TO_M3, Objective, TechOption,
    WaterRightBlock, WellBlock,
};
use crate::water_right::plan_windows;
use crate::{
    FieldSpec, FieldSubset, ModelError, ModelResult, OptimizationInstance, SolverEnv,
    WaterRightSpec, WellSpec,
};

/// Dimensions and options of one decision problem.
#[derive(Clone, Debug)]
pub struct ModelSetup {
    pub name:         String,
    pub horizon:      usize,
    pub eval_metric:  Metric,
    pub crop_options: Vec<String>,
    pub tech_options: Vec<String>,
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidInput(msg.into())
}

pub struct ModelBuilder {
    name:         String,
    horizon:      usize,
    area_split:   usize,
    unit_area:    f64,
    crops:        Vec<CropOption>,
    techs:        Vec<TechOption>,
    well_consts:  WellConstants,
    energy_price: f64,
    eval_metric:  Metric,
    alphas:       MetricWeights,
    scales:       MetricTable<f64>,
    fields:       Vec<FieldBlock>,
    wells:        Vec<WellBlock>,
    water_rights: Vec<WaterRightBlock>,
    finance:      bool,
    objective:    Option<Objective>,
}

impl ModelBuilder {
    /// Start a new instance: resolve crop and technology coefficients from
    /// `config`.
    ///
    /// Whether `setup.eval_metric` carries an alpha is checked by
    /// [`set_objective`](Self::set_objective), once overrides are merged in.
    pub fn initialize(env: &SolverEnv, setup: ModelSetup, config: &ModelConfig) -> ModelResult<Self> {
        env.ensure_live()?;

        if setup.horizon == 0 {
            return Err(invalid("planning horizon must be at least one year"));
        }
        if setup.crop_options.is_empty() || setup.tech_options.is_empty() {
            return Err(invalid("crop and technology option lists must be non-empty"));
        }

        let crops = setup
            .crop_options
            .iter()
            .map(|name| {
                let params = config
                    .field
                    .crops
                    .get(name)
                    .ok_or_else(|| invalid(format!("crop {name:?} is not configured")))?;
                let profit = config
                    .finance
                    .crop_profit
                    .get(name)
                    .ok_or_else(|| invalid(format!("crop {name:?} has no profit entry")))?;
                Ok(CropOption { name: name.clone(), params: *params, profit: *profit })
            })
            .collect::<ModelResult<Vec<_>>>()?;

        let techs = setup
            .tech_options
            .iter()
            .map(|name| {
                config
                    .field
                    .techs
                    .get(name)
                    .map(|params| TechOption { name: name.clone(), params: *params })
                    .ok_or_else(|| invalid(format!("technology {name:?} is not configured")))
            })
            .collect::<ModelResult<Vec<_>>>()?;

        if config.field.area_split == 0 {
            return Err(invalid("area split must be at least 1"));
        }

        Ok(Self {
            name:         setup.name,
            horizon:      setup.horizon,
            area_split:   config.field.area_split,
            unit_area:    config.field.unit_area(),
            crops,
            techs,
            well_consts:  config.well,
            energy_price: config.finance.energy_price,
            eval_metric:  setup.eval_metric,
            alphas:       config.consumat.alpha,
            scales:       config.consumat.scale,
            fields:       Vec::new(),
            wells:        Vec::new(),
            water_rights: Vec::new(),
            finance:      false,
            objective:    None,
        })
    }

    fn crop_index(&self, name: &str) -> ModelResult<usize> {
        self.crops
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| invalid(format!("unknown crop option {name:?}")))
    }

    fn tech_index(&self, name: &str) -> ModelResult<usize> {
        self.techs
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| invalid(format!("unknown technology option {name:?}")))
    }

    // ── Field ─────────────────────────────────────────────────────────────

    pub fn add_field(mut self, spec: FieldSpec) -> ModelResult<Self> {
        if self.fields.iter().any(|f| f.id == spec.id) {
            return Err(invalid(format!("duplicate field id {:?}", spec.id)));
        }

        let mut precipitation = Vec::with_capacity(self.crops.len());
        for crop in &self.crops {
            let p = spec.precipitation.for_crop(&crop.name).ok_or_else(|| {
                invalid(format!("field {}: no precipitation for crop {:?}", spec.id, crop.name))
            })?;
            if !p.is_finite() || p < 0.0 {
                return Err(invalid(format!("field {}: precipitation {p} is not a depth", spec.id)));
            }
            if p > crop.params.max_water {
                return Err(invalid(format!(
                    "field {}: precipitation {p} exceeds max water {} of crop {:?}",
                    spec.id, crop.params.max_water, crop.name
                )));
            }
            precipitation.push(p);
        }

        let fixed_crop = spec
            .fixed_crop
            .as_ref()
            .map(|names| names.iter().map(|n| self.crop_index(n)).collect::<ModelResult<Vec<_>>>())
            .transpose()?;
        let fixed_tech = spec.fixed_tech.as_deref().map(|t| self.tech_index(t)).transpose()?;

        self.fields.push(FieldBlock {
            id: spec.id,
            precipitation,
            rain_fed_allowed: spec.rain_fed_allowed || spec.fixed_rainfed.is_some(),
            fixed_crop,
            fixed_rainfed: spec.fixed_rainfed,
            fixed_tech,
        });
        Ok(self)
    }

    // ── Well ──────────────────────────────────────────────────────────────

    pub fn add_well(mut self, spec: WellSpec) -> ModelResult<Self> {
        if self.wells.iter().any(|w| w.spec.id == spec.id) {
            return Err(invalid(format!("duplicate well id {:?}", spec.id)));
        }
        let positive = [
            ("radius", spec.radius),
            ("conductivity", spec.conductivity),
            ("thickness", spec.thickness),
            ("specific_yield", spec.specific_yield),
            ("pump_eff", spec.pump_eff),
        ];
        for (what, v) in positive {
            if !(v > 0.0) || !v.is_finite() {
                return Err(invalid(format!("well {}: {what} must be positive, got {v}", spec.id)));
            }
        }
        if !(spec.well_eff >= 0.0) {
            return Err(invalid(format!("well {}: well_eff must be non-negative", spec.id)));
        }
        if !spec.lift.is_finite() || !spec.drawdown_rate.is_finite() {
            return Err(invalid(format!("well {}: lift and drawdown rate must be finite", spec.id)));
        }
        if let Some(cap) = spec.pumping_capacity {
            if !(cap >= 0.0) {
                return Err(invalid(format!("well {}: pumping capacity {cap} is negative", spec.id)));
            }
        }

        let c = self.well_consts;
        let fpitr = 4.0 * PI * spec.thickness * spec.conductivity;
        let log_arg = spec.radius * spec.radius * spec.specific_yield / (fpitr * c.pumping_days);
        let log_term = -EULER_GAMMA - log_arg.ln();
        let loss_coef = (1.0 + spec.well_eff) / fpitr * log_term * M_HA_TO_M3;
        let energy_coef = c.rho * c.g * M_HA_TO_M3 / spec.pump_eff * J_TO_PJ;

        self.wells.push(WellBlock { spec, log_term, loss_coef, energy_coef });
        Ok(self)
    }

    // ── Water right ───────────────────────────────────────────────────────

    /// Cap cumulative irrigation depth.  Referenced fields must already have
    /// been added.
    pub fn add_water_right(mut self, spec: WaterRightSpec) -> ModelResult<Self> {
        if self.water_rights.iter().any(|w| w.spec.id == spec.id) {
            return Err(invalid(format!("duplicate water right id {:?}", spec.id)));
        }
        if spec.time_window == 0 {
            return Err(invalid(format!("water right {}: time window must be positive", spec.id)));
        }
        if !(spec.depth_cap >= 0.0) {
            return Err(invalid(format!("water right {}: depth cap is negative", spec.id)));
        }
        if let Some(c) = spec.carry_over {
            if !(c.remaining_depth >= 0.0) {
                return Err(invalid(format!("water right {}: remaining depth is negative", spec.id)));
            }
        }

        let fields = match &spec.fields {
            FieldSubset::All => (0..self.fields.len()).collect(),
            FieldSubset::Only(ids) => ids
                .iter()
                .map(|id| {
                    self.fields.iter().position(|f| &f.id == id).ok_or_else(|| {
                        invalid(format!("water right {}: unknown field {id:?}", spec.id))
                    })
                })
                .collect::<ModelResult<Vec<_>>>()?,
        };

        let windows = plan_windows(&spec, self.horizon);
        self.water_rights.push(WaterRightBlock { spec, fields, windows });
        Ok(self)
    }

    // ── Finance & objective ───────────────────────────────────────────────

    pub fn add_finance(mut self) -> ModelResult<Self> {
        if self.finance {
            return Err(invalid("finance block added twice"));
        }
        self.finance = true;
        Ok(self)
    }

    /// Maximize `Sa[eval_metric]`.  `alpha_overrides` replace the configured
    /// alphas metric by metric, and the eval metric must be weighted in the
    /// merged set.  `eval_metric` must be the one given at initialization.
    pub fn set_objective(
        mut self,
        eval_metric: Metric,
        alpha_overrides: Option<&MetricWeights>,
    ) -> ModelResult<Self> {
        if eval_metric != self.eval_metric {
            return Err(invalid(format!(
                "objective metric {eval_metric} differs from the setup's eval metric {}",
                self.eval_metric
            )));
        }
        let alphas = match alpha_overrides {
            Some(o) => self.alphas.merged(o),
            None    => self.alphas,
        };
        if !alphas.is_weighted(eval_metric) {
            return Err(invalid(format!("eval metric {eval_metric} has no alpha weighting")));
        }
        for (metric, _) in alphas.weighted() {
            if !(*self.scales.get(metric) > 0.0) {
                return Err(invalid(format!("metric {metric} is weighted but has no positive scale")));
            }
        }
        self.objective = Some(Objective { eval: eval_metric, alphas, scales: self.scales });
        Ok(self)
    }

    // ── Finish ────────────────────────────────────────────────────────────

    pub fn finish(self) -> ModelResult<OptimizationInstance> {
        let construction = |msg: String| ModelError::Construction(msg);

        if self.fields.is_empty() {
            return Err(construction("no fields".into()));
        }
        if self.wells.is_empty() {
            return Err(construction("no wells".into()));
        }
        if !self.finance {
            return Err(construction("finance block missing".into()));
        }
        let Some(objective) = self.objective else {
            return Err(construction("objective not set".into()));
        };

        let n_s = self.area_split;
        for f in &self.fields {
            if let Some(c) = &f.fixed_crop {
                if c.len() != n_s {
                    return Err(construction(format!(
                        "field {}: crop pin has {} entries, expected {n_s}",
                        f.id,
                        c.len()
                    )));
                }
            }
            if let Some(r) = &f.fixed_rainfed {
                if r.len() != n_s {
                    return Err(construction(format!(
                        "field {}: rain-fed pin has {} entries, expected {n_s}",
                        f.id,
                        r.len()
                    )));
                }
            }
            if f.precipitation.len() != self.crops.len() {
                return Err(construction(format!("field {}: precipitation table mismatch", f.id)));
            }
        }
        for w in &self.water_rights {
            if w.windows.iter().map(|win| win.len()).sum::<usize>() != self.horizon {
                return Err(construction(format!(
                    "water right {}: windows do not tile the horizon",
                    w.spec.id
                )));
            }
        }

        let instance = OptimizationInstance {
            name:         self.name,
            horizon:      self.horizon,
            area_split:   self.area_split,
            unit_area:    self.unit_area,
            crops:        self.crops,
            techs:        self.techs,
            fields:       self.fields,
            wells:        self.wells,
            water_rights: self.water_rights,
            energy_price: self.energy_price,
            objective,
        };
        debug!(summary = %instance.summary(), "model built");
        Ok(instance)
    }
}
