//! A fully constructed agent-year optimization instance.
//!
//! Instances are produced by [`ModelBuilder::finish`](crate::ModelBuilder::finish)
//! and are immutable afterwards.  Every input has already been validated and
//! resolved to option indices, so backends only deal with numbers.

use std::fmt::Write as _;

use gw_core::{CropParams, Metric, MetricTable, MetricWeights, TechParams};

use crate::{WaterRightSpec, WellSpec, Window};

/// Euler–Mascheroni constant in the Theis well function approximation.
pub(crate) const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
/// cm·ha → m·ha.
///
/// Irrigation depth is in cm and area in ha throughout, so a depth times an
/// area is converted to m·ha with `0.01`.  A factor of `0.1` with the same
/// units labels the result m·ha but is ten times larger; volumes, energy and
/// cost here are a tenth of what such a model reports.
///
/// Annual profit is `revenue - cost` with no lower bound.  A year that loses
/// money reports a negative profit and the objective sees the loss instead
/// of a floor at zero.
pub(crate) const CM_TO_M: f64 = 0.01;
/// m·ha → m³.
pub(crate) const M_HA_TO_M3: f64 = 10_000.0;
/// J → PJ.
pub(crate) const J_TO_PJ: f64 = 1e-15;

// ── Blocks ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) struct CropOption {
    pub name:   String,
    pub params: CropParams,
    pub profit: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct TechOption {
    pub name:   String,
    pub params: TechParams,
}

#[derive(Clone, Debug)]
pub(crate) struct FieldBlock {
    pub id:               String,
    /// Precipitation per crop option [cm].
    pub precipitation:    Vec<f64>,
    pub rain_fed_allowed: bool,
    pub fixed_crop:       Option<Vec<usize>>,
    pub fixed_rainfed:    Option<Vec<bool>>,
    pub fixed_tech:       Option<usize>,
}

impl FieldBlock {
    /// Largest irrigation depth that keeps `w_rel <= 1` for `crop`.
    #[inline]
    pub fn irrigation_ub(&self, crop: &CropOption, c: usize) -> f64 {
        (crop.params.max_water - self.precipitation[c]).max(0.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct WellBlock {
    pub spec:        WellSpec,
    /// `−γ − ln(r²·Sy / (4π·T·t))`; negative means no feasible well-loss head.
    pub log_term:    f64,
    /// Well-loss head per unit pumping rate [m per m-ha/d].
    pub loss_coef:   f64,
    /// Energy per unit withdrawal per metre of lift [PJ per m-ha·m].
    pub energy_coef: f64,
}

impl WellBlock {
    /// Projected static lift in horizon year `h`.
    #[inline]
    pub fn static_lift(&self, h: usize) -> f64 {
        self.spec.lift - self.spec.drawdown_rate * h as f64
    }
}

#[derive(Clone, Debug)]
pub(crate) struct WaterRightBlock {
    pub spec:    WaterRightSpec,
    /// Field indices the cap applies to.
    pub fields:  Vec<usize>,
    pub windows: Vec<Window>,
}

#[derive(Clone, Debug)]
pub(crate) struct Objective {
    pub eval:   Metric,
    pub alphas: MetricWeights,
    pub scales: MetricTable<f64>,
}

// ── OptimizationInstance ──────────────────────────────────────────────────────

/// One agent's decision problem for one year over its planning horizon.
///
/// Dropping the instance releases everything it owns; nothing is shared with
/// the solver environment beyond the duration of a `solve` call.
#[derive(Clone, Debug)]
pub struct OptimizationInstance {
    pub(crate) name:         String,
    pub(crate) horizon:      usize,
    pub(crate) area_split:   usize,
    pub(crate) unit_area:    f64,
    pub(crate) crops:        Vec<CropOption>,
    pub(crate) techs:        Vec<TechOption>,
    pub(crate) fields:       Vec<FieldBlock>,
    pub(crate) wells:        Vec<WellBlock>,
    pub(crate) water_rights: Vec<WaterRightBlock>,
    pub(crate) energy_price: f64,
    pub(crate) objective:    Objective,
}

impl OptimizationInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn area_split(&self) -> usize {
        self.area_split
    }

    pub fn eval_metric(&self) -> Metric {
        self.objective.eval
    }

    pub fn crop_options(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(|c| c.name.as_str())
    }

    pub fn tech_options(&self) -> impl Iterator<Item = &str> {
        self.techs.iter().map(|t| t.name.as_str())
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }

    pub fn well_ids(&self) -> impl Iterator<Item = &str> {
        self.wells.iter().map(|w| w.spec.id.as_str())
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn n_wells(&self) -> usize {
        self.wells.len()
    }

    /// Short human-readable description of the instance.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Model {}", self.name);
        let _ = writeln!(s, "  planning horizon: {}", self.horizon);
        let _ = writeln!(s, "  crop fields:      {}", self.fields.len());
        let _ = writeln!(s, "  splits:           {}", self.area_split);
        let _ = writeln!(s, "  wells:            {}", self.wells.len());
        let _ = writeln!(s, "  water rights:     {}", self.water_rights.len());
        let _ = writeln!(s, "  objective:        Sa.{}", self.objective.eval);
        for f in &self.fields {
            let pinned = |p: bool| if p { "user input" } else { "optimize" };
            let rainfed = match (f.rain_fed_allowed, f.fixed_rainfed.is_some()) {
                (false, _)    => "not allowed",
                (true, true)  => "user input",
                (true, false) => "optimize",
            };
            let _ = writeln!(
                s,
                "  field {}: crop types {}, irr tech {}, rain-fed {}",
                f.id,
                pinned(f.fixed_crop.is_some()),
                pinned(f.fixed_tech.is_some()),
                rainfed,
            );
        }
        s
    }
}
