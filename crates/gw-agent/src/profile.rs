//! Per-farmer settings: assets, initial choices, network and decision
//! parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gw_behavior::{DecisionMode, FieldDecision};
use gw_core::{AgentId, Metric, MetricWeights, ModelConfig, SolverOptions};
use gw_model::WaterRightSpec;

use crate::{AgentError, AgentResult, TruncatedNormal};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub id:           AgentId,
    pub crop_options: Vec<String>,
    pub tech_options: Vec<String>,
    pub fields:       Vec<FieldProfile>,
    pub wells:        Vec<WellProfile>,
    #[serde(default)]
    pub water_rights: Vec<WaterRightSpec>,
    /// Peers this farmer compares with and imitates.
    #[serde(default)]
    pub network:      Vec<AgentId>,
    pub decision:     DecisionParams,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldProfile {
    pub id:               String,
    #[serde(default)]
    pub rain_fed_allowed: bool,
    /// Choices in place before the first simulated year.
    pub initial:          FieldDecision,
    /// Per-crop distribution of available precipitation.  Crops without an
    /// entry are perceived as receiving none.
    #[serde(default)]
    pub rain_distribution: BTreeMap<String, TruncatedNormal>,
}

/// The static part of a well.  Lift and saturated thickness change from year
/// to year and are read from the [`Well`](crate::Well) collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellProfile {
    pub id:               String,
    pub aquifer:          String,
    /// [m]
    pub radius:           f64,
    /// Hydraulic conductivity [m/day].
    pub conductivity:     f64,
    pub specific_yield:   f64,
    pub pump_eff:         f64,
    pub well_eff:         f64,
    /// [m-ha/year]
    #[serde(default)]
    pub pumping_capacity: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionParams {
    /// Planning horizon in years.
    pub horizon:         usize,
    pub eval_metric:     Metric,
    /// Overrides of the config-wide alphas.
    #[serde(default)]
    pub alpha:           MetricWeights,
    /// Number of trailing drawdown entries averaged into the projection.
    #[serde(default = "default_drawdown_window")]
    pub drawdown_window: usize,
    /// Factor on the latest drawdown passed to the well at realization.
    #[serde(default = "one")]
    pub drawdown_weight: f64,
    /// Quantile of the precipitation distribution the farmer plans around.
    #[serde(default = "half")]
    pub perceived_risk:  f64,
    /// Weight of the actual forecast against the perceived risk, in `[0, 1]`.
    #[serde(default = "one")]
    pub forecast_trust:  f64,
    /// Run this mode every year instead of the transition.
    #[serde(default)]
    pub fixed_mode:      Option<DecisionMode>,
    /// Extract a conflict set when a solve is infeasible.
    #[serde(default)]
    pub diagnose_infeasible: bool,
    /// Per-farmer solver options layered over the environment's.
    #[serde(default)]
    pub solver:          SolverOptions,
}

fn default_drawdown_window() -> usize {
    1
}

fn one() -> f64 {
    1.0
}

fn half() -> f64 {
    0.5
}

impl FarmerProfile {
    /// Config-wide alphas with this farmer's overrides applied.
    pub fn alphas(&self, config: &ModelConfig) -> MetricWeights {
        config.consumat.alpha.merged(&self.decision.alpha)
    }

    /// Consistency checks that do not need a solve.
    pub fn validate(&self, config: &ModelConfig) -> AgentResult<()> {
        let bad = |msg: String| Err(AgentError::Profile(format!("agent {}: {msg}", self.id)));

        if self.fields.is_empty() {
            return bad("no fields".into());
        }
        if self.wells.is_empty() {
            return bad("no wells".into());
        }
        if self.decision.horizon == 0 {
            return bad("horizon must be at least 1".into());
        }
        if self.decision.drawdown_window == 0 {
            return bad("drawdown window must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.decision.perceived_risk) {
            return bad(format!("perceived risk {} outside [0, 1]", self.decision.perceived_risk));
        }
        if !(0.0..=1.0).contains(&self.decision.forecast_trust) {
            return bad(format!("forecast trust {} outside [0, 1]", self.decision.forecast_trust));
        }
        if !self.alphas(config).is_weighted(self.decision.eval_metric) {
            return bad(format!("eval metric {} has no alpha", self.decision.eval_metric));
        }
        if self.network.contains(&self.id) {
            return bad("network lists the farmer itself".into());
        }

        let splits = config.field.area_split;
        for f in &self.fields {
            let init = &f.initial;
            if init.crops.len() != splits || init.rainfed.len() != splits {
                return bad(format!(
                    "field {}: initial choices cover {} sub-areas, expected {splits}",
                    f.id,
                    init.crops.len()
                ));
            }
            if let Some(c) = init.crops.iter().find(|c| !self.crop_options.contains(c)) {
                return bad(format!("field {}: initial crop {c:?} is not an option", f.id));
            }
            if !self.tech_options.contains(&init.tech) {
                return bad(format!("field {}: initial tech {:?} is not an option", f.id, init.tech));
            }
        }
        Ok(())
    }
}
