//! Model configuration: crop, technology, well, finance, CONSUMAT and solver
//! sections.
//!
//! Typically loaded once from a TOML file and shared by every agent:
//!
//! ```toml
//! [field]
//! field_area = 50.0
//! area_split = 1
//!
//! [field.crops.corn]
//! max_yield = 15.0
//! max_water = 30.0
//! a = -0.5
//! b = 2.0
//! c = 0.0
//!
//! [field.techs."center pivot"]
//! slope = 0.0047
//! intercept = 0.003
//! pressure_head = 20.0
//!
//! [well]
//! rho = 1000.0
//! g = 9.8016
//!
//! [finance]
//! energy_price = 2777.78
//! crop_profit = { corn = 1.0 }
//!
//! [consumat]
//! alpha = { profit = 1.0 }
//! scale = { profit = 1.0, yield_pct = 1.0 }
//! satisfaction_threshold = 0.5
//! uncertainty_threshold = 0.5
//!
//! [solver]
//! MaxSweeps = 200
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::metric::{MetricTable, MetricWeights};
use crate::{CoreError, CoreResult};

// ── Field section ─────────────────────────────────────────────────────────────

/// Crop-water-yield coefficients for one crop option.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropParams {
    /// Yield at full water requirement.
    pub max_yield: f64,
    /// Water (irrigation + precipitation) needed for full yield [cm].
    pub max_water: f64,
    /// Quadratic response coefficients: `ratio = a·w² + b·w + c`.
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl CropParams {
    /// Yield ratio at relative water `w_rel` (unmasked).
    #[inline]
    pub fn response(&self, w_rel: f64) -> f64 {
        self.a * w_rel * w_rel + self.b * w_rel + self.c
    }
}

/// One irrigation technology.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechParams {
    /// Daily pumping rate per unit of seasonal volume.
    pub slope: f64,
    /// Daily pumping rate at zero volume.
    pub intercept: f64,
    /// Pressure head the technology needs at the wellhead [m].
    pub pressure_head: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field area [ha].
    pub field_area: f64,
    /// Number of equal sub-areas a field is split into.
    pub area_split: usize,
    pub crops: BTreeMap<String, CropParams>,
    pub techs: BTreeMap<String, TechParams>,
}

impl FieldConfig {
    /// Area of one sub-area unit [ha].
    #[inline]
    pub fn unit_area(&self) -> f64 {
        self.field_area / self.area_split as f64
    }
}

// ── Well section ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellConstants {
    /// Water density [kg/m³].
    #[serde(default = "default_rho")]
    pub rho: f64,
    /// Gravitational acceleration [m/s²].
    #[serde(default = "default_g")]
    pub g: f64,
    /// Pumping time used in the well-function argument [d].
    #[serde(default = "default_pumping_days")]
    pub pumping_days: f64,
}

fn default_rho() -> f64 { 1000.0 }
fn default_g() -> f64 { 9.8016 }
fn default_pumping_days() -> f64 { 1.0 }

impl Default for WellConstants {
    fn default() -> Self {
        Self { rho: default_rho(), g: default_g(), pumping_days: default_pumping_days() }
    }
}

// ── Finance section ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinanceConfig {
    /// Price per unit of pumping energy [$/PJ].
    pub energy_price: f64,
    /// Profit per unit of yield, by crop name.
    pub crop_profit: BTreeMap<String, f64>,
}

// ── CONSUMAT section ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumatConfig {
    /// Saturation speed per metric.  Unset metrics are not tracked.
    pub alpha: MetricWeights,
    /// Normalisation factor per metric: `scaled = metric / scale`.
    pub scale: MetricTable<f64>,
    pub satisfaction_threshold: f64,
    pub uncertainty_threshold: f64,
}

// ── Solver section ────────────────────────────────────────────────────────────

/// A pass-through solver option value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(i)   => Some(*i as f64),
            OptionValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Free-form key/value options handed to the solver backend untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolverOptions(pub BTreeMap<String, OptionValue>);

impl SolverOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(OptionValue::as_f64)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        match self.get(key)? {
            OptionValue::Int(i) if *i >= 0 => Some(*i as usize),
            _ => None,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: OptionValue) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// `self` with every key of `overrides` replaced.
    pub fn merged(&self, overrides: &SolverOptions) -> SolverOptions {
        let mut out = self.clone();
        out.0.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

// ── ModelConfig ───────────────────────────────────────────────────────────────

/// Everything the model builder reads from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub field:    FieldConfig,
    #[serde(default)]
    pub well:     WellConstants,
    pub finance:  FinanceConfig,
    pub consumat: ConsumatConfig,
    #[serde(default)]
    pub solver:   SolverOptions,
}

impl ModelConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: ModelConfig =
            toml::from_str(s).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the invariants the model builder relies on.
    pub fn validate(&self) -> CoreResult<()> {
        let field = &self.field;
        if field.area_split == 0 {
            return Err(CoreError::Config("field.area_split must be at least 1".into()));
        }
        if !(field.field_area > 0.0) {
            return Err(CoreError::Config("field.field_area must be positive".into()));
        }
        if field.crops.is_empty() {
            return Err(CoreError::Config("field.crops is empty".into()));
        }
        if field.techs.is_empty() {
            return Err(CoreError::Config("field.techs is empty".into()));
        }
        for (name, crop) in &field.crops {
            if !(crop.max_water > 0.0) {
                return Err(CoreError::Config(format!("crop {name:?}: max_water must be positive")));
            }
            if crop.max_yield < 0.0 {
                return Err(CoreError::Config(format!("crop {name:?}: max_yield is negative")));
            }
            if !self.finance.crop_profit.contains_key(name) {
                return Err(CoreError::Config(format!("crop {name:?} has no finance.crop_profit entry")));
            }
        }
        for (metric, alpha) in self.consumat.alpha.weighted() {
            if !alpha.is_finite() {
                return Err(CoreError::Config(format!("consumat.alpha.{metric} is not finite")));
            }
            if !(*self.consumat.scale.get(metric) > 0.0) {
                return Err(CoreError::Config(format!(
                    "consumat.scale.{metric} must be positive for a weighted metric"
                )));
            }
        }
        let c = &self.consumat;
        if !c.satisfaction_threshold.is_finite() || !c.uncertainty_threshold.is_finite() {
            return Err(CoreError::Config("consumat thresholds must be finite".into()));
        }
        Ok(())
    }
}
