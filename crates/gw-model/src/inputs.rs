//! Per-call inputs handed to [`ModelBuilder`](crate::ModelBuilder).
//!
//! These are plain data: they carry no solver state and can be stored in a
//! farmer profile, cloned per solve, and (de)serialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Field ─────────────────────────────────────────────────────────────────────

/// Precipitation available to a field during the growing season [cm].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Precipitation {
    Uniform(f64),
    /// Perceived precipitation differs by crop (keyed by crop name).
    PerCrop(BTreeMap<String, f64>),
}

impl Precipitation {
    pub fn for_crop(&self, crop: &str) -> Option<f64> {
        match self {
            Precipitation::Uniform(p)  => Some(*p),
            Precipitation::PerCrop(m)  => m.get(crop).copied(),
        }
    }
}

/// One field of an agent.
///
/// Crop and rain-fed pins are given per sub-area, the technology pin per
/// field.  Unset pins are optimized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id:               String,
    pub precipitation:    Precipitation,
    pub rain_fed_allowed: bool,
    pub fixed_crop:       Option<Vec<String>>,
    pub fixed_rainfed:    Option<Vec<bool>>,
    pub fixed_tech:       Option<String>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, precipitation: Precipitation) -> Self {
        Self {
            id: id.into(),
            precipitation,
            rain_fed_allowed: false,
            fixed_crop:       None,
            fixed_rainfed:    None,
            fixed_tech:       None,
        }
    }

    pub fn rain_fed_allowed(mut self, allowed: bool) -> Self {
        self.rain_fed_allowed = allowed;
        self
    }

    pub fn fix_crop(mut self, crops: Vec<String>) -> Self {
        self.fixed_crop = Some(crops);
        self
    }

    /// Pinning the rain-fed flags implies the rain-fed option.
    pub fn fix_rainfed(mut self, rainfed: Vec<bool>) -> Self {
        self.fixed_rainfed = Some(rainfed);
        self.rain_fed_allowed = true;
        self
    }

    pub fn fix_tech(mut self, tech: impl Into<String>) -> Self {
        self.fixed_tech = Some(tech.into());
        self
    }
}

// ── Well ──────────────────────────────────────────────────────────────────────

/// Hydraulic description of one well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellSpec {
    pub id: String,
    /// Projected annual water-level change [m/yr]; negative when the water
    /// table falls, which lengthens the lift in later horizon years.
    pub drawdown_rate: f64,
    /// Static lift from the water table to the surface at season start [m].
    pub lift: f64,
    /// Aquifer saturated thickness [m].
    pub thickness: f64,
    /// Well radius [m].
    pub radius: f64,
    /// Hydraulic conductivity [m/d].
    pub conductivity: f64,
    pub specific_yield: f64,
    pub pump_eff: f64,
    pub well_eff: f64,
    /// Upper bound on annual withdrawal [m-ha].
    #[serde(default)]
    pub pumping_capacity: Option<f64>,
}

// ── Water right ───────────────────────────────────────────────────────────────

/// Fields a water right applies to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSubset {
    #[default]
    All,
    Only(Vec<String>),
}

/// Cap applied to a trailing window shorter than the full window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// `cap · tail_len / window`.
    #[default]
    Proportional,
    /// The full cap.
    Full,
    Explicit(f64),
}

/// Unused depth of a window that started in an earlier year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarryOver {
    pub remaining_depth: f64,
    /// Years left in the running window, counting the coming one.
    pub years_left: u32,
}

/// A legal cap on cumulative irrigation depth [cm].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaterRightSpec {
    pub id:          String,
    pub depth_cap:   f64,
    pub time_window: u32,
    #[serde(default)]
    pub fields:      FieldSubset,
    #[serde(default)]
    pub carry_over:  Option<CarryOver>,
    #[serde(default)]
    pub tail:        TailPolicy,
}
