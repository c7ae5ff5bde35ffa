//! The physical step models a farmer delegates realization to.
//!
//! None of these are implemented here.  A driver supplies one [`Field`] per
//! field, one [`Well`] per well and one [`Finance`] per farmer; aquifers are
//! shared between farmers and live in an [`AquiferRegistry`].

use std::collections::BTreeMap;

use gw_core::Year;
use gw_model::{Grid, Precipitation};

use crate::{AgentError, AgentResult};

// ── Field ─────────────────────────────────────────────────────────────────────

/// What a field is asked to realize: the first planning year of a solution.
#[derive(Clone, Debug)]
pub struct FieldInput<'a> {
    pub year:           Year,
    /// `(split, crop option, 1)` irrigation depth [cm].
    pub irrigation:     &'a Grid<f64>,
    /// `(split, crop option, 1)` 0/1 crop indicator.
    pub crop_indicator: &'a Grid<u8>,
    pub crop_options:   &'a [String],
    pub rainfed:        &'a [bool],
    pub tech:           &'a str,
    /// Observed precipitation of `year`.
    pub precipitation:  &'a Precipitation,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldOutcome {
    /// Irrigation volume [m-ha].
    pub volume:        f64,
    /// Average yield ratio over sub-areas.
    pub yield_pct:     f64,
    /// Yield per crop [1e4 bu].
    pub crop_yield:    BTreeMap<String, f64>,
    /// [m-ha/day]
    pub pumping_rate:  f64,
    /// Pressure head of the irrigation technology [m].
    pub pressure_head: f64,
}

pub trait Field: Send {
    /// Observed precipitation available to crops in `year` [cm].
    fn precipitation(&self, year: Year) -> AgentResult<Precipitation>;

    fn step(&mut self, input: &FieldInput<'_>) -> AgentResult<FieldOutcome>;
}

// ── Well ──────────────────────────────────────────────────────────────────────

/// The parts of a well that change from year to year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WellState {
    /// Static lift [m].
    pub lift:      f64,
    /// Saturated thickness [m].
    pub thickness: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WellInput {
    pub year:          Year,
    /// [m-ha]
    pub withdrawal:    f64,
    /// Water-level change applied this year [m].
    pub drawdown:      f64,
    pub pumping_rate:  f64,
    pub pressure_head: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WellOutcome {
    pub withdrawal: f64,
    /// Total lift after the step [m].
    pub lift:       f64,
    /// [PJ]
    pub energy:     f64,
}

pub trait Well: Send {
    fn state(&self) -> WellState;

    fn step(&mut self, input: &WellInput) -> AgentResult<WellOutcome>;
}

// ── Finance ───────────────────────────────────────────────────────────────────

pub trait Finance: Send {
    /// Profit of the year [1e4 $].
    fn step(&mut self, fields: &[FieldOutcome], wells: &[WellOutcome]) -> AgentResult<f64>;
}

// ── Aquifer ───────────────────────────────────────────────────────────────────

pub trait Aquifer: Send + Sync {
    /// Yearly water-level changes, oldest first [m].
    fn drawdown_history(&self) -> &[f64];

    /// Advance one year under the summed `withdrawal` of every well tapping
    /// this aquifer; returns the year's drawdown.
    fn step(&mut self, withdrawal: f64) -> AgentResult<f64>;
}

/// Aquifers by id.  Read by every farmer during a year, written only by the
/// driver between years.
#[derive(Default)]
pub struct AquiferRegistry {
    aquifers: BTreeMap<String, Box<dyn Aquifer>>,
}

impl AquiferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, aquifer: impl Aquifer + 'static) {
        self.aquifers.insert(id.into(), Box::new(aquifer));
    }

    pub fn get(&self, id: &str) -> AgentResult<&dyn Aquifer> {
        self.aquifers
            .get(id)
            .map(|a| a.as_ref())
            .ok_or_else(|| AgentError::UnknownAquifer(id.into()))
    }

    pub fn get_mut(&mut self, id: &str) -> AgentResult<&mut (dyn Aquifer + 'static)> {
        self.aquifers
            .get_mut(id)
            .map(|a| a.as_mut())
            .ok_or_else(|| AgentError::UnknownAquifer(id.into()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.aquifers.contains_key(id)
    }

    /// Mean of the last `window` drawdown entries; 0 with no history.
    pub fn projected_drawdown(&self, id: &str, window: usize) -> AgentResult<f64> {
        let history = self.get(id)?.drawdown_history();
        let tail = &history[history.len().saturating_sub(window)..];
        if tail.is_empty() {
            Ok(0.0)
        } else {
            Ok(tail.iter().sum::<f64>() / tail.len() as f64)
        }
    }

    /// The most recent drawdown; 0 with no history.
    pub fn latest_drawdown(&self, id: &str) -> AgentResult<f64> {
        Ok(self.get(id)?.drawdown_history().last().copied().unwrap_or(0.0))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.aquifers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aquifers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aquifers.is_empty()
    }
}
