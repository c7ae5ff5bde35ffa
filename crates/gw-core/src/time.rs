//! Simulation time model.
//!
//! Time advances in whole calendar years.  `Year` is the canonical unit; the
//! clock tracks the current year and how many steps have elapsed since the
//! start year.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Year ──────────────────────────────────────────────────────────────────────

/// A calendar year.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub i32);

impl Year {
    /// The year `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u32) -> Year {
        Year(self.0 + n as i32)
    }

    #[inline]
    pub fn next(self) -> Year {
        self.offset(1)
    }
}

impl std::ops::Sub for Year {
    type Output = i32;
    #[inline]
    fn sub(self, rhs: Year) -> i32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current simulation year.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimClock {
    /// The year of the bootstrap (initialization) run.
    pub start_year: Year,
    /// The year the next call to `Sim::step_year` will simulate.
    pub current_year: Year,
}

impl SimClock {
    /// A clock whose first simulated year is `start_year + 1`: the start
    /// year itself is consumed by the bootstrap run.
    pub fn new(start_year: Year) -> Self {
        Self { start_year, current_year: start_year.next() }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_year = self.current_year.next();
    }

    /// Completed simulated years (the bootstrap year is not counted).
    #[inline]
    pub fn elapsed_years(&self) -> u32 {
        (self.current_year - self.start_year - 1).max(0) as u32
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "year {} (step {})", self.current_year, self.elapsed_years())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Year of the bootstrap run.  The first decision year is the next one.
    pub start_year: Year,

    /// Number of yearly steps to simulate after the bootstrap.
    pub total_years: u32,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count for the parallel decision phase.  `None` uses all
    /// logical cores.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

impl SimConfig {
    /// The first year that is *not* simulated (exclusive upper bound).
    #[inline]
    pub fn end_year(&self) -> Year {
        self.start_year.offset(self.total_years + 1)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_year)
    }
}
