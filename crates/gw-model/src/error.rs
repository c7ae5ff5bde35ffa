//! Model-subsystem error type and typed infeasibility diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gw_core::CoreError;

/// Errors produced by `gw-model`.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Rejected before any instance exists.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The collected blocks do not fit together (dimension mismatch, missing
    /// section).  Raised by `ModelBuilder::finish`.
    #[error("model construction failed: {0}")]
    Construction(String),

    #[error("model is infeasible{}", .conflict.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    Infeasible { conflict: Option<Conflict> },

    /// Reported verbatim by the backend.  Never retried.
    #[error("solver error: {0}")]
    Solver(String),

    #[error("solver environment: {0}")]
    ResourceLifecycle(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ModelResult<T> = Result<T, ModelError>;

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// A named constraint family member, as reported in a conflict.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintRef {
    /// `w_rel <= 1` on one irrigated cell.
    WaterLimit { field: String, split: usize, year: usize },
    /// `0 <= yield ratio <= 1` on a selected cell.
    YieldBound { field: String, split: usize, year: usize },
    /// Irrigation must be zero on a rain-fed sub-area.
    RainFed { field: String, split: usize, year: usize },
    /// A pinned crop, rain-fed flag or technology.
    Pin { field: String, what: String },
    /// Cumulative irrigation cap over one water-right window.
    WaterRight { id: String, window: usize },
    PumpingCapacity { well: String, year: usize },
    /// The Theis logarithm would make the well-loss head negative.
    WellLoss { well: String },
    /// Allocation ratios of one field-year must sum to 1.
    Allocation { field: String, year: usize },
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintRef::WaterLimit { field, split, year } => write!(f, "c.{field}.w_rel[{split},{year}]"),
            ConstraintRef::YieldBound { field, split, year } => write!(f, "c.{field}.yield_ratio[{split},{year}]"),
            ConstraintRef::RainFed { field, split, year }    => write!(f, "c.{field}.irr_rain_fed[{split},{year}]"),
            ConstraintRef::Pin { field, what }               => write!(f, "c.{field}.{what}_input"),
            ConstraintRef::WaterRight { id, window }         => write!(f, "c.{id}.wr_{window}"),
            ConstraintRef::PumpingCapacity { well, year }    => write!(f, "c.{well}.pumping_capacity[{year}]"),
            ConstraintRef::WellLoss { well }                 => write!(f, "c.{well}.well_loss"),
            ConstraintRef::Allocation { field, year }        => write!(f, "c.{field}.allo_r[{year}]"),
        }
    }
}

/// A set of constraints that cannot hold together.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub constraints: Vec<ConstraintRef>,
}

impl Conflict {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return f.write_str("no structural conflict found");
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
