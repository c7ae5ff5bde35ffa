//! Evaluation metrics and the per-metric table used for weights and scales.
//!
//! The set of metrics is closed, so every per-metric quantity is stored in a
//! [`MetricTable`] with one named slot per metric rather than in a string-keyed
//! map.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// An outcome a farmer can evaluate satisfaction on.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Annual profit (revenue minus pumping cost).
    Profit,
    /// Average yield ratio (realized yield over maximum yield).
    YieldPct,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Profit, Metric::YieldPct];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Profit   => "profit",
            Metric::YieldPct => "yield_pct",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "profit"    => Ok(Metric::Profit),
            "yield_pct" => Ok(Metric::YieldPct),
            other => Err(CoreError::Parse(format!(
                "unknown metric {other:?}: expected \"profit\" or \"yield_pct\""
            ))),
        }
    }
}

// ── MetricTable ───────────────────────────────────────────────────────────────

/// One value per [`Metric`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricTable<T: Default> {
    pub profit:    T,
    pub yield_pct: T,
}

impl<T: Default> MetricTable<T> {
    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Profit   => &self.profit,
            Metric::YieldPct => &self.yield_pct,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut T {
        match metric {
            Metric::Profit   => &mut self.profit,
            Metric::YieldPct => &mut self.yield_pct,
        }
    }

    /// Iterate `(metric, value)` pairs in [`Metric::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Per-metric alpha weights.  `None` means the metric is not tracked.
pub type MetricWeights = MetricTable<Option<f64>>;

impl MetricWeights {
    /// The tracked metrics and their alphas.
    pub fn weighted(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.iter().filter_map(|(m, a)| a.map(|a| (m, a)))
    }

    pub fn is_weighted(&self, metric: Metric) -> bool {
        self.get(metric).is_some()
    }

    /// Overlay `overrides` on top of `self`: every `Some` in `overrides` wins.
    pub fn merged(&self, overrides: &MetricWeights) -> MetricWeights {
        MetricWeights {
            profit:    overrides.profit.or(self.profit),
            yield_pct: overrides.yield_pct.or(self.yield_pct),
        }
    }
}

/// The saturating need function `1 − exp(−alpha · scaled)`.
///
/// Both the optimization objective and the realized satisfaction go through
/// this one function so forecasts and outcomes are comparable.
#[inline]
pub fn saturating_need(alpha: f64, scaled: f64) -> f64 {
    1.0 - (-alpha * scaled).exp()
}
