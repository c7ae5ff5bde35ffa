//! Realized needs per metric.

use serde::{Deserialize, Serialize};

use gw_core::{Metric, MetricTable, MetricWeights, saturating_need};

/// One tracked metric of one realized year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeedRow {
    pub value:    f64,
    pub scaled:   f64,
    pub alpha:    f64,
    /// `1 − exp(−alpha · scaled)`
    pub need:     f64,
    /// The solve's `Sa` forecast for this metric.
    pub forecast: Option<f64>,
}

/// Needs for every weighted metric; untracked metrics stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedsTable(pub MetricTable<Option<NeedRow>>);

impl NeedsTable {
    pub fn compute(
        values: &MetricTable<f64>,
        scales: &MetricTable<f64>,
        alphas: &MetricWeights,
        forecast: &MetricTable<Option<f64>>,
    ) -> Self {
        let mut table = MetricTable::<Option<NeedRow>>::default();
        for (metric, alpha) in alphas.weighted() {
            let value = *values.get(metric);
            let scaled = value / *scales.get(metric);
            *table.get_mut(metric) = Some(NeedRow {
                value,
                scaled,
                alpha,
                need: saturating_need(alpha, scaled),
                forecast: *forecast.get(metric),
            });
        }
        NeedsTable(table)
    }

    pub fn row(&self, metric: Metric) -> Option<&NeedRow> {
        self.0.get(metric).as_ref()
    }

    pub fn need(&self, metric: Metric) -> Option<f64> {
        self.row(metric).map(|r| r.need)
    }
}
