//! Typed solver output, split by section.

use serde::{Deserialize, Serialize};

use gw_core::{Metric, MetricTable};

use crate::eval::{Assignment, evaluate};
use crate::{Grid, OptimizationInstance, Window};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Anything else the backend reports (time limit, iteration limit, …).
    Other(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSolution {
    pub id:              String,
    /// Crop name per sub-area.
    pub crops:           Vec<String>,
    pub rainfed:         Vec<bool>,
    pub tech:            String,
    /// `(split, crop option, year)` [cm]; zero outside the selected crop.
    pub irrigation:      Grid<f64>,
    /// `(split, year)` relative water of the selected crop.
    pub water_rel:       Grid<f64>,
    /// `(split, year)` yield ratio of the selected crop.
    pub yield_ratio:     Grid<f64>,
    pub volume:          Vec<f64>,
    pub avg_yield_ratio: Vec<f64>,
    pub pumping_rate:    Vec<f64>,
    pub pressure_head:   f64,
}

impl FieldSolution {
    /// `(split, crop option)` 0/1 indicator.
    pub fn crop_indicator(&self, crop_options: &[String]) -> Grid<u8> {
        let mut g = Grid::filled([self.crops.len(), crop_options.len(), 1], 0u8);
        for (s, crop) in self.crops.iter().enumerate() {
            if let Some(c) = crop_options.iter().position(|o| o == crop) {
                g.set(s, c, 0, 1);
            }
        }
        g
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellSolution {
    pub id:            String,
    /// Annual withdrawal [m-ha].
    pub withdrawal:    Vec<f64>,
    /// Share of the total volume drawn from this well.
    pub allocation:    Vec<f64>,
    pub pumping_rate:  Vec<f64>,
    pub pressure_head: Vec<f64>,
    pub static_lift:   Vec<f64>,
    pub well_loss:     Vec<f64>,
    pub total_lift:    Vec<f64>,
    /// [PJ].
    pub energy:        Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateSolution {
    pub volume:    Vec<f64>,
    pub energy:    Vec<f64>,
    pub revenue:   Vec<f64>,
    pub cost:      Vec<f64>,
    pub profit:    Vec<f64>,
    pub yield_pct: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaterRightUsage {
    pub id:      String,
    pub windows: Vec<Window>,
    /// Irrigation drawn in each window [cm].
    pub used:    Vec<f64>,
    /// Irrigation drawn in the first horizon year [cm].
    pub first_year_use: f64,
}

/// Everything a solve produced for one agent-year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub name:         String,
    pub status:       SolveStatus,
    pub objective:    f64,
    pub gap:          Option<f64>,
    pub horizon:      usize,
    pub crop_options: Vec<String>,
    pub tech_options: Vec<String>,
    pub fields:       Vec<FieldSolution>,
    pub wells:        Vec<WellSolution>,
    /// `(field, well, year)` allocation ratios.
    pub allocation:   Grid<f64>,
    pub totals:       AggregateSolution,
    /// Forecast satisfaction per weighted metric.
    pub sa:           MetricTable<Option<f64>>,
    pub water_rights: Vec<WaterRightUsage>,
}

impl Solution {
    /// Assemble the typed solution of `a`.
    pub fn from_assignment(
        inst: &OptimizationInstance,
        a: &Assignment,
        status: SolveStatus,
        gap: Option<f64>,
    ) -> Solution {
        let ev = evaluate(inst, a);
        let n_s = inst.area_split;
        let n_h = inst.horizon;
        let n_c = inst.crops.len();
        let series = |g: &Grid<f64>, i: usize| (0..n_h).map(|h| *g.get(i, 0, h)).collect::<Vec<_>>();

        let fields = inst
            .fields
            .iter()
            .enumerate()
            .map(|(f, field)| {
                let choice = &a.choices[f];
                let mut irrigation = Grid::zeros([n_s, n_c, n_h]);
                let mut water_rel = Grid::zeros([n_s, 1, n_h]);
                let mut yield_ratio = Grid::zeros([n_s, 1, n_h]);
                for s in 0..n_s {
                    for h in 0..n_h {
                        irrigation.set(s, choice.crops[s], h, *a.irrigation.get(f, s, h));
                        water_rel.set(s, 0, h, *ev.water_rel.get(f, s, h));
                        yield_ratio.set(s, 0, h, *ev.yield_ratio.get(f, s, h));
                    }
                }
                FieldSolution {
                    id:              field.id.clone(),
                    crops:           choice.crops.iter().map(|&c| inst.crops[c].name.clone()).collect(),
                    rainfed:         choice.rainfed.clone(),
                    tech:            inst.techs[choice.tech].name.clone(),
                    irrigation,
                    water_rel,
                    yield_ratio,
                    volume:          series(&ev.field_volume, f),
                    avg_yield_ratio: series(&ev.field_yield, f),
                    pumping_rate:    series(&ev.field_rate, f),
                    pressure_head:   ev.field_head[f],
                }
            })
            .collect::<Vec<_>>();

        let volume: Vec<f64> = (0..n_h)
            .map(|h| (0..inst.fields.len()).map(|f| *ev.field_volume.get(f, 0, h)).sum())
            .collect();

        let wells = inst
            .wells
            .iter()
            .enumerate()
            .map(|(k, well)| {
                let withdrawal = series(&ev.withdrawal, k);
                let allocation = withdrawal
                    .iter()
                    .enumerate()
                    .map(|(h, v)| {
                        if volume[h] > 0.0 {
                            v / volume[h]
                        } else {
                            (0..inst.fields.len()).map(|f| *a.allocation.get(f, k, h)).sum::<f64>()
                                / inst.fields.len() as f64
                        }
                    })
                    .collect();
                WellSolution {
                    id:            well.spec.id.clone(),
                    withdrawal,
                    allocation,
                    pumping_rate:  series(&ev.well_rate, k),
                    pressure_head: series(&ev.well_head, k),
                    static_lift:   series(&ev.static_lift, k),
                    well_loss:     series(&ev.well_loss, k),
                    total_lift:    series(&ev.total_lift, k),
                    energy:        series(&ev.energy, k),
                }
            })
            .collect::<Vec<_>>();

        let energy = (0..n_h).map(|h| wells.iter().map(|w| w.energy[h]).sum()).collect();

        let water_rights = inst
            .water_rights
            .iter()
            .map(|wr| {
                let depth = |h: usize| -> f64 {
                    wr.fields
                        .iter()
                        .flat_map(|&f| (0..n_s).map(move |s| (f, s)))
                        .map(|(f, s)| *a.irrigation.get(f, s, h))
                        .sum()
                };
                WaterRightUsage {
                    id:             wr.spec.id.clone(),
                    windows:        wr.windows.clone(),
                    used:           wr.windows.iter().map(|w| (w.start..w.end).map(|h| depth(h)).sum()).collect(),
                    first_year_use: depth(0),
                }
            })
            .collect();

        Solution {
            name: inst.name.clone(),
            status,
            objective: ev.objective,
            gap,
            horizon: n_h,
            crop_options: inst.crops.iter().map(|c| c.name.clone()).collect(),
            tech_options: inst.techs.iter().map(|t| t.name.clone()).collect(),
            fields,
            wells,
            allocation: a.allocation.clone(),
            totals: AggregateSolution {
                volume,
                energy,
                revenue:   ev.revenue,
                cost:      ev.cost,
                profit:    ev.profit,
                yield_pct: ev.yield_pct,
            },
            sa: ev.sa,
            water_rights,
        }
    }

    /// Forecast `Sa` of `metric`, if it was weighted.
    pub fn sa(&self, metric: Metric) -> Option<f64> {
        *self.sa.get(metric)
    }

    pub fn field(&self, id: &str) -> Option<&FieldSolution> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn well(&self, id: &str) -> Option<&WellSolution> {
        self.wells.iter().find(|w| w.id == id)
    }

    /// Allocation ratio of field `f` to well `k` in horizon year `h`.
    #[inline]
    pub fn allocation_ratio(&self, f: usize, k: usize, h: usize) -> f64 {
        *self.allocation.get(f, k, h)
    }
}
