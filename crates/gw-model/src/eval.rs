//! Evaluation of a candidate assignment against an instance.
//!
//! Backends search over [`Assignment`]s; [`evaluate`] derives every dependent
//! quantity (yields, volumes, well lifts, energy, finance, satisfaction) and
//! measures how far the assignment is from satisfying the constraints.

use gw_core::{Metric, MetricTable, saturating_need};

use crate::instance::CM_TO_M;
use crate::{ConstraintRef, Grid, OptimizationInstance};

/// Discrete decisions for one field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldChoice {
    /// Crop option index per sub-area.
    pub crops:   Vec<usize>,
    /// Rain-fed flag per sub-area.
    pub rainfed: Vec<bool>,
    pub tech:    usize,
}

/// A complete candidate point.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub choices:    Vec<FieldChoice>,
    /// Irrigation depth of the selected crop `(field, split, year)` [cm].
    pub irrigation: Grid<f64>,
    /// Share of each field's volume drawn from each well `(field, well, year)`.
    pub allocation: Grid<f64>,
}

impl Assignment {
    /// Zero irrigation and an even split across wells.
    pub fn zero(inst: &OptimizationInstance, choices: Vec<FieldChoice>) -> Self {
        let (n_f, n_w, n_h) = (inst.fields.len(), inst.wells.len(), inst.horizon);
        Self {
            choices,
            irrigation: Grid::zeros([n_f, inst.area_split, n_h]),
            allocation: Grid::filled([n_f, n_w, n_h], 1.0 / n_w as f64),
        }
    }
}

/// Every quantity derived from an [`Assignment`].
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// `(field, split, year)`.
    pub water_rel:      Grid<f64>,
    pub yield_ratio:    Grid<f64>,
    /// `(field, 1, year)` [m-ha].
    pub field_volume:   Grid<f64>,
    pub field_yield:    Grid<f64>,
    pub field_rate:     Grid<f64>,
    pub field_head:     Vec<f64>,
    /// `(well, 1, year)`.
    pub withdrawal:     Grid<f64>,
    pub well_rate:      Grid<f64>,
    pub well_head:      Grid<f64>,
    pub static_lift:    Grid<f64>,
    pub well_loss:      Grid<f64>,
    pub total_lift:     Grid<f64>,
    pub energy:         Grid<f64>,
    pub revenue:        Vec<f64>,
    pub cost:           Vec<f64>,
    pub profit:         Vec<f64>,
    pub yield_pct:      Vec<f64>,
    pub sa:             MetricTable<Option<f64>>,
    pub objective:      f64,
    /// Sum of constraint violations; zero for a feasible point.
    pub violation:      f64,
}

impl Evaluation {
    pub fn is_feasible(&self, tol: f64) -> bool {
        self.violation <= tol
    }

    /// The per-year series of `metric`.
    pub fn metric(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Profit   => &self.profit,
            Metric::YieldPct => &self.yield_pct,
        }
    }
}

/// Derive all quantities of `a` and its total constraint violation.
pub fn evaluate(inst: &OptimizationInstance, a: &Assignment) -> Evaluation {
    walk(inst, a, 0.0, None)
}

/// The constraints `a` violates by more than `tol`.
pub fn violated(inst: &OptimizationInstance, a: &Assignment, tol: f64) -> Vec<ConstraintRef> {
    let mut out = Vec::new();
    walk(inst, a, tol, Some(&mut out));
    out
}

fn walk(
    inst: &OptimizationInstance,
    a: &Assignment,
    tol: f64,
    mut report: Option<&mut Vec<ConstraintRef>>,
) -> Evaluation {
    let n_f = inst.fields.len();
    let n_w = inst.wells.len();
    let n_s = inst.area_split;
    let n_h = inst.horizon;

    let mut violation = 0.0;
    let mut flag = |amount: f64, what: &dyn Fn() -> ConstraintRef| {
        if amount > 0.0 {
            violation += amount;
            if amount > tol {
                if let Some(out) = report.as_deref_mut() {
                    out.push(what());
                }
            }
        }
    };

    // ── Fields ────────────────────────────────────────────────────────────
    let mut water_rel = Grid::zeros([n_f, n_s, n_h]);
    let mut yield_ratio = Grid::zeros([n_f, n_s, n_h]);
    let mut field_volume = Grid::zeros([n_f, 1, n_h]);
    let mut field_yield = Grid::zeros([n_f, 1, n_h]);
    let mut field_rate = Grid::zeros([n_f, 1, n_h]);
    let mut field_head = vec![0.0; n_f];
    let mut revenue = vec![0.0; n_h];

    for (f, field) in inst.fields.iter().enumerate() {
        let choice = &a.choices[f];
        for s in 0..n_s {
            let c = choice.crops[s];
            let crop = &inst.crops[c];
            let ub = field.irrigation_ub(crop, c);
            for h in 0..n_h {
                let irr = *a.irrigation.get(f, s, h);
                flag(-irr, &|| ConstraintRef::WaterLimit { field: field.id.clone(), split: s, year: h });
                flag(irr - ub, &|| ConstraintRef::WaterLimit { field: field.id.clone(), split: s, year: h });
                if choice.rainfed[s] {
                    flag(irr.abs(), &|| ConstraintRef::RainFed { field: field.id.clone(), split: s, year: h });
                }

                let w_rel = (irr + field.precipitation[c]) / crop.params.max_water;
                let ratio = crop.params.response(w_rel);
                flag(-ratio, &|| ConstraintRef::YieldBound { field: field.id.clone(), split: s, year: h });
                flag(ratio - 1.0, &|| ConstraintRef::YieldBound { field: field.id.clone(), split: s, year: h });

                water_rel.set(f, s, h, w_rel);
                yield_ratio.set(f, s, h, ratio);
                *field_volume.get_mut(f, 0, h) += irr * inst.unit_area * CM_TO_M;
                *field_yield.get_mut(f, 0, h) += ratio / n_s as f64;
                revenue[h] += ratio * crop.params.max_yield * crop.profit;
            }
        }
        let tech = &inst.techs[choice.tech].params;
        field_head[f] = tech.pressure_head;
        for h in 0..n_h {
            let v = *field_volume.get(f, 0, h);
            field_rate.set(f, 0, h, tech.slope * v + tech.intercept);
        }
    }

    // ── Allocation ────────────────────────────────────────────────────────
    for (f, field) in inst.fields.iter().enumerate() {
        for h in 0..n_h {
            let mut sum = 0.0;
            for k in 0..n_w {
                let r = *a.allocation.get(f, k, h);
                flag(-r, &|| ConstraintRef::Allocation { field: field.id.clone(), year: h });
                sum += r;
            }
            flag((sum - 1.0).abs(), &|| ConstraintRef::Allocation { field: field.id.clone(), year: h });
        }
    }

    // ── Wells ─────────────────────────────────────────────────────────────
    let mut withdrawal = Grid::zeros([n_w, 1, n_h]);
    let mut well_rate = Grid::zeros([n_w, 1, n_h]);
    let mut well_head = Grid::zeros([n_w, 1, n_h]);
    let mut static_lift = Grid::zeros([n_w, 1, n_h]);
    let mut well_loss = Grid::zeros([n_w, 1, n_h]);
    let mut total_lift = Grid::zeros([n_w, 1, n_h]);
    let mut energy = Grid::zeros([n_w, 1, n_h]);
    let mut cost = vec![0.0; n_h];

    for (k, well) in inst.wells.iter().enumerate() {
        for h in 0..n_h {
            let (mut v, mut q, mut head) = (0.0, 0.0, 0.0);
            for f in 0..n_f {
                let r = *a.allocation.get(f, k, h);
                v += field_volume.get(f, 0, h) * r;
                q += field_rate.get(f, 0, h) * r;
                head += field_head[f] * r;
            }
            if let Some(cap) = well.spec.pumping_capacity {
                flag(v - cap, &|| ConstraintRef::PumpingCapacity { well: well.spec.id.clone(), year: h });
            }
            let lift = well.static_lift(h);
            let loss = well.loss_coef * q;
            let total = lift + loss + head;
            let e = well.energy_coef * v * total;

            withdrawal.set(k, 0, h, v);
            well_rate.set(k, 0, h, q);
            well_head.set(k, 0, h, head);
            static_lift.set(k, 0, h, lift);
            well_loss.set(k, 0, h, loss);
            total_lift.set(k, 0, h, total);
            energy.set(k, 0, h, e);
            cost[h] += e * inst.energy_price;
        }
        if well.log_term < 0.0 {
            flag(-well.log_term, &|| ConstraintRef::WellLoss { well: well.spec.id.clone() });
        }
    }

    // ── Water rights ──────────────────────────────────────────────────────
    for wr in &inst.water_rights {
        for (i, win) in wr.windows.iter().enumerate() {
            let mut used = 0.0;
            for &f in &wr.fields {
                for s in 0..n_s {
                    for h in win.start..win.end {
                        used += a.irrigation.get(f, s, h);
                    }
                }
            }
            flag(used - win.cap, &|| ConstraintRef::WaterRight { id: wr.spec.id.clone(), window: i });
        }
    }

    // ── Finance & satisfaction ────────────────────────────────────────────
    let profit: Vec<f64> = revenue.iter().zip(&cost).map(|(r, c)| r - c).collect();
    let yield_pct: Vec<f64> = (0..n_h)
        .map(|h| (0..n_f).map(|f| field_yield.get(f, 0, h)).sum::<f64>() / n_f as f64)
        .collect();

    let obj = &inst.objective;
    let mut sa = MetricTable::<Option<f64>>::default();
    for (metric, alpha) in obj.alphas.weighted() {
        let series = match metric {
            Metric::Profit   => &profit,
            Metric::YieldPct => &yield_pct,
        };
        let scale = *obj.scales.get(metric);
        let mean = series.iter().map(|x| saturating_need(alpha, x / scale)).sum::<f64>() / n_h as f64;
        *sa.get_mut(metric) = Some(mean);
    }
    let objective = sa.get(obj.eval).unwrap_or(f64::NEG_INFINITY);

    Evaluation {
        water_rel,
        yield_ratio,
        field_volume,
        field_yield,
        field_rate,
        field_head,
        withdrawal,
        well_rate,
        well_head,
        static_lift,
        well_loss,
        total_lift,
        energy,
        revenue,
        cost,
        profit,
        yield_pct,
        sa,
        objective,
        violation,
    }
}
