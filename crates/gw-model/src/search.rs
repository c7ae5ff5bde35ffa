//! `SearchSolver`: the built-in conforming backend.
//!
//! # Method
//!
//! 1. **Presolve.**  Structural conflicts (unusable well-loss logarithm,
//!    sub-areas whose yield bounds no crop can meet, water-right windows or
//!    pumping capacities smaller than the least irrigation the yield bounds
//!    force) are found without searching.
//! 2. **Enumeration.**  Every combination of crop, rain-fed flag and
//!    technology the pins allow is visited in a fixed order.  Sub-areas of a
//!    field without crop or rain-fed pins are interchangeable, so multisets
//!    of cell options are enumerated instead of sequences.
//! 3. **Local search.**  Per combination, phase one drives the constraint
//!    violation to zero starting from zero irrigation; phase two maximizes
//!    the objective with single-coordinate and pairwise-transfer line
//!    searches over irrigation depths and allocation ratios.  Each line search
//!    locates the feasible interval by bisection and then runs a
//!    golden-section search.
//!
//! The result is deterministic for a given instance and option set.
//!
//! # Options
//!
//! | Key               | Meaning                                   | Default |
//! |-------------------|-------------------------------------------|---------|
//! | `TimeLimit`       | wall-clock budget in seconds              | none    |
//! | `MaxSweeps`       | sweeps per combination and phase          | 200     |
//! | `Tolerance`       | relative objective change for convergence | 1e-7    |
//! | `MaxCombinations` | cap on enumerated discrete combinations   | 100000  |

use std::time::{Duration, Instant};

use tracing::debug;

use gw_core::{CropParams, SolverOptions};

use crate::eval::{Assignment, FieldChoice, evaluate, violated};
use crate::instance::{CM_TO_M, FieldBlock};
use crate::{
    Conflict, ConstraintRef, ModelError, ModelResult, OptimizationInstance, Solution, SolveOutcome,
    SolveStatus, Solver,
};

/// Absolute violation below which a point counts as feasible.
const FEAS_TOL: f64 = 1e-9;
const GOLDEN_ITERS: usize = 80;
const BISECT_ITERS: usize = 60;
/// Samples per cell when bracketing the least feasible irrigation depth.
const PRESOLVE_SAMPLES: usize = 1024;

const KNOWN_OPTIONS: [&str; 4] = ["TimeLimit", "MaxSweeps", "Tolerance", "MaxCombinations"];

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchSolver;

#[derive(Clone, Copy, Debug)]
struct Settings {
    time_limit:       Option<Duration>,
    max_sweeps:       usize,
    tolerance:        f64,
    max_combinations: usize,
}

impl Settings {
    fn from_options(options: &SolverOptions) -> Self {
        for key in options.0.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                debug!(option = %key, "ignoring unknown solver option");
            }
        }
        Self {
            time_limit:       options
                .get_f64("TimeLimit")
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(Duration::from_secs_f64),
            max_sweeps:       options.get_usize("MaxSweeps").unwrap_or(200).max(1),
            tolerance:        options.get_f64("Tolerance").unwrap_or(1e-7).max(0.0),
            max_combinations: options.get_usize("MaxCombinations").unwrap_or(100_000),
        }
    }
}

/// How a local search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Termination {
    Converged,
    SweepLimit,
    TimeLimit,
}

impl Solver for SearchSolver {
    fn name(&self) -> &str {
        "search"
    }

    fn solve(&self, inst: &OptimizationInstance, options: &SolverOptions) -> ModelResult<SolveOutcome> {
        let settings = Settings::from_options(options);
        let deadline = settings.time_limit.map(|d| Instant::now() + d);

        let structural = presolve(inst);
        if !structural.is_empty() {
            debug!(model = inst.name(), conflict = %structural, "structurally infeasible");
            return Ok(SolveOutcome::infeasible());
        }

        let combos = enumerate(inst, settings.max_combinations)?;
        let search = LocalSearch { inst, settings, deadline };

        let mut best: Option<(Assignment, f64, f64, Termination)> = None;
        let mut timed_out = false;
        for choices in combos {
            if search.expired() {
                timed_out = true;
                break;
            }
            let mut a = Assignment::zero(inst, choices);
            match search.phase_one(&mut a) {
                Termination::TimeLimit => {
                    timed_out = true;
                    break;
                }
                _ if evaluate(inst, &a).violation > FEAS_TOL => continue,
                _ => {}
            }
            let (objective, gap, end) = search.phase_two(&mut a);
            if best.as_ref().is_none_or(|b| objective > b.1) {
                best = Some((a, objective, gap, end));
            }
            if end == Termination::TimeLimit {
                timed_out = true;
                break;
            }
        }

        let Some((a, objective, gap, end)) = best else {
            if timed_out {
                return Ok(SolveOutcome {
                    status:    SolveStatus::Other("TimeLimit".into()),
                    objective: None,
                    solution:  None,
                    gap:       None,
                });
            }
            return Ok(SolveOutcome::infeasible());
        };

        let status = match (timed_out, end) {
            (true, _) | (_, Termination::TimeLimit) => SolveStatus::Other("TimeLimit".into()),
            (_, Termination::SweepLimit)            => SolveStatus::Other("MaxSweeps".into()),
            (_, Termination::Converged)             => SolveStatus::Optimal,
        };
        let solution = Solution::from_assignment(inst, &a, status.clone(), Some(gap));
        Ok(SolveOutcome { status, objective: Some(objective), solution: Some(solution), gap: Some(gap) })
    }

    fn conflict(&self, inst: &OptimizationInstance, options: &SolverOptions) -> ModelResult<Conflict> {
        let structural = presolve(inst);
        if !structural.is_empty() {
            return Ok(structural);
        }

        // No structural cause: report what the least-violating combination
        // still breaks after phase one.
        let settings = Settings::from_options(options);
        let search = LocalSearch { inst, settings, deadline: None };
        let mut least: Option<(Assignment, f64)> = None;
        for choices in enumerate(inst, settings.max_combinations)? {
            let mut a = Assignment::zero(inst, choices);
            search.phase_one(&mut a);
            let v = evaluate(inst, &a).violation;
            if v <= FEAS_TOL {
                return Ok(Conflict::default());
            }
            if least.as_ref().is_none_or(|l| v < l.1) {
                least = Some((a, v));
            }
        }
        let constraints = least.map(|(a, _)| violated(inst, &a, FEAS_TOL)).unwrap_or_default();
        Ok(Conflict { constraints })
    }
}

// ── Enumeration ───────────────────────────────────────────────────────────────

/// Discrete options of one field.
fn field_choices(inst: &OptimizationInstance, field: &FieldBlock) -> Vec<FieldChoice> {
    let n_s = inst.area_split;
    let crop_opts = |s: usize| -> Vec<usize> {
        match &field.fixed_crop {
            Some(pins) => vec![pins[s]],
            None       => (0..inst.crops.len()).collect(),
        }
    };
    let rain_opts = |s: usize| -> Vec<bool> {
        match &field.fixed_rainfed {
            Some(pins)                      => vec![pins[s]],
            None if field.rain_fed_allowed  => vec![false, true],
            None                            => vec![false],
        }
    };
    let techs: Vec<usize> = match field.fixed_tech {
        Some(t) => vec![t],
        None    => (0..inst.techs.len()).collect(),
    };

    let cells: Vec<Vec<(usize, bool)>> = (0..n_s)
        .map(|s| {
            let rains = rain_opts(s);
            crop_opts(s)
                .into_iter()
                .flat_map(|c| rains.iter().map(move |&r| (c, r)))
                .collect()
        })
        .collect();

    let interchangeable = field.fixed_crop.is_none() && field.fixed_rainfed.is_none();
    let layouts: Vec<Vec<(usize, bool)>> = if interchangeable {
        multisets(&cells[0], n_s)
    } else {
        product(&cells)
    };

    let mut out = Vec::with_capacity(layouts.len() * techs.len());
    for layout in &layouts {
        for &tech in &techs {
            out.push(FieldChoice {
                crops:   layout.iter().map(|&(c, _)| c).collect(),
                rainfed: layout.iter().map(|&(_, r)| r).collect(),
                tech,
            });
        }
    }
    out
}

/// Non-decreasing index sequences of length `k` over `items`.
fn multisets<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    let mut idx = vec![0usize; k];
    if items.is_empty() {
        return out;
    }
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());
        let Some(pos) = (0..k).rev().find(|&p| idx[p] + 1 < items.len()) else {
            return out;
        };
        let next = idx[pos] + 1;
        for slot in &mut idx[pos..] {
            *slot = next;
        }
    }
}

fn product<T: Copy>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |&x| {
                    let mut v = prefix.clone();
                    v.push(x);
                    v
                })
            })
            .collect()
    })
}

fn binomial(n: u128, k: u128) -> u128 {
    let k = k.min(n.saturating_sub(k));
    (0..k).fold(1u128, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

/// Number of combinations [`enumerate`] would produce, saturating.
fn count_combinations(inst: &OptimizationInstance) -> u128 {
    let n_s = inst.area_split as u128;
    inst.fields.iter().fold(1u128, |acc, f| {
        let crops = if f.fixed_crop.is_some() { 1 } else { inst.crops.len() as u128 };
        let rains = if f.fixed_rainfed.is_some() || !f.rain_fed_allowed { 1 } else { 2 };
        let techs = if f.fixed_tech.is_some() { 1 } else { inst.techs.len() as u128 };
        let layouts = if f.fixed_crop.is_none() && f.fixed_rainfed.is_none() {
            binomial(crops * rains + n_s - 1, n_s)
        } else {
            (crops * rains).saturating_pow(n_s as u32)
        };
        acc.saturating_mul(layouts.saturating_mul(techs))
    })
}

fn enumerate(inst: &OptimizationInstance, max: usize) -> ModelResult<Vec<Vec<FieldChoice>>> {
    let count = count_combinations(inst);
    if count > max as u128 {
        return Err(ModelError::Solver(format!(
            "{count} discrete combinations exceed MaxCombinations = {max}"
        )));
    }
    let per_field: Vec<Vec<FieldChoice>> =
        inst.fields.iter().map(|f| field_choices(inst, f)).collect();
    Ok(per_field.iter().fold(vec![Vec::new()], |acc, options| {
        acc.iter()
            .flat_map(|prefix| {
                options.iter().map(move |o| {
                    let mut v: Vec<FieldChoice> = prefix.clone();
                    v.push(o.clone());
                    v
                })
            })
            .collect()
    }))
}

// ── Local search ──────────────────────────────────────────────────────────────

/// A search direction.
#[derive(Clone, Copy, Debug)]
enum Dir {
    /// One irrigation cell `(field, split, year)`.
    Cell(Cell),
    /// Move depth from the second cell to the first.
    Pair(Cell, Cell),
    /// Move allocation share of `(field, year)` from well `from` to well `to`.
    Transfer { field: usize, year: usize, to: usize, from: usize },
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    f:  usize,
    s:  usize,
    h:  usize,
    ub: f64,
}

struct LocalSearch<'a> {
    inst:     &'a OptimizationInstance,
    settings: Settings,
    deadline: Option<Instant>,
}

impl LocalSearch<'_> {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn directions(&self, a: &Assignment) -> Vec<Dir> {
        let inst = self.inst;
        let mut cells = Vec::new();
        for (f, field) in inst.fields.iter().enumerate() {
            let choice = &a.choices[f];
            for s in 0..inst.area_split {
                if choice.rainfed[s] {
                    continue;
                }
                let c = choice.crops[s];
                let ub = field.irrigation_ub(&inst.crops[c], c);
                if ub <= 0.0 {
                    continue;
                }
                for h in 0..inst.horizon {
                    cells.push(Cell { f, s, h, ub });
                }
            }
        }

        let mut dirs: Vec<Dir> = cells.iter().map(|&c| Dir::Cell(c)).collect();
        for (i, &ci) in cells.iter().enumerate() {
            for &cj in &cells[i + 1..] {
                dirs.push(Dir::Pair(ci, cj));
            }
        }
        let n_w = inst.wells.len();
        for field in 0..inst.fields.len() {
            for year in 0..inst.horizon {
                for to in 0..n_w {
                    for from in to + 1..n_w {
                        dirs.push(Dir::Transfer { field, year, to, from });
                    }
                }
            }
        }
        dirs
    }

    /// Step bounds `[lo, hi]` (with `lo <= 0 <= hi`) keeping `a + t·dir` in
    /// the variable box.
    fn step_bounds(a: &Assignment, dir: Dir) -> (f64, f64) {
        let irr = |c: Cell| *a.irrigation.get(c.f, c.s, c.h);
        match dir {
            Dir::Cell(c) => (-irr(c), c.ub - irr(c)),
            Dir::Pair(ci, cj) => {
                let (xi, xj) = (irr(ci), irr(cj));
                ((-xi).max(xj - cj.ub), (ci.ub - xi).min(xj))
            }
            Dir::Transfer { field, year, to, from } => {
                let r_to = *a.allocation.get(field, to, year);
                let r_from = *a.allocation.get(field, from, year);
                (-r_to, r_from)
            }
        }
    }

    fn apply(a: &mut Assignment, dir: Dir, t: f64) {
        match dir {
            Dir::Cell(c) => {
                let x = a.irrigation.get_mut(c.f, c.s, c.h);
                *x = (*x + t).clamp(0.0, c.ub);
            }
            Dir::Pair(ci, cj) => {
                let xi = a.irrigation.get_mut(ci.f, ci.s, ci.h);
                *xi = (*xi + t).clamp(0.0, ci.ub);
                let xj = a.irrigation.get_mut(cj.f, cj.s, cj.h);
                *xj = (*xj - t).clamp(0.0, cj.ub);
            }
            Dir::Transfer { field, year, to, from } => {
                let r = a.allocation.get_mut(field, to, year);
                *r = (*r + t).clamp(0.0, 1.0);
                let r = a.allocation.get_mut(field, from, year);
                *r = (*r - t).clamp(0.0, 1.0);
            }
        }
    }

    fn shifted(a: &Assignment, dir: Dir, t: f64) -> Assignment {
        let mut b = a.clone();
        Self::apply(&mut b, dir, t);
        b
    }

    /// Maximize `score` along `dir` from `a`; `a` moves only on strict
    /// improvement.  Returns the new score.
    fn line_search<F>(&self, a: &mut Assignment, dir: Dir, current: f64, score: &F) -> f64
    where
        F: Fn(&Assignment) -> Option<f64>,
    {
        let (lo, hi) = Self::step_bounds(a, dir);
        if hi - lo <= 0.0 {
            return current;
        }
        let g = |t: f64| score(&Self::shifted(a, dir, t));

        // Feasible extent on each side of t = 0.
        let extent = |bound: f64| -> f64 {
            if bound == 0.0 || g(bound).is_some() {
                return bound;
            }
            let (mut good, mut bad) = (0.0, bound);
            for _ in 0..BISECT_ITERS {
                let mid = 0.5 * (good + bad);
                if g(mid).is_some() { good = mid } else { bad = mid }
            }
            good
        };
        let (lo, hi) = (extent(lo), extent(hi));
        if hi - lo <= 0.0 {
            return current;
        }

        let value = |t: f64| g(t).unwrap_or(f64::NEG_INFINITY);
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let x_tol = 1e-9 * (1.0 + hi - lo);
        let (mut left, mut right) = (lo, hi);
        let mut c = right - ratio * (right - left);
        let mut d = left + ratio * (right - left);
        let (mut fc, mut fd) = (value(c), value(d));
        for _ in 0..GOLDEN_ITERS {
            if right - left <= x_tol {
                break;
            }
            if fc >= fd {
                right = d;
                d = c;
                fd = fc;
                c = right - ratio * (right - left);
                fc = value(c);
            } else {
                left = c;
                c = d;
                fc = fd;
                d = left + ratio * (right - left);
                fd = value(d);
            }
        }

        let mut best_t = 0.0;
        let mut best = current;
        for t in [0.5 * (left + right), lo, hi] {
            let v = value(t);
            if v > best {
                best = v;
                best_t = t;
            }
        }
        if best_t != 0.0 {
            Self::apply(a, dir, best_t);
        }
        best
    }

    fn sweeps<F>(&self, a: &mut Assignment, score: F, done: impl Fn(f64) -> bool) -> (f64, f64, Termination)
    where
        F: Fn(&Assignment) -> Option<f64>,
    {
        let dirs = self.directions(a);
        let mut current = score(a).unwrap_or(f64::NEG_INFINITY);
        let mut gap = 0.0;
        for _ in 0..self.settings.max_sweeps {
            if done(current) {
                return (current, gap, Termination::Converged);
            }
            if self.expired() {
                return (current, gap, Termination::TimeLimit);
            }
            let before = current;
            for &dir in &dirs {
                current = self.line_search(a, dir, current, &score);
            }
            gap = if current.is_finite() && before.is_finite() {
                (current - before).abs() / current.abs().max(1e-12)
            } else {
                f64::INFINITY
            };
            if current - before <= self.settings.tolerance * (1.0 + before.abs()) {
                return (current, gap, Termination::Converged);
            }
        }
        (current, gap, Termination::SweepLimit)
    }

    /// Minimize total violation inside the variable box.
    fn phase_one(&self, a: &mut Assignment) -> Termination {
        let inst = self.inst;
        let (_, _, end) = self.sweeps(a, |b| Some(-evaluate(inst, b).violation), |v| -v <= FEAS_TOL);
        end
    }

    /// Maximize the objective over feasible points.
    fn phase_two(&self, a: &mut Assignment) -> (f64, f64, Termination) {
        let inst = self.inst;
        let feasible_objective = |b: &Assignment| {
            let ev = evaluate(inst, b);
            (ev.violation <= FEAS_TOL).then_some(ev.objective)
        };
        self.sweeps(a, feasible_objective, |_| false)
    }
}

// ── Presolve ──────────────────────────────────────────────────────────────────

fn ratio_ok(crop: &CropParams, prec: f64, irr: f64) -> bool {
    let r = crop.response((irr + prec) / crop.max_water);
    (-FEAS_TOL..=1.0 + FEAS_TOL).contains(&r)
}

/// Least irrigation depth on `[0, ub]` that keeps the yield ratio in `[0, 1]`.
fn least_feasible_irrigation(crop: &CropParams, prec: f64, ub: f64, rainfed: bool) -> Option<f64> {
    if ratio_ok(crop, prec, 0.0) {
        return Some(0.0);
    }
    if rainfed || ub <= 0.0 {
        return None;
    }
    let step = ub / PRESOLVE_SAMPLES as f64;
    let first = (1..=PRESOLVE_SAMPLES).find(|&i| ratio_ok(crop, prec, i as f64 * step))?;
    let (mut bad, mut good) = ((first - 1) as f64 * step, first as f64 * step);
    for _ in 0..BISECT_ITERS {
        let mid = 0.5 * (bad + good);
        if ratio_ok(crop, prec, mid) { good = mid } else { bad = mid }
    }
    Some(good)
}

/// Structural conflicts that no assignment can resolve.
pub(crate) fn presolve(inst: &OptimizationInstance) -> Conflict {
    let mut constraints = Vec::new();

    for w in &inst.wells {
        if w.log_term < 0.0 {
            constraints.push(ConstraintRef::WellLoss { well: w.spec.id.clone() });
        }
    }

    // Least depth each sub-area needs under its best allowed option.
    let mut least = vec![vec![0.0; inst.area_split]; inst.fields.len()];
    for (f, field) in inst.fields.iter().enumerate() {
        for s in 0..inst.area_split {
            let crops: Vec<usize> = match &field.fixed_crop {
                Some(p) => vec![p[s]],
                None    => (0..inst.crops.len()).collect(),
            };
            let rains: Vec<bool> = match &field.fixed_rainfed {
                Some(p)                         => vec![p[s]],
                None if field.rain_fed_allowed  => vec![false, true],
                None                            => vec![false],
            };
            let best = crops
                .iter()
                .flat_map(|&c| rains.iter().map(move |&r| (c, r)))
                .filter_map(|(c, r)| {
                    let crop = &inst.crops[c];
                    least_feasible_irrigation(&crop.params, field.precipitation[c], field.irrigation_ub(crop, c), r)
                })
                .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))));
            match best {
                Some(x) => least[f][s] = x,
                None => {
                    if field.fixed_crop.is_some() {
                        constraints.push(ConstraintRef::Pin { field: field.id.clone(), what: "i_crop".into() });
                    }
                    if field.fixed_rainfed.is_some() {
                        constraints.push(ConstraintRef::Pin { field: field.id.clone(), what: "i_rainfed".into() });
                    }
                    for h in 0..inst.horizon {
                        constraints.push(ConstraintRef::YieldBound { field: field.id.clone(), split: s, year: h });
                    }
                }
            }
        }
    }
    if !constraints.is_empty() {
        return Conflict { constraints };
    }

    let forced = |f: usize, h: usize| -> Vec<ConstraintRef> {
        (0..inst.area_split)
            .filter(|&s| least[f][s] > 0.0)
            .map(|s| ConstraintRef::YieldBound { field: inst.fields[f].id.clone(), split: s, year: h })
            .collect()
    };

    for wr in &inst.water_rights {
        for (i, win) in wr.windows.iter().enumerate() {
            let need: f64 = wr.fields.iter().map(|&f| least[f].iter().sum::<f64>()).sum::<f64>()
                * win.len() as f64;
            if need > win.cap + FEAS_TOL {
                constraints.push(ConstraintRef::WaterRight { id: wr.spec.id.clone(), window: i });
                for &f in &wr.fields {
                    for h in win.start..win.end {
                        constraints.extend(forced(f, h));
                    }
                }
            }
        }
    }

    let caps: Option<f64> = inst.wells.iter().map(|w| w.spec.pumping_capacity).sum();
    if let Some(total_cap) = caps {
        let volume: f64 = least.iter().flatten().sum::<f64>() * inst.unit_area * CM_TO_M;
        if volume > total_cap + FEAS_TOL {
            for w in &inst.wells {
                constraints.push(ConstraintRef::PumpingCapacity { well: w.spec.id.clone(), year: 0 });
            }
            for f in 0..inst.fields.len() {
                constraints.push(ConstraintRef::Allocation { field: inst.fields[f].id.clone(), year: 0 });
                constraints.extend(forced(f, 0));
            }
        }
    }

    Conflict { constraints }
}
