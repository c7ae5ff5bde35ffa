//! Solver adapter: the [`Solver`] backend trait and the shared [`SolverEnv`].
//!
//! # Pluggability
//!
//! Agents never talk to a backend directly.  They go through a `SolverEnv`,
//! which owns one boxed [`Solver`], the pass-through options, and the
//! lifecycle flag.  Any backend honouring the contract below can be swapped
//! in; the workspace ships [`SearchSolver`](crate::SearchSolver).
//!
//! # Thread safety
//!
//! Backends must be `Send + Sync`: one environment is shared by every agent
//! during the parallel decision phase, and each `solve` call works only on
//! the instance it is given.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use gw_core::SolverOptions;

use crate::{Conflict, ModelError, ModelResult, OptimizationInstance, SearchSolver, Solution, SolveStatus};

// ── Solver trait ──────────────────────────────────────────────────────────────

pub trait Solver: Send + Sync {
    fn name(&self) -> &str;

    /// Solve `instance` synchronously.
    ///
    /// Status `Infeasible` is an outcome, not an error.  `Err` is reserved for
    /// backend failures, which are reported verbatim.
    fn solve(&self, instance: &OptimizationInstance, options: &SolverOptions) -> ModelResult<SolveOutcome>;

    /// A set of constraints of `instance` that cannot hold together.
    fn conflict(&self, instance: &OptimizationInstance, options: &SolverOptions) -> ModelResult<Conflict>;
}

/// What a backend returns for one instance.
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub status:    SolveStatus,
    pub objective: Option<f64>,
    pub solution:  Option<Solution>,
    pub gap:       Option<f64>,
}

impl SolveOutcome {
    pub fn infeasible() -> Self {
        Self { status: SolveStatus::Infeasible, objective: None, solution: None, gap: None }
    }

    /// The solution, or the error this outcome amounts to.
    ///
    /// Only an optimal status yields a solution.  A backend that stopped early
    /// (time limit, sweep limit) is a [`ModelError::Solver`] even when it holds
    /// an incumbent; callers that want the incumbent read `solution` directly.
    pub fn into_solution(self) -> ModelResult<Solution> {
        match (self.status, self.solution) {
            (SolveStatus::Infeasible, _) => Err(ModelError::Infeasible { conflict: None }),
            (status, Some(sol)) if status.is_optimal() => Ok(sol),
            (SolveStatus::Other(reason), Some(_)) => {
                Err(ModelError::Solver(format!("solver stopped before optimality: {reason}")))
            }
            (SolveStatus::Other(reason), None) => {
                Err(ModelError::Solver(format!("no solution: {reason}")))
            }
            (_, _) => Err(ModelError::Solver("optimal status without an assignment".into())),
        }
    }
}

// ── SolverEnv ─────────────────────────────────────────────────────────────────

/// The heavy, shared solving context.
///
/// Acquired once per run and reused by every solve.  After
/// [`dispose`](Self::dispose) every build or solve fails with
/// [`ModelError::ResourceLifecycle`].
pub struct SolverEnv {
    backend:  Box<dyn Solver>,
    options:  SolverOptions,
    disposed: AtomicBool,
}

impl SolverEnv {
    pub fn new(backend: impl Solver + 'static, options: SolverOptions) -> Self {
        Self { backend: Box::new(backend), options, disposed: AtomicBool::new(false) }
    }

    /// An environment backed by the built-in [`SearchSolver`].
    pub fn with_search(options: SolverOptions) -> Self {
        Self::new(SearchSolver, options)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            debug!(backend = self.backend.name(), "solver environment disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_live(&self) -> ModelResult<()> {
        if self.is_disposed() {
            Err(ModelError::ResourceLifecycle("environment already disposed".into()))
        } else {
            Ok(())
        }
    }

    pub fn solve(&self, instance: &OptimizationInstance) -> ModelResult<SolveOutcome> {
        self.solve_with(instance, &SolverOptions::default())
    }

    /// Solve with per-call `overrides` layered over the environment options.
    pub fn solve_with(
        &self,
        instance: &OptimizationInstance,
        overrides: &SolverOptions,
    ) -> ModelResult<SolveOutcome> {
        self.ensure_live()?;
        let options = self.options.merged(overrides);
        let outcome = self.backend.solve(instance, &options)?;
        debug!(
            model = instance.name(),
            status = ?outcome.status,
            objective = ?outcome.objective,
            gap = ?outcome.gap,
            "solve finished"
        );
        Ok(outcome)
    }

    pub fn conflict(&self, instance: &OptimizationInstance) -> ModelResult<Conflict> {
        self.ensure_live()?;
        self.backend.conflict(instance, &self.options)
    }
}
