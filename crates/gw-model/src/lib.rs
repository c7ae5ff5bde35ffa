//! `gw-model`: the annual irrigation decision model.
//!
//! One call of [`ModelBuilder`] produces one [`OptimizationInstance`]: an
//! agent's choice of irrigation depth, crop, rain-fed flag, technology and
//! well allocation over a multi-year planning horizon, subject to
//! crop-water-yield physics, well hydraulics, financial balance and legal
//! water-right caps.  The instance is solved through a [`SolverEnv`].
//!
//! # Crate layout
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`inputs`]      | `FieldSpec`, `WellSpec`, `WaterRightSpec` and friends  |
//! | [`builder`]     | `ModelSetup`, `ModelBuilder`                           |
//! | [`instance`]    | `OptimizationInstance`                                 |
//! | [`water_right`] | window planning and year-to-year carry-over            |
//! | [`eval`]        | `Assignment`, `evaluate`, `violated`                   |
//! | [`solution`]    | typed `Solution` sections, `SolveStatus`               |
//! | [`solver`]      | `Solver` trait, `SolveOutcome`, `SolverEnv`            |
//! | [`search`]      | `SearchSolver`, the built-in backend                   |
//! | [`grid`]        | `Grid<T>` 3-D array                                    |
//! | [`error`]       | `ModelError`, `ConstraintRef`, `Conflict`              |
//!
//! # Units
//!
//! Depths are in cm, areas in ha, volumes in m-ha, lifts in m, energy in PJ.

pub mod builder;
pub mod error;
pub mod eval;
pub mod grid;
pub mod inputs;
pub mod instance;
pub mod search;
pub mod solution;
pub mod solver;
pub mod water_right;


pub use builder::{ModelBuilder, ModelSetup};
pub use error::{Conflict, ConstraintRef, ModelError, ModelResult};
pub use eval::{Assignment, Evaluation, FieldChoice, evaluate, violated};
pub use grid::Grid;
pub use inputs::{
    CarryOver, FieldSpec, FieldSubset, Precipitation, TailPolicy, WaterRightSpec, WellSpec,
};
pub use instance::OptimizationInstance;
pub use search::SearchSolver;
pub use solution::{
    AggregateSolution, FieldSolution, Solution, SolveStatus, WaterRightUsage, WellSolution,
};
pub use solver::{SolveOutcome, Solver, SolverEnv};
pub use water_right::{Window, plan_windows};
