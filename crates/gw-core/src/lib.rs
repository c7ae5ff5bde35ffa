//! `gw-core`: foundational types for the groundwater farmer simulation.
//!
//! This crate is a dependency of every other `gw-*` crate.  It has no `gw-*`
//! dependencies and few external ones (`rand`, `thiserror`, `serde`, `toml`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`ids`]      | `AgentId`                                                |
//! | [`time`]     | `Year`, `SimClock`, `SimConfig`                          |
//! | [`rng`]      | `AgentRng` (per-agent, per-year seeding)                  |
//! | [`metric`]   | `Metric` enum and the per-metric weight table            |
//! | [`config`]   | `ModelConfig` and its sections, TOML loading/validation  |
//! | [`error`]    | `CoreError`, `CoreResult`                                |

pub mod config;
pub mod error;
pub mod ids;
pub mod metric;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    ConsumatConfig, CropParams, FieldConfig, FinanceConfig, ModelConfig, OptionValue,
    SolverOptions, TechParams, WellConstants,
};
pub use error::{CoreError, CoreResult};
pub use ids::AgentId;
pub use metric::{Metric, MetricTable, MetricWeights, saturating_need};
pub use rng::AgentRng;
pub use time::{SimClock, SimConfig, Year};
