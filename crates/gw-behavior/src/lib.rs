//! `gw-behavior`: the CONSUMAT decision policy.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`mode`]    | `DecisionMode`, `Thresholds`, the four-region `transition`        |
//! | [`choice`]  | `FieldDecision`: the discrete choices peers can copy              |
//! | [`board`]   | `PeerBoard`: read-only previous-year choices, keyed by `AgentId`  |
//! | [`plan`]    | `SolveRequest`, `PinSet`, `ChoiceSolver` trait                    |
//! | [`policy`]  | `ConsumatPolicy`: runs the solve pattern of each mode             |
//! | [`error`]   | `BehaviorError`, `BehaviorResult<T>`                              |
//!
//! # Design notes
//!
//! The policy never builds models itself.  It decides *which* solves to run
//! and with *whose* choices, hands each [`SolveRequest`] to a
//! [`ChoiceSolver`] supplied by the agent runtime, and compares the
//! objectives it gets back.  Peers are only ever seen through the
//! [`PeerBoard`], which is built once per year before any agent decides, so
//! every agent reads the same finalized previous-year state.

pub mod board;
pub mod choice;
pub mod error;
pub mod mode;
pub mod plan;
pub mod policy;

#[cfg(test)]
mod tests;

pub use board::{PeerBoard, PeerRecord};
pub use choice::FieldDecision;
pub use error::{BehaviorError, BehaviorResult};
pub use mode::{DecisionMode, Thresholds, transition};
pub use plan::{ChoiceSolver, PinSet, PrecipitationBasis, SolveRequest};
pub use policy::{Adopted, ConsumatPolicy, Decision, DecisionContext};
