//! `gw-agent`: the farmer runtime.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`profile`]    | `FarmerProfile`: assets, initial choices, network, parameters |
//! | [`collab`]     | `Field`, `Well`, `Finance`, `Aquifer` traits, `AquiferRegistry` |
//! | [`perception`] | truncated-normal perceived risk, forecast blending            |
//! | [`needs`]      | `NeedsTable`: realized need per metric                        |
//! | [`state`]      | `AgentState`, `FarmerSnapshot`                                |
//! | [`farmer`]     | `FarmerBuilder`, `Farmer`, per-year `AgentYear` records       |
//! | [`error`]      | `AgentError`, `AgentResult<T>`                                |
//!
//! Model construction for the policy's solves happens in a private
//! `runner` module: it turns each `SolveRequest` into fields, wells and
//! water rights for one `ModelBuilder` call.

pub mod collab;
pub mod error;
pub mod farmer;
pub mod needs;
pub mod perception;
pub mod profile;
mod runner;
pub mod state;


pub use collab::{
    Aquifer, AquiferRegistry, Field, FieldInput, FieldOutcome, Finance, Well, WellInput,
    WellOutcome, WellState,
};
pub use error::{AgentError, AgentResult};
pub use farmer::{AgentYear, Farmer, FarmerBuilder, Realization, WellWithdrawal};
pub use needs::{NeedRow, NeedsTable};
pub use perception::TruncatedNormal;
pub use profile::{DecisionParams, FarmerProfile, FieldProfile, WellProfile};
pub use state::{AgentState, FarmerSnapshot};
