//! `gw-sim`: yearly driver for groundwater farmers.
//!
//! # Year loop
//!
//! ```text
//! build:        bootstrap every farmer in the start year (observed rain,
//!               initial choices pinned)
//! for year in start+1 .. end:
//!   ① Board     - snapshot of every farmer's last realized choices
//!   ② Farmers   - decide / realize / settle per farmer
//!                 (parallel with the `parallel` feature)
//!   ③ Report    - records and failures to the observer, ascending AgentId
//!   ④ Aquifers  - one step each with the summed withdrawals
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the farmer phase on Rayon's thread pool.          |

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, YearSummary};
