//! Domain types for Cadence
//!
//! - Cycle: one execution of the external task and how it ended
//! - RunnerState: the Running / Waiting / Stopped state machine

pub mod cycle;
pub mod state;

pub use cycle::{Cycle, CycleOutcome};
pub use state::RunnerState;
