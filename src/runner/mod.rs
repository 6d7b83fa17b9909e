//! Cadence runner - executes a task, waits a fixed interval, repeats.
//!
//! Only one cycle is active at a time. A failing task never stops the
//! loop; shutdown and repeated launch failures do.

mod cadence;
pub mod schedule;
pub mod shutdown;

pub use cadence::{CadenceRunner, CycleStats, RunReport, RunnerOptions, StopReason};
pub use schedule::Schedule;
pub use shutdown::{Shutdown, ShutdownSignal, listen_for_signals};
