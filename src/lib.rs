//! Cadence - run an external task on a fixed interval
//!
//! The runner executes a task to completion, waits a fixed interval and
//! repeats until shutdown. A failing task never stops the loop. The crate
//! also ships the open-interest monitor the cadence was built to drive.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod runner;
pub mod task;

pub use error::{CadenceError, Result};
