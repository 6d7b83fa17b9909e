//! Tasks the cadence runner can drive.
//!
//! - [`CommandTask`]: launches an external process each cycle
//! - [`ScriptedTask`]: replays scripted outcomes on the tokio clock

pub mod command;
pub mod scripted;
pub mod traits;

pub use command::{CommandTask, TaskCommand};
pub use scripted::{ScriptResult, ScriptStep, ScriptedTask};
pub use traits::{Task, TaskExit};
