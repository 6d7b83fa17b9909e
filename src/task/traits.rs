//! Task trait - the invocation boundary of the runner.

use async_trait::async_trait;
use std::process::ExitStatus;

use crate::domain::CycleOutcome;
use crate::error::Result;

/// How a task that actually ran ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// Exit status 0
    Success,
    /// Non-zero exit code, or terminated by a signal
    Failure { code: Option<i32>, signal: Option<i32> },
}

impl TaskExit {
    /// Failure with an exit code
    pub fn code(code: i32) -> Self {
        if code == 0 {
            TaskExit::Success
        } else {
            TaskExit::Failure {
                code: Some(code),
                signal: None,
            }
        }
    }

    /// Translate a process exit status
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return TaskExit::Success;
        }
        TaskExit::Failure {
            code: status.code(),
            signal: exit_signal(&status),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskExit::Success)
    }
}

impl From<TaskExit> for CycleOutcome {
    fn from(exit: TaskExit) -> Self {
        match exit {
            TaskExit::Success => CycleOutcome::Succeeded,
            TaskExit::Failure { code, signal } => CycleOutcome::Failed { code, signal },
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Something the runner can execute once per cycle.
///
/// `Ok` means the task ran to completion, whatever its exit status.
/// `Err` means it could not be started (host-level failure).
/// Dropping the returned future must abort the task.
#[async_trait]
pub trait Task: Send + Sync {
    /// Execute the task to completion
    async fn run(&self) -> Result<TaskExit>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
