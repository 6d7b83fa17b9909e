//! Cycle record - one execution attempt of the external task.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// How a single task execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Task exited with status 0
    Succeeded,
    /// Task exited non-zero, or was killed by a signal
    Failed { code: Option<i32>, signal: Option<i32> },
    /// Task could not be started at all
    LaunchFailed(String),
    /// Task was interrupted by shutdown before it finished
    Interrupted,
}

impl CycleOutcome {
    /// Check whether the task ran and exited cleanly
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Succeeded)
    }

    /// Check whether the task exited with a failing status
    pub fn is_task_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }

    /// Check whether the task never started
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, CycleOutcome::LaunchFailed(_))
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Succeeded => write!(f, "succeeded"),
            CycleOutcome::Failed { code: Some(code), .. } => write!(f, "failed (exit code {})", code),
            CycleOutcome::Failed { signal: Some(sig), .. } => write!(f, "failed (signal {})", sig),
            CycleOutcome::Failed { .. } => write!(f, "failed"),
            CycleOutcome::LaunchFailed(reason) => write!(f, "launch failed: {}", reason),
            CycleOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// One execution of the external task.
///
/// Created when the runner enters `Running`, finished when the task
/// completes. Cycles are not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// 1-based sequence number within a run
    pub seq: u64,
    /// Wall-clock start time
    pub started_at: DateTime<Utc>,
    /// None while the task is still running
    pub exit_status: Option<CycleOutcome>,
    /// Task execution time, None while running
    pub duration: Option<Duration>,
}

impl Cycle {
    /// Start a new cycle now
    pub fn begin(seq: u64) -> Self {
        Self {
            seq,
            started_at: Utc::now(),
            exit_status: None,
            duration: None,
        }
    }

    /// Record how the task ended
    pub fn finish(&mut self, outcome: CycleOutcome, duration: Duration) {
        self.exit_status = Some(outcome);
        self.duration = Some(duration);
    }

    /// Check if the task is still in flight
    pub fn is_active(&self) -> bool {
        self.exit_status.is_none()
    }
}
