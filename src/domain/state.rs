//! Runner state machine.
//!
//! ```text
//!   Running --(task done, any status)--> Waiting
//!   Waiting --(interval elapsed)-------> Running
//!   Running | Waiting --(shutdown)-----> Stopped
//! ```

use std::fmt;

use crate::error::{CadenceError, Result};

/// State of the cadence runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// The external task is executing
    Running,
    /// Sleeping until the next cycle is due
    Waiting,
    /// Terminal state
    Stopped,
}

impl RunnerState {
    /// Check if the runner has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerState::Stopped)
    }

    /// Check whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: RunnerState) -> bool {
        matches!(
            (self, next),
            (RunnerState::Running, RunnerState::Waiting)
                | (RunnerState::Waiting, RunnerState::Running)
                | (RunnerState::Running, RunnerState::Stopped)
                | (RunnerState::Waiting, RunnerState::Stopped)
        )
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(self, next: RunnerState) -> Result<RunnerState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CadenceError::InvalidState(format!("{} -> {}", self, next)))
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunnerState::Running => "Running",
            RunnerState::Waiting => "Waiting",
            RunnerState::Stopped => "Stopped",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(RunnerState::Running.can_transition_to(RunnerState::Waiting));
        assert!(RunnerState::Waiting.can_transition_to(RunnerState::Running));
        assert!(RunnerState::Running.can_transition_to(RunnerState::Stopped));
        assert!(RunnerState::Waiting.can_transition_to(RunnerState::Stopped));
    }

    #[test]
    fn test_stopped_is_terminal() {
        assert!(RunnerState::Stopped.is_terminal());
        assert!(!RunnerState::Stopped.can_transition_to(RunnerState::Running));
        assert!(!RunnerState::Stopped.can_transition_to(RunnerState::Waiting));
        assert!(!RunnerState::Running.is_terminal());
    }

    #[test]
    fn test_self_transitions_rejected() {
        assert!(!RunnerState::Running.can_transition_to(RunnerState::Running));
        assert!(!RunnerState::Waiting.can_transition_to(RunnerState::Waiting));
    }

    #[test]
    fn test_transition_error() {
        let err = RunnerState::Stopped.transition(RunnerState::Running).unwrap_err();
        assert_eq!(err.to_string(), "Invalid state: Stopped -> Running");
        assert_eq!(
            RunnerState::Running.transition(RunnerState::Waiting).unwrap(),
            RunnerState::Waiting
        );
    }
}
