//! Scripted task for tests.
//!
//! Replays a fixed sequence of steps, each taking a simulated duration on
//! the tokio clock. Once the script is exhausted the last step repeats.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::traits::{Task, TaskExit};
use crate::error::{CadenceError, Result};

/// One scripted execution
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub duration: Duration,
    pub result: ScriptResult,
}

#[derive(Debug, Clone)]
pub enum ScriptResult {
    Exit(TaskExit),
    LaunchError(String),
}

impl ScriptStep {
    pub fn succeed(duration: Duration) -> Self {
        Self {
            duration,
            result: ScriptResult::Exit(TaskExit::Success),
        }
    }

    pub fn fail(duration: Duration, code: i32) -> Self {
        Self {
            duration,
            result: ScriptResult::Exit(TaskExit::code(code)),
        }
    }

    pub fn launch_error(reason: impl Into<String>) -> Self {
        Self {
            duration: Duration::ZERO,
            result: ScriptResult::LaunchError(reason.into()),
        }
    }
}

/// Task that replays scripted steps and records when each run started and ended.
pub struct ScriptedTask {
    steps: Vec<ScriptStep>,
    starts: Mutex<Vec<Instant>>,
    ends: Mutex<Vec<Instant>>,
}

impl ScriptedTask {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            starts: Mutex::new(Vec::new()),
            ends: Mutex::new(Vec::new()),
        }
    }

    /// Always succeed after `duration`
    pub fn always_succeed(duration: Duration) -> Self {
        Self::new(vec![ScriptStep::succeed(duration)])
    }

    /// Start instants of every run so far
    pub fn starts(&self) -> Vec<Instant> {
        self.starts.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// End instants of every run that completed
    pub fn ends(&self) -> Vec<Instant> {
        self.ends.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn run_count(&self) -> usize {
        self.starts().len()
    }

    fn record(list: &Mutex<Vec<Instant>>) -> Result<usize> {
        let mut list = list
            .lock()
            .map_err(|e| CadenceError::InvalidState(format!("scripted task lock poisoned: {}", e)))?;
        list.push(Instant::now());
        Ok(list.len())
    }
}

#[async_trait]
impl Task for ScriptedTask {
    async fn run(&self) -> Result<TaskExit> {
        let index = Self::record(&self.starts)? - 1;
        let step = self
            .steps
            .get(index)
            .or_else(|| self.steps.last())
            .cloned()
            .ok_or_else(|| CadenceError::InvalidState("scripted task has no steps".to_string()))?;

        match step.result {
            ScriptResult::LaunchError(reason) => Err(CadenceError::Launch {
                program: "scripted".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, reason),
            }),
            ScriptResult::Exit(exit) => {
                tokio::time::sleep(step.duration).await;
                Self::record(&self.ends)?;
                Ok(exit)
            }
        }
    }

    fn describe(&self) -> String {
        format!("scripted task ({} steps)", self.steps.len())
    }
}
