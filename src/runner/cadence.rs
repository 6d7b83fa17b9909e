//! Cadence runner - drives a task on a fixed interval until shutdown.
//!
//! Each iteration:
//! 1. Runs the task to completion (Running)
//! 2. Logs the outcome; a failing exit status never stops the loop
//! 3. Sleeps until the next cycle is due (Waiting)
//!
//! Shutdown is raced against both suspension points, so it interrupts an
//! in-flight task as well as a pending wait.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use super::schedule::Schedule;
use super::shutdown::ShutdownSignal;
use crate::config::{CadenceMode, RunnerConfig};
use crate::domain::{Cycle, CycleOutcome, RunnerState};
use crate::error::{CadenceError, Result};
use crate::task::Task;

/// Options for the CadenceRunner.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Fixed wait between cycles
    pub interval: Duration,
    /// How the interval is measured
    pub mode: CadenceMode,
    /// Stop after this many cycles; None runs until shutdown
    pub max_cycles: Option<u64>,
    /// Give up after this many launch failures in a row; None never gives up
    pub max_consecutive_launch_failures: Option<u32>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for RunnerOptions {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            interval: config.interval(),
            mode: config.mode,
            max_cycles: config.max_cycles,
            max_consecutive_launch_failures: config.launch_failure_limit(),
        }
    }
}

impl RunnerOptions {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn mode(mut self, mode: CadenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_cycles(mut self, max: u64) -> Self {
        self.max_cycles = Some(max);
        self
    }

    /// `Some(0)` is treated like `None`, as in the config file
    pub fn max_consecutive_launch_failures(mut self, max: Option<u32>) -> Self {
        self.max_consecutive_launch_failures = max.filter(|n| *n > 0);
        self
    }
}

/// Why the runner stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was requested
    Cancelled,
    /// `max_cycles` cycles finished
    CycleLimit,
}

/// Running totals for a single `run` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles_started: u64,
    pub cycles_finished: u64,
    pub successes: u64,
    pub task_failures: u64,
    pub launch_failures: u64,
}

impl CycleStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles_finished += 1;
        match outcome {
            CycleOutcome::Succeeded => self.successes += 1,
            CycleOutcome::Failed { .. } => self.task_failures += 1,
            CycleOutcome::LaunchFailed(_) => self.launch_failures += 1,
            CycleOutcome::Interrupted => {}
        }
    }
}

/// Summary returned when the runner stops.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stop_reason: StopReason,
    pub stats: CycleStats,
    pub last_cycle: Option<Cycle>,
}

/// CadenceRunner executes one task at a time on a fixed interval.
pub struct CadenceRunner<T: Task + ?Sized> {
    task: Arc<T>,
    options: RunnerOptions,
    schedule: Schedule,
    state: watch::Sender<RunnerState>,
}

impl<T: Task + ?Sized> CadenceRunner<T> {
    pub fn new(task: Arc<T>, options: RunnerOptions) -> Self {
        let schedule = Schedule::new(options.interval, options.mode);
        let (state, _) = watch::channel(RunnerState::Running);
        Self {
            task,
            options,
            schedule,
            state,
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Current state
    pub fn state(&self) -> RunnerState {
        *self.state.borrow()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: RunnerState) -> Result<()> {
        let current = self.state();
        let next = current.transition(next)?;
        debug!("runner state: {} -> {}", current, next);
        self.state.send_replace(next);
        Ok(())
    }

    fn halt(&self, why: &str, stats: &CycleStats) {
        self.state.send_replace(RunnerState::Stopped);
        info!(
            "Runner stopped ({}) after {} cycles: {} ok, {} failed, {} launch failures",
            why, stats.cycles_finished, stats.successes, stats.task_failures, stats.launch_failures
        );
    }

    fn stop(&self, reason: StopReason, stats: CycleStats, last_cycle: Option<Cycle>) -> RunReport {
        self.halt(&format!("{:?}", reason), &stats);
        RunReport {
            stop_reason: reason,
            stats,
            last_cycle,
        }
    }

    /// Run cycles until shutdown, the cycle limit, or too many launch failures.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> Result<RunReport> {
        if self.state().is_terminal() {
            return Err(CadenceError::InvalidState("runner already stopped".to_string()));
        }

        info!(
            "Starting cadence runner for '{}' every {:?} ({:?})",
            self.task.describe(),
            self.schedule.interval(),
            self.schedule.mode()
        );

        let mut stats = CycleStats::default();
        let mut last_cycle: Option<Cycle> = None;
        let mut launch_failure_streak = 0u32;
        let mut scheduled = Instant::now();

        loop {
            if shutdown.is_triggered() {
                return Ok(self.stop(StopReason::Cancelled, stats, last_cycle));
            }

            stats.cycles_started += 1;
            let mut cycle = Cycle::begin(stats.cycles_started);
            let started = Instant::now();
            info!("Cycle {} starting", cycle.seq);

            let result = tokio::select! {
                biased;
                _ = shutdown.wait() => None,
                result = self.task.run() => Some(result),
            };
            let finished = Instant::now();

            let Some(result) = result else {
                cycle.finish(CycleOutcome::Interrupted, finished - started);
                warn!("Cycle {} interrupted by shutdown", cycle.seq);
                return Ok(self.stop(StopReason::Cancelled, stats, Some(cycle)));
            };

            let outcome = match result {
                Ok(exit) => {
                    launch_failure_streak = 0;
                    CycleOutcome::from(exit)
                }
                Err(e) => {
                    launch_failure_streak += 1;
                    CycleOutcome::LaunchFailed(e.to_string())
                }
            };

            match &outcome {
                CycleOutcome::Succeeded => {
                    info!("Cycle {} {} in {:?}", cycle.seq, outcome, finished - started)
                }
                CycleOutcome::LaunchFailed(_) => error!("Cycle {} {}", cycle.seq, outcome),
                _ => warn!("Cycle {} {} in {:?}", cycle.seq, outcome, finished - started),
            }

            stats.record(&outcome);
            cycle.finish(outcome, finished - started);
            last_cycle = Some(cycle);

            if let Some(limit) = self.options.max_consecutive_launch_failures {
                if limit > 0 && launch_failure_streak >= limit {
                    error!("Giving up after {} consecutive launch failures", launch_failure_streak);
                    self.halt("LaunchFailures", &stats);
                    let last = match last_cycle.and_then(|c| c.exit_status) {
                        Some(CycleOutcome::LaunchFailed(reason)) => reason,
                        _ => String::new(),
                    };
                    return Err(CadenceError::LaunchFailuresExceeded {
                        count: launch_failure_streak,
                        last,
                    });
                }
            }

            if let Some(max) = self.options.max_cycles {
                if stats.cycles_finished >= max {
                    return Ok(self.stop(StopReason::CycleLimit, stats, last_cycle));
                }
            }

            self.set_state(RunnerState::Waiting)?;
            let next = self.schedule.next_run_at(scheduled, finished);
            debug!(
                "Next cycle in {:?}",
                next.saturating_duration_since(Instant::now())
            );

            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    return Ok(self.stop(StopReason::Cancelled, stats, last_cycle));
                }
                _ = sleep_until(next) => {}
            }

            scheduled = next;
            self.set_state(RunnerState::Running)?;
        }
    }
}
