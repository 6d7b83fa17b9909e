//! Process-backed task: launches an external program or shell command.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::traits::{Task, TaskExit};
use crate::config::TaskConfig;
use crate::error::{CadenceError, Result};

/// What to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// Program plus arguments, no shell involved
    Argv { program: String, args: Vec<String> },
    /// A command line handed to `sh -c`
    Shell(String),
}

/// Task that spawns a child process each cycle.
///
/// Stdout and stderr are inherited so the task's own output reaches the
/// operator's terminal. The child is killed if the run future is dropped.
#[derive(Debug, Clone)]
pub struct CommandTask {
    command: TaskCommand,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandTask {
    /// Launch `program` with `args`
    pub fn argv(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: TaskCommand::Argv {
                program: program.into(),
                args,
            },
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// Launch `command` through `sh -c`
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: TaskCommand::Shell(command.into()),
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// Build a task from the `task` config section
    pub fn from_config(config: &TaskConfig) -> Result<Self> {
        let mut task = match (&config.shell, config.command.split_first()) {
            (Some(shell), _) if !shell.trim().is_empty() => Self::shell(shell.clone()),
            (_, Some((program, args))) => Self::argv(program.clone(), args.to_vec()),
            _ => {
                return Err(CadenceError::InvalidConfig(
                    "no task configured: set task.command or task.shell".to_string(),
                ));
            }
        };
        if let Some(dir) = &config.working_dir {
            task = task.working_dir(dir.clone());
        }
        for (key, value) in &config.env {
            task = task.env(key.clone(), value.clone());
        }
        Ok(task)
    }

    /// Run the task from this directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn command(&self) -> &TaskCommand {
        &self.command
    }

    fn program(&self) -> &str {
        match &self.command {
            TaskCommand::Argv { program, .. } => program,
            TaskCommand::Shell(_) => "sh",
        }
    }

    fn build(&self) -> Command {
        let mut cmd = match &self.command {
            TaskCommand::Argv { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            TaskCommand::Shell(line) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(line);
                cmd
            }
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Task for CommandTask {
    async fn run(&self) -> Result<TaskExit> {
        let mut child = self.build().spawn().map_err(|source| CadenceError::Launch {
            program: self.program().to_string(),
            source,
        })?;

        let status = child.wait().await?;
        Ok(TaskExit::from_status(status))
    }

    fn describe(&self) -> String {
        match &self.command {
            TaskCommand::Argv { program, args } if args.is_empty() => program.clone(),
            TaskCommand::Argv { program, args } => format!("{} {}", program, args.join(" ")),
            TaskCommand::Shell(line) => format!("sh -c '{}'", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_shell_success() {
        let task = CommandTask::shell("exit 0");
        assert_eq!(task.run().await.unwrap(), TaskExit::Success);
    }

    #[tokio::test]
    async fn test_shell_failure_code() {
        let task = CommandTask::shell("exit 3");
        assert_eq!(task.run().await.unwrap(), TaskExit::code(3));
    }

    #[tokio::test]
    async fn test_argv_runs_without_shell() {
        let task = CommandTask::argv("sh", vec!["-c".to_string(), "exit 5".to_string()]);
        assert_eq!(task.run().await.unwrap(), TaskExit::code(5));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let task = CommandTask::argv("definitely-not-a-real-binary-xyz", vec![]);
        let err = task.run().await.unwrap_err();
        assert!(matches!(err, CadenceError::Launch { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-binary-xyz"));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "found").unwrap();

        let task = CommandTask::shell("test -f marker.txt").working_dir(dir.path());
        assert!(task.run().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_env_is_passed() {
        let task = CommandTask::shell("test \"$CADENCE_TEST_VAR\" = hello").env("CADENCE_TEST_VAR", "hello");
        assert!(task.run().await.unwrap().is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_killed_by_signal() {
        let task = CommandTask::shell("kill -9 $$");
        match task.run().await.unwrap() {
            TaskExit::Failure { code, signal } => {
                assert_eq!(code, None);
                assert_eq!(signal, Some(9));
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(CommandTask::argv("python3", vec!["main.py".into()]).describe(), "python3 main.py");
        assert_eq!(CommandTask::argv("true", vec![]).describe(), "true");
        assert_eq!(CommandTask::shell("echo hi").describe(), "sh -c 'echo hi'");
    }

    #[test]
    fn test_from_config_prefers_shell() {
        let config = TaskConfig {
            command: vec!["python3".into(), "main.py".into()],
            shell: Some("echo from shell".into()),
            working_dir: None,
            env: BTreeMap::new(),
        };
        let task = CommandTask::from_config(&config).unwrap();
        assert_eq!(task.command(), &TaskCommand::Shell("echo from shell".into()));
    }

    #[test]
    fn test_from_config_argv() {
        let mut env = BTreeMap::new();
        env.insert("FOO".to_string(), "bar".to_string());
        let config = TaskConfig {
            command: vec!["python3".into(), "main.py".into()],
            shell: None,
            working_dir: Some(PathBuf::from("/tmp")),
            env,
        };
        let task = CommandTask::from_config(&config).unwrap();
        assert_eq!(
            task.command(),
            &TaskCommand::Argv {
                program: "python3".into(),
                args: vec!["main.py".into()]
            }
        );
        assert_eq!(task.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(task.env, vec![("FOO".to_string(), "bar".to_string())]);
    }

    #[test]
    fn test_from_config_empty_is_error() {
        let err = CommandTask::from_config(&TaskConfig::default()).unwrap_err();
        assert!(matches!(err, CadenceError::InvalidConfig(_)));
    }
}
