//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: drive a task on a fixed cadence
//! - monitor: analyze a captured open-interest payload

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CadenceMode;

/// Cadence - run an external task on a fixed interval
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Interval measurement on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Wait the interval after each task finishes
    AfterCompletion,
    /// Start cycles on a fixed grid
    FixedRate,
}

impl From<ModeArg> for CadenceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AfterCompletion => CadenceMode::AfterCompletion,
            ModeArg::FixedRate => CadenceMode::FixedRate,
        }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a task repeatedly until interrupted
    Run {
        /// Seconds between cycles (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// How the interval is measured
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Stop after this many cycles
        #[arg(short = 'n', long)]
        max_cycles: Option<u64>,

        /// Give up after this many consecutive launch failures (0 = never)
        #[arg(long)]
        max_launch_failures: Option<u32>,

        /// Shell command line to run via `sh -c`
        #[arg(short, long, conflicts_with = "command")]
        shell: Option<String>,

        /// Program and arguments, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Analyze a captured open-interest payload and push alerts
    Monitor {
        /// Payload file, or `-` for stdin (the default without a URL)
        #[arg(short, long)]
        payload: Option<PathBuf>,

        /// Fetch the payload from this URL (overrides config)
        #[arg(short, long, conflicts_with = "payload")]
        url: Option<String>,

        /// History file (overrides config)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Relative change that triggers an alert, e.g. 0.05
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Update history but do not deliver alerts
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["cadence"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["cadence", "-v", "run", "--", "true"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["cadence", "run", "-c", "/path/to/cadence.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/cadence.yml")));
    }

    #[test]
    fn test_run_with_argv() {
        let cli = Cli::try_parse_from(["cadence", "run", "-i", "300", "--", "python3", "main.py", "--flag"]).unwrap();
        match cli.command {
            Commands::Run {
                interval,
                command,
                shell,
                mode,
                ..
            } => {
                assert_eq!(interval, Some(300));
                assert_eq!(command, vec!["python3", "main.py", "--flag"]);
                assert!(shell.is_none());
                assert!(mode.is_none());
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_run_with_shell() {
        let cli = Cli::try_parse_from(["cadence", "run", "--shell", "python3 main.py | tee out.log"]).unwrap();
        match cli.command {
            Commands::Run { shell, command, .. } => {
                assert_eq!(shell.as_deref(), Some("python3 main.py | tee out.log"));
                assert!(command.is_empty());
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_run_shell_conflicts_with_argv() {
        assert!(Cli::try_parse_from(["cadence", "run", "--shell", "true", "--", "false"]).is_err());
    }

    #[test]
    fn test_run_limits_and_mode() {
        let cli = Cli::try_parse_from([
            "cadence",
            "run",
            "--mode",
            "fixed-rate",
            "-n",
            "3",
            "--max-launch-failures",
            "0",
            "--",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                mode,
                max_cycles,
                max_launch_failures,
                ..
            } => {
                assert_eq!(mode.map(CadenceMode::from), Some(CadenceMode::FixedRate));
                assert_eq!(max_cycles, Some(3));
                assert_eq!(max_launch_failures, Some(0));
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_monitor_defaults() {
        let cli = Cli::try_parse_from(["cadence", "monitor"]).unwrap();
        match cli.command {
            Commands::Monitor {
                payload,
                url,
                history,
                threshold,
                dry_run,
            } => {
                assert!(payload.is_none());
                assert!(url.is_none());
                assert!(history.is_none());
                assert!(threshold.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected monitor command"),
        }
    }

    #[test]
    fn test_monitor_options() {
        let cli = Cli::try_parse_from([
            "cadence",
            "monitor",
            "-p",
            "capture.json",
            "--history",
            "h.json",
            "-t",
            "0.1",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Monitor {
                payload,
                history,
                threshold,
                dry_run,
                ..
            } => {
                assert_eq!(payload, Some(PathBuf::from("capture.json")));
                assert_eq!(history, Some(PathBuf::from("h.json")));
                assert_eq!(threshold, Some(0.1));
                assert!(dry_run);
            }
            _ => panic!("Expected monitor command"),
        }
    }

    #[test]
    fn test_monitor_url() {
        let cli = Cli::try_parse_from(["cadence", "monitor", "--url", "https://example.invalid/oi"]).unwrap();
        match cli.command {
            Commands::Monitor { payload, url, .. } => {
                assert!(payload.is_none());
                assert_eq!(url.as_deref(), Some("https://example.invalid/oi"));
            }
            _ => panic!("Expected monitor command"),
        }
    }

    #[test]
    fn test_monitor_url_conflicts_with_payload() {
        assert!(Cli::try_parse_from(["cadence", "monitor", "-p", "x.json", "-u", "https://example.invalid"]).is_err());
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["cadence", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
