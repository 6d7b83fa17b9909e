use chrono::Utc;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cadence::cli::Cli;
use cadence::cli::commands::Commands;
use cadence::config::Config;
use cadence::monitor::{Delivery, Monitor, fetch_payload};
use cadence::runner::{CadenceRunner, RunnerOptions, Shutdown, StopReason, listen_for_signals};
use cadence::task::{CommandTask, Task};

/// Config level first, then `RUST_LOG`, then `--verbose` on top
fn log_builder(config_filter: &str, env_filter: Option<&str>, verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(config_filter);
    if let Some(env) = env_filter {
        builder.parse_filters(env);
    }
    if verbose {
        builder.parse_filters("debug");
    }
    builder
}

fn setup_logging(config_filter: &str, verbose: bool) -> Result<PathBuf> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("cadence.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env_filter = std::env::var("RUST_LOG").ok();
    log_builder(config_filter, env_filter.as_deref(), verbose)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(log_file)
}

fn log_filter(config: &Config) -> String {
    config.log_level.clone().unwrap_or_else(|| "info".to_string())
}

async fn run_application(cli: &Cli, mut config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            interval,
            mode,
            max_cycles,
            max_launch_failures,
            shell,
            command,
        } => {
            if let Some(secs) = interval {
                config.runner.interval_secs = *secs;
            }
            if let Some(mode) = mode {
                config.runner.mode = (*mode).into();
            }
            if max_cycles.is_some() {
                config.runner.max_cycles = *max_cycles;
            }
            if let Some(limit) = max_launch_failures {
                config.runner.max_consecutive_launch_failures = *limit;
            }
            if shell.is_some() || !command.is_empty() {
                config.task.shell = shell.clone();
                config.task.command = command.clone();
            }
            handle_run_command(&config).await
        }
        Commands::Monitor {
            payload,
            url,
            history,
            threshold,
            dry_run,
        } => {
            if let Some(url) = url {
                config.monitor.payload_url = Some(url.clone());
            }
            if let Some(path) = history {
                config.monitor.history_file = path.clone();
            }
            if let Some(t) = threshold {
                config.monitor.oi_change_threshold = *t;
            }
            handle_monitor_command(&config, payload.as_deref(), *dry_run).await
        }
    }
}

async fn handle_run_command(config: &Config) -> Result<()> {
    config.validate().context("Invalid runner settings")?;
    let task = Arc::new(CommandTask::from_config(&config.task).context("No task to run")?);
    let options = RunnerOptions::from(&config.runner);

    println!(
        "{} {} every {}s (Ctrl-C to stop)",
        "Running:".green(),
        task.describe(),
        config.runner.interval_secs
    );

    let shutdown = Shutdown::new();
    let listener = listen_for_signals(shutdown.clone()).context("Failed to install signal handlers")?;

    let runner = CadenceRunner::new(task, options);
    let result = runner.run(shutdown.signal()).await;
    listener.abort();

    let report = result.context("Runner stopped")?;
    let reason = match report.stop_reason {
        StopReason::Cancelled => "interrupted".yellow(),
        StopReason::CycleLimit => "cycle limit reached".cyan(),
    };
    println!(
        "{} {} after {} cycles ({} ok, {} failed, {} launch failures)",
        "Stopped:".green(),
        reason,
        report.stats.cycles_finished,
        report.stats.successes,
        report.stats.task_failures,
        report.stats.launch_failures
    );
    Ok(())
}

fn read_payload(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read payload from stdin")?;
        Ok(raw)
    } else {
        fs::read_to_string(path).context(format!("Failed to read payload {}", path.display()))
    }
}

async fn load_payload(config: &Config, payload: Option<&Path>) -> Result<String> {
    match (payload, config.monitor.payload_url.as_deref()) {
        (Some(path), _) => read_payload(path),
        (None, Some(url)) => {
            let timeout = Duration::from_millis(config.monitor.capture_timeout_ms);
            fetch_payload(url, timeout)
                .await
                .context(format!("Failed to fetch payload from {}", url))
        }
        (None, None) => read_payload(Path::new("-")),
    }
}

async fn handle_monitor_command(config: &Config, payload: Option<&Path>, dry_run: bool) -> Result<()> {
    config.validate().context("Invalid monitor settings")?;

    if std::env::var_os("GITHUB_ACTIONS").is_none() && config.monitor.webhook().is_none() && !dry_run {
        println!(
            "{} no Feishu webhook configured; set monitor.feishu_webhook or FEISHU_WEBHOOK",
            "Warning:".yellow()
        );
    }

    let raw = load_payload(config, payload).await?;
    let monitor = Monitor::new(config.monitor.clone()).dry_run(dry_run);
    let analysis = monitor.analyze(&raw, Utc::now()).await.context("Analysis failed")?;

    let delivery = match &analysis.delivery {
        Delivery::NoAlerts => "no alerts".normal(),
        Delivery::Sent => "sent".green(),
        Delivery::Printed => "printed".yellow(),
        Delivery::DryRun => "dry run".cyan(),
        Delivery::Failed(reason) => format!("delivery failed: {}", reason).red(),
    };
    println!(
        "{} {} symbols tracked, {} alerts, {}",
        "Monitor:".green(),
        analysis.tracked,
        analysis.alerts.len(),
        delivery
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the level is known
    setup_logging(&log_filter(&config), cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
