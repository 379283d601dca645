mod app;
mod config;
mod controller;
mod error;
mod gpu;
mod input;
mod logging;
mod process;
mod report;
mod signal;
mod summary;
mod terminal;
mod tui;
mod ui;
mod watch;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing::debug;

use config::{Config, DEFAULT_REFRESH_MS, DEFAULT_ROWS};
use error::MonitorError;

/// Terminal system resource monitor.
#[derive(Debug, Parser)]
#[command(name = "resmon", version)]
#[command(group(
    ArgGroup::new("mode").args(["full", "top", "cpu", "ram", "gpu", "disk", "all", "pid"])
))]
struct Cli {
    /// Interactive process table (navigate, sort, kill)
    #[arg(short, long)]
    full: bool,

    /// Top N processes by CPU usage
    #[arg(
        short,
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "10"
    )]
    top: Option<usize>,

    /// CPU details and the heaviest processes
    #[arg(short, long)]
    cpu: bool,

    /// Memory and swap details
    #[arg(short, long)]
    ram: bool,

    /// Graphics adapter details
    #[arg(short, long)]
    gpu: bool,

    /// Storage devices
    #[arg(short, long)]
    disk: bool,

    /// Everything at once
    #[arg(short, long)]
    all: bool,

    /// Follow one process until it exits
    #[arg(short, long, value_name = "PID")]
    pid: Option<u32>,

    /// Refresh interval of the interactive table and the --pid monitor, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_REFRESH_MS)]
    interval: u64,

    /// Maximum visible rows of the interactive table
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::default()
        .with_refresh_ms(cli.interval)
        .with_rows(cli.rows)
        .with_logging(cli.log_level.clone(), cli.log_file.clone());
    logging::init(&config, cli.full)?;
    debug!(?cli, "starting");

    if cli.full {
        return run_interactive(&config);
    }

    if let Some(pid) = cli.pid {
        return Ok(run_watch(pid, &config));
    }

    if let Some(n) = cli.top {
        report::print_top_processes(n);
    } else if cli.cpu {
        report::print_cpu();
    } else if cli.ram {
        report::print_memory();
    } else if cli.gpu {
        report::print_gpu();
    } else if cli.disk {
        report::print_storage();
    } else if cli.all {
        report::print_overview();
    } else {
        report::print_default_view();
    }
    Ok(ExitCode::SUCCESS)
}

fn run_interactive(config: &Config) -> anyhow::Result<ExitCode> {
    if !io::stdin().is_terminal() {
        report::print_tty_required(None);
        return Ok(ExitCode::FAILURE);
    }
    match tui::run(config) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(MonitorError::TerminalUnavailable(reason)) => {
            report::print_tty_required(Some(&reason));
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn run_watch(pid: u32, config: &Config) -> ExitCode {
    for line in watch::watch_banner(pid, config.refresh_interval) {
        println!("{line}");
    }
    println!();
    let mut source = process::SysinfoSource::new();
    match watch::watch_process(&mut source, pid, config.refresh_interval, &mut io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn top_defaults_to_ten_when_bare() {
        let cli = Cli::try_parse_from(["resmon", "-t"]).unwrap();
        assert_eq!(cli.top, Some(report::DEFAULT_TOP));

        let cli = Cli::try_parse_from(["resmon", "--top", "3"]).unwrap();
        assert_eq!(cli.top, Some(3));

        let cli = Cli::try_parse_from(["resmon"]).unwrap();
        assert_eq!(cli.top, None);
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["resmon", "-c", "-r"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "--full", "--all"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "-f", "--rows", "5"]).is_ok());
    }

    #[test]
    fn pid_mode_takes_a_value_and_excludes_other_modes() {
        let cli = Cli::try_parse_from(["resmon", "-p", "42", "--interval", "1000"]).unwrap();
        assert_eq!(cli.pid, Some(42));
        assert_eq!(cli.interval, 1000);

        assert!(Cli::try_parse_from(["resmon", "-p"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "-p", "42", "-f"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "--pid", "abc"]).is_err());
    }

    #[test]
    fn session_flags_have_defaults() {
        let cli = Cli::try_parse_from(["resmon", "-f"]).unwrap();
        assert_eq!(cli.interval, DEFAULT_REFRESH_MS);
        assert_eq!(cli.rows, DEFAULT_ROWS);
        assert_eq!(cli.log_level, "warn");
        assert!(cli.log_file.is_none());
    }
}
