//! `slamctl` – SLAM mapping supervisor CLI
//!
//! Operational entry point for the supervisor:
//!
//! ```text
//! slamctl start <method> [--config <file>]
//! slamctl stop
//! slamctl save <map_name> [--dir <save_dir>]
//! ```
//!
//! Configuration is read from `~/.slamctl/config.toml` (created with
//! defaults on first run) with `SLAMCTL_*` environment overrides.  Every
//! operation prints its [`OperationResult`] as JSON on stdout and exits
//! non-zero on failure.  Ctrl-C during `start` raises the cancellation flag
//! so the grace-window wait aborts at the next poll.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use colored::Colorize;
use slamctl_supervisor::{MappingSupervisor, new_cancel_flag};
use slamctl_types::OperationResult;
use tracing::warn;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start {
        method: String,
        config_file: Option<PathBuf>,
    },
    Stop,
    Save {
        map_name: String,
        save_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let command = match parse_args(&std::env::args().skip(1).collect::<Vec<_>>()) {
        Ok(cmd) => cmd,
        Err(msg) => {
            eprintln!("{}: {}", "error".red().bold(), msg);
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let cfg = match config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => eprintln!(
                    "  Wrote default config to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => warn!(error = %e, "could not persist default config"),
            }
            cfg
        }
        Err(e) => {
            eprintln!("{}: {}  (using defaults)", "config error".yellow(), e);
            config::Config::default()
        }
    };

    let supervisor = MappingSupervisor::new(cfg.supervisor.clone());

    // Ctrl-C raises the cancellation flag; the verifier aborts at its next
    // poll and the operation reports failure instead of being torn down.
    let cancel = new_cancel_flag();
    let cancel_handler = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\n{}", "Ctrl-C received - cancelling".yellow().bold());
        cancel_handler.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let result = match command {
        Command::Start {
            method,
            config_file,
        } => {
            supervisor
                .start_mapping(&method, config_file.as_deref(), &cancel)
                .await
        }
        Command::Stop => supervisor.stop_mapping().await,
        Command::Save { map_name, save_dir } => {
            let dir = save_dir.unwrap_or(cfg.save_dir);
            supervisor.save_map(&map_name, &dir).await
        }
    };

    report(&result)
}

const USAGE: &str = "\
Usage:
  slamctl start <method> [--config <file>]   start a mapping backend
  slamctl stop                               stop all mapping backends
  slamctl save <map_name> [--dir <dir>]      save the current map

Methods: gmapping, cartographer, slam_toolbox";

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut iter = args.iter();
    match iter.next().map(String::as_str) {
        Some("start") => {
            let method = iter
                .next()
                .ok_or("start requires a mapping method")?
                .clone();
            let config_file = match iter.next().map(String::as_str) {
                Some("--config") => Some(PathBuf::from(
                    iter.next().ok_or("--config requires a file path")?,
                )),
                Some(other) => return Err(format!("unexpected argument: {other}")),
                None => None,
            };
            Ok(Command::Start {
                method,
                config_file,
            })
        }
        Some("stop") => Ok(Command::Stop),
        Some("save") => {
            let map_name = iter.next().ok_or("save requires a map name")?.clone();
            let save_dir = match iter.next().map(String::as_str) {
                Some("--dir") => Some(PathBuf::from(
                    iter.next().ok_or("--dir requires a directory")?,
                )),
                Some(other) => return Err(format!("unexpected argument: {other}")),
                None => None,
            };
            Ok(Command::Save { map_name, save_dir })
        }
        Some(other) => Err(format!("unknown command: {other}")),
        None => Err("no command given".to_string()),
    }
}

/// Print the result as JSON and map `success` to the exit code.
fn report(result: &OperationResult) -> ExitCode {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{}", result.message),
    }
    if result.success {
        eprintln!("{}", "✓ ok".green().bold());
        ExitCode::SUCCESS
    } else {
        eprintln!("{} {}", "✗ failed:".red().bold(), result.message);
        ExitCode::FAILURE
    }
}

fn init_tracing() {
    // RUST_LOG controls the filter; SLAMCTL_LOG_FORMAT=json emits
    // newline-delimited JSON for log aggregators.  User-facing output goes
    // to stdout/stderr via println!/eprintln! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("SLAMCTL_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_start_with_method() {
        let cmd = parse_args(&args(&["start", "gmapping"])).unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                method: "gmapping".to_string(),
                config_file: None
            }
        );
    }

    #[test]
    fn parse_start_with_config_file() {
        let cmd = parse_args(&args(&["start", "cartographer", "--config", "/etc/c.yaml"])).unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                method: "cartographer".to_string(),
                config_file: Some(PathBuf::from("/etc/c.yaml"))
            }
        );
    }

    #[test]
    fn parse_start_without_method_fails() {
        assert!(parse_args(&args(&["start"])).is_err());
    }

    #[test]
    fn parse_stop() {
        assert_eq!(parse_args(&args(&["stop"])).unwrap(), Command::Stop);
    }

    #[test]
    fn parse_save_with_dir() {
        let cmd = parse_args(&args(&["save", "kitchen", "--dir", "/srv/maps"])).unwrap();
        assert_eq!(
            cmd,
            Command::Save {
                map_name: "kitchen".to_string(),
                save_dir: Some(PathBuf::from("/srv/maps"))
            }
        );
    }

    #[test]
    fn parse_save_defaults_dir_to_config() {
        let cmd = parse_args(&args(&["save", "kitchen"])).unwrap();
        assert_eq!(
            cmd,
            Command::Save {
                map_name: "kitchen".to_string(),
                save_dir: None
            }
        );
    }

    #[test]
    fn parse_unknown_command_fails() {
        let err = parse_args(&args(&["restart"])).unwrap_err();
        assert!(err.contains("restart"));
    }

    #[test]
    fn parse_no_command_fails() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn parse_dangling_flag_fails() {
        assert!(parse_args(&args(&["start", "gmapping", "--config"])).is_err());
        assert!(parse_args(&args(&["save", "kitchen", "--dir"])).is_err());
    }
}
