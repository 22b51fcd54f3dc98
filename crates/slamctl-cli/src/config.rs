//! Configuration file handling – reads/writes `~/.slamctl/config.toml`.

use serde::{Deserialize, Serialize};
use slamctl_supervisor::SupervisorConfig;
use std::fs;
use std::path::PathBuf;

/// Persisted user configuration stored in `~/.slamctl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default save directory for `slamctl save`.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Supervisor tunables (launcher/saver commands, log dir, timings).
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("./maps")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

/// Return the path to `~/.slamctl/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".slamctl").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SLAMCTL_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `SLAMCTL_SAVE_DIR` | `save_dir` |
/// | `SLAMCTL_LOG_DIR` | `supervisor.log_dir` |
/// | `SLAMCTL_LAUNCH_GRACE_MS` | `supervisor.launch_grace_ms` |
/// | `SLAMCTL_SAVE_SETTLE_MS` | `supervisor.save_settle_ms` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SLAMCTL_SAVE_DIR") {
        cfg.save_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("SLAMCTL_LOG_DIR") {
        cfg.supervisor.log_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("SLAMCTL_LAUNCH_GRACE_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.supervisor.launch_grace_ms = ms;
    }
    if let Ok(v) = std::env::var("SLAMCTL_SAVE_SETTLE_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.supervisor.save_settle_ms = ms;
    }
}

/// Save the config to disk, creating `~/.slamctl/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
