//! [`SupervisorConfig`] – tunables for the mapping supervisor.
//!
//! Every field has a serde default, so a partial TOML table (or an empty
//! one) deserializes into a working configuration.  Tests substitute the
//! external commands with small shell scripts through [`launcher`] and
//! [`map_saver`].
//!
//! [`launcher`]: SupervisorConfig::launcher
//! [`map_saver`]: SupervisorConfig::map_saver

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for launch dispatch, startup verification, and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Argv prefix used to launch a mapping backend.  The launch descriptor
    /// segments are appended to this.
    #[serde(default = "default_launcher")]
    pub launcher: Vec<String>,

    /// Argv prefix of the map-saver command.  The map base path is appended
    /// as the final argument.
    #[serde(default = "default_map_saver")]
    pub map_saver: Vec<String>,

    /// Directory receiving launch and save logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// How long a freshly spawned backend is given before its health is
    /// judged, in milliseconds.
    #[serde(default = "default_launch_grace_ms")]
    pub launch_grace_ms: u64,

    /// How long to wait for the saver's output files to appear on disk, in
    /// milliseconds.
    #[serde(default = "default_save_settle_ms")]
    pub save_settle_ms: u64,

    /// Interval between exit-status / artifact polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_launcher() -> Vec<String> {
    vec!["ros2".to_string(), "launch".to_string()]
}

fn default_map_saver() -> Vec<String> {
    ["ros2", "run", "nav2_map_server", "map_saver_cli", "-f"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_launch_grace_ms() -> u64 {
    3000
}

fn default_save_settle_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            launcher: default_launcher(),
            map_saver: default_map_saver(),
            log_dir: default_log_dir(),
            launch_grace_ms: default_launch_grace_ms(),
            save_settle_ms: default_save_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SupervisorConfig {
    pub fn launch_grace(&self) -> Duration {
        Duration::from_millis(self.launch_grace_ms)
    }

    pub fn save_settle(&self) -> Duration {
        Duration::from_millis(self.save_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_commands() {
        let cfg = SupervisorConfig::default();
        assert_eq!(cfg.launcher, vec!["ros2", "launch"]);
        assert_eq!(cfg.map_saver[0], "ros2");
        assert_eq!(*cfg.map_saver.last().unwrap(), "-f");
        assert_eq!(cfg.log_dir, PathBuf::from("/tmp"));
        assert_eq!(cfg.launch_grace(), Duration::from_secs(3));
        assert_eq!(cfg.save_settle(), Duration::from_secs(2));
    }

    #[test]
    fn empty_toml_table_deserializes_to_defaults() {
        let cfg: SupervisorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.launch_grace_ms, 3000);
        assert_eq!(cfg.poll_interval_ms, 250);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let cfg: SupervisorConfig =
            serde_json::from_str(r#"{"log_dir": "/var/log/slam", "launch_grace_ms": 500}"#)
                .unwrap();
        assert_eq!(cfg.log_dir, PathBuf::from("/var/log/slam"));
        assert_eq!(cfg.launch_grace_ms, 500);
        assert_eq!(cfg.save_settle_ms, 2000);
        assert_eq!(cfg.launcher, vec!["ros2", "launch"]);
    }
}
