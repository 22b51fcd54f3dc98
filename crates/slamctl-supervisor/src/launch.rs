//! [`LaunchDispatcher`] – resolves a mapping method to its launch target and
//! spawns the backend.
//!
//! The spawned process inherits nothing from the supervisor's stdio: both
//! stdout and stderr are redirected into a per-invocation log file under the
//! configured log directory, so concurrent starts of the same method never
//! corrupt each other's diagnostics.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use slamctl_types::{MappingMethod, SlamError};
use tokio::process::{Child, Command};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SupervisorConfig;

/// A freshly spawned mapping backend, not yet judged healthy.
pub struct SpawnedProcess {
    pub child: Child,
    pub method: MappingMethod,
    pub log_file: PathBuf,
}

/// Builds the launch invocation for a [`MappingMethod`] and spawns it.
pub struct LaunchDispatcher<'a> {
    config: &'a SupervisorConfig,
}

impl<'a> LaunchDispatcher<'a> {
    pub fn new(config: &'a SupervisorConfig) -> Self {
        Self { config }
    }

    /// Spawn the backend for `method`, appending a config-file override when
    /// one is supplied.  No side effects occur before the log file is
    /// created; an unknown method is rejected by the caller before this
    /// point.
    pub fn spawn(
        &self,
        method: MappingMethod,
        config_file: Option<&Path>,
    ) -> Result<SpawnedProcess, SlamError> {
        let invocation_id = Uuid::new_v4();
        let log_file = self
            .config
            .log_dir
            .join(format!("{method}_mapping_{invocation_id}.log"));

        let mut argv = self.config.launcher.clone();
        argv.extend(method.launch_file().split('/').map(str::to_string));
        if let Some(cfg) = config_file {
            argv.push("--ros-args".to_string());
            argv.push("-p".to_string());
            argv.push(format!("config_file:={}", cfg.display()));
        }
        debug!(method = %method, argv = ?argv, "launch invocation assembled");

        let (program, args) = argv.split_first().ok_or_else(|| {
            SlamError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "launcher argv prefix is empty",
            ))
        })?;

        let log = File::create(&log_file)?;
        let log_err = log.try_clone()?;
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()?;

        info!(
            method = %method,
            pid = child.id(),
            log_file = %log_file.display(),
            "mapping backend spawned"
        );

        Ok(SpawnedProcess {
            child,
            method,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_config(dir: &Path, script: &str) -> SupervisorConfig {
        SupervisorConfig {
            launcher: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            log_dir: dir.to_path_buf(),
            ..SupervisorConfig::default()
        }
    }

    #[tokio::test]
    async fn spawn_redirects_output_to_invocation_log() {
        let dir = tempfile::tempdir().expect("tmp dir");
        // The launch descriptor segments land in $0/$1 and are ignored.
        let config = script_config(dir.path(), "echo booting mapping backend");

        let dispatcher = LaunchDispatcher::new(&config);
        let mut spawned = dispatcher
            .spawn(MappingMethod::SlamToolbox, None)
            .expect("spawn");
        spawned.child.wait().await.expect("wait");

        let contents = std::fs::read_to_string(&spawned.log_file).expect("read log");
        assert!(contents.contains("booting mapping backend"));
        let name = spawned.log_file.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("slam_toolbox_mapping_"));
    }

    #[tokio::test]
    async fn concurrent_spawns_of_same_method_use_distinct_logs() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let config = script_config(dir.path(), "true");

        let dispatcher = LaunchDispatcher::new(&config);
        let mut a = dispatcher.spawn(MappingMethod::Cartographer, None).expect("spawn a");
        let mut b = dispatcher.spawn(MappingMethod::Cartographer, None).expect("spawn b");
        a.child.wait().await.expect("wait a");
        b.child.wait().await.expect("wait b");

        assert_ne!(a.log_file, b.log_file);
    }

    #[tokio::test]
    async fn config_file_override_is_appended_to_argv() {
        let dir = tempfile::tempdir().expect("tmp dir");
        // Echo the full argv so the test can assert on it.
        let config = script_config(dir.path(), r#"echo "$@""#);

        let dispatcher = LaunchDispatcher::new(&config);
        let mut spawned = dispatcher
            .spawn(MappingMethod::Cartographer, Some(Path::new("/etc/carto.yaml")))
            .expect("spawn");
        spawned.child.wait().await.expect("wait");

        let contents = std::fs::read_to_string(&spawned.log_file).expect("read log");
        assert!(contents.contains("cartographer.launch.py"));
        assert!(contents.contains("config_file:=/etc/carto.yaml"));
    }

    #[test]
    fn empty_launcher_prefix_is_rejected() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let config = SupervisorConfig {
            launcher: vec![],
            log_dir: dir.path().to_path_buf(),
            ..SupervisorConfig::default()
        };

        let dispatcher = LaunchDispatcher::new(&config);
        assert!(dispatcher.spawn(MappingMethod::Gmapping, None).is_err());
    }
}
