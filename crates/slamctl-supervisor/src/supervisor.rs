//! [`MappingSupervisor`] – the public face of the crate.
//!
//! Owns the configuration and the process table, and exposes the three
//! lifecycle operations.  Propagation policy: no operation raises past its
//! boundary.  Internal code uses `Result<_, SlamError>` freely; the facade
//! converts every failure, expected or not, into a populated
//! [`OperationResult`] so an orchestration layer can aggregate outcomes
//! without exception machinery.

use std::path::Path;

use chrono::Utc;
use slamctl_types::{MappingMethod, OperationResult, SlamError, TrackedProcess};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::CancelFlag;
use crate::config::SupervisorConfig;
use crate::health::StartupVerifier;
use crate::launch::LaunchDispatcher;
use crate::persist::MapPersister;
use crate::process_table::ProcessTable;
use crate::shutdown::ShutdownController;

/// Supervises the lifecycle of external SLAM mapping backends.
pub struct MappingSupervisor {
    config: SupervisorConfig,
    table: Mutex<ProcessTable>,
}

impl MappingSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            table: Mutex::new(ProcessTable::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SupervisorConfig::default())
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start the backend for `method` and verify it became healthy.
    ///
    /// An unknown method fails before any side effect: no process is
    /// spawned and no log file is created.  `cancel` aborts the grace-window
    /// wait at the next poll; the spawned pid stays in the process table so
    /// a subsequent [`stop_mapping`][Self::stop_mapping] can reach it.
    pub async fn start_mapping(
        &self,
        method: &str,
        config_file: Option<&Path>,
        cancel: &CancelFlag,
    ) -> OperationResult {
        let method: MappingMethod = match method.parse() {
            Ok(m) => m,
            Err(err) => return OperationResult::failure(err.to_string()),
        };

        let spawned = match LaunchDispatcher::new(&self.config).spawn(method, config_file) {
            Ok(s) => s,
            Err(err) => {
                warn!(%method, error = %err, "failed to spawn mapping backend");
                return OperationResult::failure(err.to_string());
            }
        };
        let mut child = spawned.child;
        let log_file = spawned.log_file;

        let verdict = StartupVerifier::new(&self.config)
            .verify(&mut child, &log_file, cancel)
            .await;

        match verdict {
            Ok(()) => {
                self.track(method, child.id(), &log_file).await;
                info!(%method, "mapping backend healthy");
                let mut result = OperationResult::ok(format!("Started mapping using {method}"))
                    .with_launch_file(method.launch_file())
                    .with_log_file(log_file.to_string_lossy());
                if let Some(cfg) = config_file {
                    result = result.with_config_file(cfg.to_string_lossy());
                }
                result
            }
            Err(SlamError::Cancelled) => {
                // Leave the backend running but remembered, so stop can
                // terminate it precisely.
                self.track(method, child.id(), &log_file).await;
                OperationResult::failure(SlamError::Cancelled.to_string())
                    .with_log_file(log_file.to_string_lossy())
            }
            Err(err) => OperationResult::failure(err.to_string())
                .with_log_file(log_file.to_string_lossy()),
        }
    }

    /// Broadcast termination to all known mapping backends.
    ///
    /// Idempotent; stopping when nothing is running is a successful no-op,
    /// indistinguishable from stopping live backends.
    pub async fn stop_mapping(&self) -> OperationResult {
        // Drain under the lock, then run the process-list sweep on a
        // blocking worker so the runtime thread is never stalled.
        let tracked = self.table.lock().await.drain();
        let sweep =
            tokio::task::spawn_blocking(move || ShutdownController::new().broadcast(tracked));
        match sweep.await {
            Ok(_report) => OperationResult::ok("Stopped all mapping nodes"),
            Err(err) => {
                warn!(error = %err, "shutdown broadcast task failed");
                OperationResult::failure(err.to_string())
            }
        }
    }

    /// Persist the current map under `save_dir` and confirm both artifact
    /// files exist.
    pub async fn save_map(&self, map_name: &str, save_dir: &Path) -> OperationResult {
        match MapPersister::new(&self.config).save(map_name, save_dir).await {
            Ok(result) => result,
            Err(err) => {
                warn!(map_name, error = %err, "map save failed unexpectedly");
                OperationResult::failure(err.to_string())
                    .with_path("")
                    .with_log_file("")
            }
        }
    }

    /// Number of backends currently remembered by the process table.
    pub async fn tracked_backends(&self) -> usize {
        self.table.lock().await.len()
    }

    async fn track(&self, method: MappingMethod, pid: Option<u32>, log_file: &Path) {
        let Some(pid) = pid else {
            warn!(%method, "backend has no pid to track");
            return;
        };
        self.table.lock().await.register(
            method,
            TrackedProcess {
                pid,
                log_file: log_file.to_path_buf(),
                started_at: Utc::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_cancel_flag;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    fn supervisor(log_dir: &Path, launcher_script: &str, saver_script: &str) -> MappingSupervisor {
        MappingSupervisor::new(SupervisorConfig {
            launcher: vec![
                "sh".to_string(),
                "-c".to_string(),
                launcher_script.to_string(),
            ],
            map_saver: vec!["sh".to_string(), "-c".to_string(), saver_script.to_string()],
            log_dir: log_dir.to_path_buf(),
            launch_grace_ms: 400,
            save_settle_ms: 400,
            poll_interval_ms: 50,
        })
    }

    fn log_files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "log"))
            .collect()
    }

    #[tokio::test]
    async fn unknown_method_fails_without_side_effects() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "true", "true");
        let cancel = new_cancel_flag();

        let result = sup.start_mapping("hector_slam", None, &cancel).await;

        assert!(!result.success);
        assert!(result.message.contains("hector_slam"));
        assert!(result.launch_file.is_none());
        assert!(log_files_in(dir.path()).is_empty(), "no log may be created");
        assert_eq!(sup.tracked_backends().await, 0);
    }

    #[tokio::test]
    async fn early_exit_start_reports_log_excerpt() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "echo lidar driver not found; exit 1", "true");
        let cancel = new_cancel_flag();

        let result = sup.start_mapping("cartographer", None, &cancel).await;

        assert!(!result.success);
        assert!(result.message.contains("lidar driver not found"));
        assert!(result.launch_file.is_none());
        assert!(result.log_file.is_some());
        assert_eq!(sup.tracked_backends().await, 0);
    }

    #[tokio::test]
    async fn healthy_start_then_stop_kills_the_tracked_backend() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "sleep 5; true", "true");
        let cancel = new_cancel_flag();

        let result = sup
            .start_mapping("cartographer", Some(Path::new("/etc/carto.yaml")), &cancel)
            .await;

        assert!(result.success, "start failed: {}", result.message);
        assert_eq!(
            result.launch_file.as_deref(),
            Some("wheeltec_cartographer/cartographer.launch.py")
        );
        assert_eq!(result.config_file.as_deref(), Some("/etc/carto.yaml"));
        assert_eq!(sup.tracked_backends().await, 1);

        let stop = sup.stop_mapping().await;
        assert!(stop.success);
        assert_eq!(sup.tracked_backends().await, 0);
    }

    #[tokio::test]
    async fn start_without_config_file_omits_config_echo() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "sleep 5; true", "true");
        let cancel = new_cancel_flag();

        let result = sup.start_mapping("slam_toolbox", None, &cancel).await;
        assert!(result.success, "start failed: {}", result.message);
        assert!(result.config_file.is_none());

        sup.stop_mapping().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "true", "true");

        let first = sup.stop_mapping().await;
        let second = sup.stop_mapping().await;
        assert!(first.success);
        assert!(second.success);
        assert_eq!(first.message, second.message);
    }

    #[tokio::test]
    async fn cancelled_start_is_tracked_for_later_stop() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "sleep 5; true", "true");
        let cancel = new_cancel_flag();
        cancel.store(true, Ordering::SeqCst);

        let result = sup.start_mapping("cartographer", None, &cancel).await;
        assert!(!result.success);
        assert!(result.message.to_lowercase().contains("cancelled"));
        assert_eq!(sup.tracked_backends().await, 1);

        let stop = sup.stop_mapping().await;
        assert!(stop.success);
        assert_eq!(sup.tracked_backends().await, 0);
    }

    #[tokio::test]
    async fn save_map_delegates_to_persister() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sup = supervisor(dir.path(), "true", r#"touch "$0.yaml" "$0.pgm""#);

        let save_dir = dir.path().join("maps");
        let result = sup.save_map("kitchen", &save_dir).await;

        assert!(result.success, "save failed: {}", result.message);
        assert_eq!(
            result.path.as_deref(),
            Some(save_dir.join("kitchen.yaml").to_str().unwrap())
        );
    }
}
