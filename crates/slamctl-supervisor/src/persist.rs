//! [`MapPersister`] – runs the external map saver and validates its output.
//!
//! A saved map is two sibling files sharing a base name: the `.yaml`
//! descriptor and the `.pgm` raster.  The saver command is run to completion
//! with combined stdout/stderr captured in a log file, then the persister
//! polls for both artifacts until they appear or the settle window closes.
//!
//! The save log is keyed by map name only: two concurrent saves of the same
//! name share (and corrupt) one log file.  Known limitation, kept as-is.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use slamctl_types::{OperationResult, SlamError};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::SupervisorConfig;

/// Number of trailing log lines attached to a save-command failure.
pub const LOG_TAIL_LINES: usize = 10;

/// Invokes the configured saver command and confirms the artifact pair.
pub struct MapPersister<'a> {
    config: &'a SupervisorConfig,
}

impl<'a> MapPersister<'a> {
    pub fn new(config: &'a SupervisorConfig) -> Self {
        Self { config }
    }

    /// Save the current map as `<save_dir>/<map_name>.{yaml,pgm}`.
    ///
    /// The save directory is created if absent.  Every returned result
    /// carries `log_file` so callers can inspect diagnostics regardless of
    /// outcome; failures carry an empty `path`.
    pub async fn save(&self, map_name: &str, save_dir: &Path) -> Result<OperationResult, SlamError> {
        tokio::fs::create_dir_all(save_dir).await?;

        let map_path = save_dir.join(map_name);
        let log_file = self.config.log_dir.join(format!("save_map_{map_name}.log"));

        let status = self.run_saver(&map_path, &log_file).await?;
        if !status.success() {
            let log_tail = log_tail(&log_file, LOG_TAIL_LINES);
            warn!(%status, log_file = %log_file.display(), "map saver command failed");
            return Ok(OperationResult::failure(
                SlamError::SaveCommandFailure { log_tail }.to_string(),
            )
            .with_path("")
            .with_log_file(log_file.to_string_lossy()));
        }

        // Append rather than with_extension: map names may contain dots.
        let yaml_path = save_dir.join(format!("{map_name}.yaml"));
        let pgm_path = save_dir.join(format!("{map_name}.pgm"));
        if !self.await_artifacts(&yaml_path, &pgm_path).await {
            warn!(
                yaml = %yaml_path.display(),
                pgm = %pgm_path.display(),
                "saver exited cleanly but artifacts never appeared"
            );
            return Ok(OperationResult::failure(SlamError::MissingArtifacts.to_string())
                .with_path("")
                .with_log_file(log_file.to_string_lossy()));
        }

        info!(path = %yaml_path.display(), "map saved");
        Ok(
            OperationResult::ok(format!("Map saved successfully: {}", yaml_path.display()))
                .with_path(yaml_path.to_string_lossy())
                .with_log_file(log_file.to_string_lossy()),
        )
    }

    async fn run_saver(
        &self,
        map_path: &Path,
        log_file: &Path,
    ) -> Result<std::process::ExitStatus, SlamError> {
        let mut argv = self.config.map_saver.clone();
        argv.push(map_path.to_string_lossy().into_owned());
        let (program, args) = argv.split_first().ok_or_else(|| {
            SlamError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "map saver argv prefix is empty",
            ))
        })?;

        let log = File::create(log_file)?;
        let log_err = log.try_clone()?;
        let status = Command::new(program)
            .args(args)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .status()
            .await?;
        Ok(status)
    }

    /// Poll for both artifact files until they exist or the settle window
    /// closes.  Returns whether both were seen.
    async fn await_artifacts(&self, yaml_path: &Path, pgm_path: &Path) -> bool {
        let deadline = Instant::now() + self.config.save_settle();
        loop {
            if artifact_exists(yaml_path).await && artifact_exists(pgm_path).await {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let step = self.config.poll_interval().min(deadline - now);
            tokio::time::sleep(step).await;
        }
    }
}

/// Unreadable counts as absent; the settle window handles the retry.
async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Last `max_lines` lines of the log at `path`, or an empty string when the
/// log cannot be read.
fn log_tail(path: &Path, max_lines: usize) -> String {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = contents.lines().collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines[skip..].join("\n")
}
