//! [`StartupVerifier`] – judges whether a spawned backend actually came up.
//!
//! A backend gets a bounded grace window.  During the window the verifier
//! polls the child's exit status; a backend that dies inside the window is a
//! launch failure and the tail of its log is attached as the diagnostic
//! excerpt.  A backend that survives the window is then checked for
//! descendant processes: the launch tooling always forks workers, so zero
//! descendants means the launch silently failed.
//!
//! The outcome is terminal after one evaluation; there is no retry.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use slamctl_types::SlamError;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::CancelFlag;
use crate::config::SupervisorConfig;
use crate::process_scan;

/// Number of trailing log characters attached to a launch-failure excerpt.
pub const LOG_EXCERPT_CHARS: usize = 500;

/// Polls a spawned backend through its grace window and classifies the
/// outcome.
pub struct StartupVerifier<'a> {
    config: &'a SupervisorConfig,
}

impl<'a> StartupVerifier<'a> {
    pub fn new(config: &'a SupervisorConfig) -> Self {
        Self { config }
    }

    /// Watch `child` until the grace window elapses.
    ///
    /// Returns `Ok(())` when the backend is alive with at least one
    /// descendant, [`SlamError::LaunchFailure`] when it exited during the
    /// window, [`SlamError::HealthCheckFailure`] when it is alive but
    /// childless, and [`SlamError::Cancelled`] when `cancel` is raised
    /// before the evaluation completes.
    pub async fn verify(
        &self,
        child: &mut Child,
        log_file: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), SlamError> {
        let deadline = Instant::now() + self.config.launch_grace();

        loop {
            if cancel.load(Ordering::SeqCst) {
                warn!(log_file = %log_file.display(), "startup verification cancelled");
                return Err(SlamError::Cancelled);
            }

            if let Some(status) = child.try_wait()? {
                let excerpt = log_excerpt(log_file, LOG_EXCERPT_CHARS);
                warn!(%status, "backend exited during grace window");
                return Err(SlamError::LaunchFailure { excerpt });
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let step = self.config.poll_interval().min(deadline - now);
            tokio::time::sleep(step).await;
        }

        // Grace window survived; judge by the process tree.
        let Some(pid) = child.id() else {
            // try_wait said "running" but the handle has no pid; treat as
            // the childless case rather than panic.
            return Err(SlamError::HealthCheckFailure);
        };
        let descendants = process_scan::descendant_count(pid);
        debug!(pid, descendants, "grace window elapsed");
        if descendants == 0 {
            return Err(SlamError::HealthCheckFailure);
        }
        Ok(())
    }
}

/// Last `max_chars` characters of the log at `path`, or an empty string when
/// the log cannot be read.
fn log_excerpt(path: &Path, max_chars: usize) -> String {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    tail_chars(&contents, max_chars)
}

fn tail_chars(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    let skip = char_count.saturating_sub(max_chars);
    s.chars().skip(skip).collect()
}
