//! [`ShutdownController`] – best-effort termination of mapping backends.
//!
//! Two passes.  First every pid the caller drained from the process table
//! is signalled directly.  Then the fixed name-pattern list is broadcast
//! against the live process list, catching backends that were started
//! outside this supervisor (or that failed verification and were never
//! tracked).  Individual misses are ignored; the operation is idempotent
//! and killing nothing is still success.
//!
//! The broadcast scans the process table synchronously; callers on an
//! async runtime run it on a blocking worker, after releasing any locks.
//!
//! No confirmation of actual termination is performed: "stopped something"
//! and "nothing was running" are deliberately indistinguishable to callers.

use slamctl_types::{MappingMethod, TrackedProcess};
use tracing::{debug, info};

use crate::process_scan;

/// Outcome of a shutdown broadcast, for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tracked pids a signal was delivered to.
    pub targeted: usize,
    /// Pattern-matched processes a signal was delivered to.
    pub swept: usize,
}

/// Broadcasts termination to every known mapping backend.
#[derive(Default)]
pub struct ShutdownController;

impl ShutdownController {
    pub fn new() -> Self {
        Self
    }

    /// Signal the drained `tracked` pids, then sweep the fixed pattern
    /// list.
    pub fn broadcast(&self, tracked: Vec<TrackedProcess>) -> ShutdownReport {
        let mut targeted = 0;
        for process in tracked {
            if process_scan::kill_pid(process.pid) {
                debug!(pid = process.pid, "tracked backend signalled");
                targeted += 1;
            } else {
                debug!(pid = process.pid, "tracked backend already gone");
            }
        }

        let patterns: Vec<&str> = MappingMethod::ALL
            .iter()
            .map(|m| m.kill_pattern())
            .collect();
        let swept = process_scan::kill_matching(&patterns);

        info!(targeted, swept, "mapping shutdown broadcast complete");
        ShutdownReport { targeted, swept }
    }
}
