//! `slamctl-supervisor` – SLAM Backend Lifecycle Supervision
//!
//! Governs exactly three operations over a closed set of external SLAM
//! mapping backends: start one and verify it became healthy, stop them all,
//! and persist the current map while validating its output artifacts.  It
//! does not implement SLAM, does not parse map formats, and is not a
//! general process-supervision framework.
//!
//! # Modules
//!
//! - [`supervisor`] – [`MappingSupervisor`][supervisor::MappingSupervisor]:
//!   the public facade.  Every operation returns a populated
//!   [`OperationResult`][slamctl_types::OperationResult]; failures never
//!   escape as errors.
//! - [`launch`] – [`LaunchDispatcher`][launch::LaunchDispatcher]:
//!   resolves a [`MappingMethod`][slamctl_types::MappingMethod] to its
//!   launch target and spawns it with per-invocation log redirection.
//! - [`health`] – [`StartupVerifier`][health::StartupVerifier]:
//!   bounded, cancellable grace-window polling followed by a
//!   process-tree liveness heuristic.
//! - [`shutdown`] – [`ShutdownController`][shutdown::ShutdownController]:
//!   idempotent termination broadcast, targeted pids first, name patterns
//!   second.
//! - [`persist`] – [`MapPersister`][persist::MapPersister]:
//!   runs the external map saver and confirms the `.yaml`/`.pgm` artifact
//!   pair.
//! - [`process_table`] – the supervisor-owned record of spawned pids.
//! - [`process_scan`] – `sysinfo`-backed process-tree inspection and
//!   signalling.
//! - [`config`] – [`SupervisorConfig`][config::SupervisorConfig] tunables.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub mod config;
pub mod health;
pub mod launch;
pub mod persist;
pub mod process_scan;
pub mod process_table;
pub mod shutdown;
pub mod supervisor;

pub use config::SupervisorConfig;
pub use health::StartupVerifier;
pub use launch::{LaunchDispatcher, SpawnedProcess};
pub use persist::MapPersister;
pub use process_table::ProcessTable;
pub use shutdown::{ShutdownController, ShutdownReport};
pub use supervisor::MappingSupervisor;

/// Cooperative cancellation flag checked at every verification poll.
pub type CancelFlag = Arc<AtomicBool>;

/// A fresh, unraised [`CancelFlag`].
pub fn new_cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}
