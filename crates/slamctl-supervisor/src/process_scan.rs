//! Process-tree inspection and signalling via `sysinfo`.
//!
//! The startup verifier uses [`descendant_count`] as its liveness heuristic:
//! the external launch tooling always forks workers when genuinely running,
//! so a backend with zero descendants is judged unhealthy.  The shutdown
//! controller uses [`kill_pid`] for targeted termination and
//! [`kill_matching`] for the name-pattern broadcast.

use std::collections::HashSet;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

/// Number of live descendant processes (children, grandchildren, ...) of
/// `root_pid`.  Returns 0 when the process itself is gone.
pub fn descendant_count(root_pid: u32) -> usize {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    descendants(&system, root_pid).len()
}

fn descendants(system: &System, root_pid: u32) -> HashSet<Pid> {
    let root = Pid::from_u32(root_pid);
    let mut members: HashSet<Pid> = HashSet::new();
    members.insert(root);

    // Parent links arrive in arbitrary map order; iterate to a fixpoint so
    // grandchildren are found regardless of traversal order.
    loop {
        let before = members.len();
        for (pid, process) in system.processes() {
            if let Some(parent) = process.parent()
                && members.contains(&parent)
            {
                members.insert(*pid);
            }
        }
        if members.len() == before {
            break;
        }
    }

    members.remove(&root);
    members
}

/// Best-effort kill of a single pid.  Returns `true` when a signal was
/// delivered, `false` when the process no longer exists or could not be
/// signalled.
pub fn kill_pid(pid: u32) -> bool {
    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), false);
    match system.process(target) {
        Some(process) => process.kill(),
        None => false,
    }
}

/// Best-effort kill of every process whose command line contains one of
/// `patterns`.  The calling process is never signalled.  Returns the number
/// of processes a signal was delivered to.
pub fn kill_matching(patterns: &[&str]) -> usize {
    let own_pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    // A plain process refresh leaves cmd() empty; command lines must be
    // requested explicitly or the sweep matches nothing.
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let mut killed = 0;
    for (pid, process) in system.processes() {
        if *pid == own_pid {
            continue;
        }
        let matches = process
            .cmd()
            .iter()
            .any(|arg| patterns.iter().any(|p| arg.to_string_lossy().contains(p)))
            || patterns
                .iter()
                .any(|p| process.name().to_string_lossy().contains(p));
        if matches && process.kill() {
            debug!(pid = pid.as_u32(), "killed process matching shutdown pattern");
            killed += 1;
        }
    }
    killed
}
