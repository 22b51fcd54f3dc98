//! [`ProcessTable`] – the supervisor's record of spawned mapping backends.
//!
//! The dispatcher registers a [`TrackedProcess`] here after a backend passes
//! (or is cancelled during) startup verification.  The shutdown controller
//! drains the table first so that recorded pids are signalled directly,
//! before falling back to the name-pattern broadcast.

use std::collections::HashMap;

use slamctl_types::{MappingMethod, TrackedProcess};

/// Maps each mapping method to the process last spawned for it.
///
/// At most one entry per method: re-registering a method replaces the
/// previous record, mirroring the one-concurrent-invocation-per-method
/// assumption of the launch log scheme.
#[derive(Default)]
pub struct ProcessTable {
    entries: HashMap<MappingMethod, TrackedProcess>,
}

impl ProcessTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `process` as the running backend for `method`, returning the
    /// previous record if one existed.
    pub fn register(
        &mut self,
        method: MappingMethod,
        process: TrackedProcess,
    ) -> Option<TrackedProcess> {
        self.entries.insert(method, process)
    }

    /// The tracked process for `method`, if any.
    pub fn get(&self, method: MappingMethod) -> Option<&TrackedProcess> {
        self.entries.get(&method)
    }

    /// Remove and return every tracked process.  Used by the shutdown
    /// controller's targeted pass.
    pub fn drain(&mut self) -> Vec<TrackedProcess> {
        self.entries.drain().map(|(_, p)| p).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
