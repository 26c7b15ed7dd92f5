// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named counter registry shared by the monitor and completion pipelines.
//!
//! Counters are cheap clonable handles; the registry hands out the same
//! underlying cell for the same name so every branch of the pipeline can
//! bump its counter without going back through a lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stable counter names. External dashboards key on these strings.
pub mod counter_names {
    pub const SUCCESSFUL_STATUS_CHECK: &str = "successfulStatusCheck";
    pub const UNSUCCESSFUL_STATUS_CHECK: &str = "unsuccessfulStatusCheck";
    pub const TIMEOUT: &str = "timeout";
    pub const FINISHED: &str = "finished";
    pub const STD_OUT_TOO_LARGE: &str = "stdOutTooLarge";
    pub const STD_ERR_TOO_LARGE: &str = "stdErrTooLarge";
    pub const EMAIL_SUCCESS: &str = "email.success";
    pub const EMAIL_FAILURE: &str = "email.failure";
    pub const ARCHIVAL_FAILURE: &str = "archivalFailure";
    pub const DONE_FILE_PROCESSING_FAILURE: &str = "doneFileProcessingFailure";
    pub const FINAL_STATUS_UPDATE_FAILURE: &str = "finalStatusUpdateFailure";
    pub const PROCESS_GROUP_CLEANUP_FAILURE: &str = "processGroupCleanupFailure";
    pub const ARCHIVE_FILE_DELETION_FAILURE: &str = "archiveFileDeletionFailure";
    pub const DELETE_DEPENDENCIES_FAILURE: &str = "deleteDependenciesFailure";
}

/// Handle to a single named counter.
#[derive(Clone, Debug, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Thread-safe registry of named counters.
#[derive(Clone, Default)]
pub struct Metrics {
    counters: Arc<Mutex<HashMap<String, Counter>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the counter registered under `name`.
    pub fn counter(&self, name: &str) -> Counter {
        let mut counters = self.counters.lock();
        counters.entry(name.to_string()).or_default().clone()
    }

    /// Current value of `name`, 0 when the counter was never touched.
    pub fn value(&self, name: &str) -> u64 {
        self.counters.lock().get(name).map(Counter::value).unwrap_or(0)
    }

    /// Snapshot of every registered counter, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .counters
            .lock()
            .iter()
            .map(|(name, counter)| (name.clone(), counter.value()))
            .collect();
        entries.sort();
        entries
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
