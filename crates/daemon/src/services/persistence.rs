// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write side of the job store.

use async_trait::async_trait;
use stoker_core::{JobId, JobStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("persistence call failed: {0}")]
    Backend(String),
}

/// Durable store of job metadata and status.
///
/// The store enforces monotonic status progression; callers never transition
/// a job out of a terminal status.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Transition the job to `status`, recording `message` alongside.
    async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        message: &str,
    ) -> Result<(), PersistenceError>;

    /// Record the child's exit code. The store derives the terminal status
    /// from the code (0 succeeds, anything else fails, plus whatever
    /// store-defined special codes exist).
    async fn set_exit_code(&self, id: &JobId, exit_code: i32) -> Result<(), PersistenceError>;
}
