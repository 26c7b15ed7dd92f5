// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read side of the job store.

use async_trait::async_trait;
use stoker_core::{ApplicationId, Job, JobExecution, JobId, JobRequest, JobStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("search call failed: {0}")]
    Backend(String),
}

/// Read API over persisted jobs.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn get_job(&self, id: &JobId) -> Result<Job, SearchError>;
    async fn get_job_status(&self, id: &JobId) -> Result<JobStatus, SearchError>;
    async fn get_job_execution(&self, id: &JobId) -> Result<JobExecution, SearchError>;
    async fn get_job_request(&self, id: &JobId) -> Result<JobRequest, SearchError>;
    async fn get_job_applications(&self, id: &JobId) -> Result<Vec<ApplicationId>, SearchError>;
}
