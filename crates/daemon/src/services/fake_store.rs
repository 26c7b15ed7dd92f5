// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job store backing both the persistence and search seams in
//! tests. Mirrors the real store's one rule: terminal statuses are final.

use super::persistence::{PersistenceError, PersistenceService};
use super::search::{SearchError, SearchService};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use stoker_core::{ApplicationId, Job, JobExecution, JobId, JobRequest, JobStatus};

/// One recorded `update_job_status` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: JobId,
    pub status: JobStatus,
    pub message: String,
}

#[derive(Default)]
struct JobRecord {
    job: Option<Job>,
    execution: Option<JobExecution>,
    request: Option<JobRequest>,
    exit_code: Option<i32>,
}

#[derive(Default)]
struct FakeStoreState {
    records: HashMap<JobId, JobRecord>,
    updates: Vec<StatusUpdate>,
    fail_writes: bool,
}

/// Fake job store for tests; implements both service seams over one map.
#[derive(Clone, Default)]
pub struct FakeJobStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl FakeJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&self, job: Job) {
        let mut state = self.inner.lock();
        let id = job.id.clone();
        state.records.entry(id).or_default().job = Some(job);
    }

    pub fn insert_execution(&self, id: &JobId, execution: JobExecution) {
        let mut state = self.inner.lock();
        state.records.entry(id.clone()).or_default().execution = Some(execution);
    }

    pub fn insert_request(&self, id: &JobId, request: JobRequest) {
        let mut state = self.inner.lock();
        state.records.entry(id.clone()).or_default().request = Some(request);
    }

    /// Make every write fail with a backend error until cleared.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.inner.lock().records.get(id).and_then(|r| r.job.as_ref()).map(|j| j.status)
    }

    pub fn exit_code(&self, id: &JobId) -> Option<i32> {
        self.inner.lock().records.get(id).and_then(|r| r.exit_code)
    }

    /// Every `update_job_status` call observed, in order.
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.inner.lock().updates.clone()
    }
}

#[async_trait]
impl PersistenceService for FakeJobStore {
    async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        message: &str,
    ) -> Result<(), PersistenceError> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            return Err(PersistenceError::Backend("scripted write failure".to_string()));
        }
        state.updates.push(StatusUpdate {
            id: id.clone(),
            status,
            message: message.to_string(),
        });
        let record = state.records.get_mut(id).ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        let job = record.job.as_mut().ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        if job.status.is_terminal() {
            return Err(PersistenceError::Backend(format!(
                "job {id} is already {}",
                job.status
            )));
        }
        job.status = status;
        Ok(())
    }

    async fn set_exit_code(&self, id: &JobId, exit_code: i32) -> Result<(), PersistenceError> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            return Err(PersistenceError::Backend("scripted write failure".to_string()));
        }
        let record = state.records.get_mut(id).ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.exit_code = Some(exit_code);
        let job = record.job.as_mut().ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        job.status = if exit_code == 0 { JobStatus::Succeeded } else { JobStatus::Failed };
        Ok(())
    }
}

#[async_trait]
impl SearchService for FakeJobStore {
    async fn get_job(&self, id: &JobId) -> Result<Job, SearchError> {
        self.inner
            .lock()
            .records
            .get(id)
            .and_then(|r| r.job.clone())
            .ok_or_else(|| SearchError::NotFound(id.clone()))
    }

    async fn get_job_status(&self, id: &JobId) -> Result<JobStatus, SearchError> {
        self.get_job(id).await.map(|job| job.status)
    }

    async fn get_job_execution(&self, id: &JobId) -> Result<JobExecution, SearchError> {
        self.inner
            .lock()
            .records
            .get(id)
            .and_then(|r| r.execution.clone())
            .ok_or_else(|| SearchError::NotFound(id.clone()))
    }

    async fn get_job_request(&self, id: &JobId) -> Result<JobRequest, SearchError> {
        self.inner
            .lock()
            .records
            .get(id)
            .and_then(|r| r.request.clone())
            .ok_or_else(|| SearchError::NotFound(id.clone()))
    }

    async fn get_job_applications(&self, id: &JobId) -> Result<Vec<ApplicationId>, SearchError> {
        self.get_job_request(id).await.map(|request| request.applications)
    }
}
