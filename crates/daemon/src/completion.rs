// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-mortem pipeline for finished jobs.
//!
//! Consumes `JobFinished` events and walks the job to a terminal state:
//! final status, process-group cleanup, working-directory archival,
//! dependency pruning, and the submitter email. Every step is its own error
//! boundary; a failed step is counted, logged, and never blocks the steps
//! after it. The only fatal error is failing to load the job at the gate.

use crate::bus::EventSubscriber;
use crate::config::CleanupConfig;
use crate::done_file;
use crate::exec::{CommandExecutor, CommandSpec};
use crate::services::{
    FileTransferService, MailService, PersistenceService, SearchError, SearchService,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stoker_core::{
    counter_names, Counter, Event, JobFinishedReason, JobId, JobStatus, Metrics,
};
use thiserror::Error;

/// Status message persisted when the done file cannot be read.
pub(crate) const DONE_FILE_FAILURE_MESSAGE: &str = "Genie could not load done file.";

/// Subject prefix for completion emails.
pub(crate) const EMAIL_SUBJECT_PREFIX: &str = "Genie Job";

/// Signal used for the process-group safety net.
const PKILL_SIGNAL_FLAG: &str = "-KILL";

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The idempotence gate could not load the job; nothing was done.
    #[error("could not load job {id} for completion: {source}")]
    Gate {
        id: JobId,
        #[source]
        source: SearchError,
    },
}

struct CompletionCounters {
    email_success: Counter,
    email_failure: Counter,
    archival_failure: Counter,
    done_file_processing_failure: Counter,
    final_status_update_failure: Counter,
    process_group_cleanup_failure: Counter,
    archive_file_deletion_failure: Counter,
    delete_dependencies_failure: Counter,
}

impl CompletionCounters {
    fn new(metrics: &Metrics) -> Self {
        Self {
            email_success: metrics.counter(counter_names::EMAIL_SUCCESS),
            email_failure: metrics.counter(counter_names::EMAIL_FAILURE),
            archival_failure: metrics.counter(counter_names::ARCHIVAL_FAILURE),
            done_file_processing_failure: metrics
                .counter(counter_names::DONE_FILE_PROCESSING_FAILURE),
            final_status_update_failure: metrics
                .counter(counter_names::FINAL_STATUS_UPDATE_FAILURE),
            process_group_cleanup_failure: metrics
                .counter(counter_names::PROCESS_GROUP_CLEANUP_FAILURE),
            archive_file_deletion_failure: metrics
                .counter(counter_names::ARCHIVE_FILE_DELETION_FAILURE),
            delete_dependencies_failure: metrics
                .counter(counter_names::DELETE_DEPENDENCIES_FAILURE),
        }
    }
}

/// Handles everything that must happen once a job's process is gone.
pub struct JobCompletionHandler {
    persistence: Arc<dyn PersistenceService>,
    search: Arc<dyn SearchService>,
    transfer: Arc<dyn FileTransferService>,
    mail: Arc<dyn MailService>,
    executor: Arc<dyn CommandExecutor>,
    base_working_dir: PathBuf,
    cleanup: CleanupConfig,
    counters: CompletionCounters,
}

impl JobCompletionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        search: Arc<dyn SearchService>,
        transfer: Arc<dyn FileTransferService>,
        mail: Arc<dyn MailService>,
        executor: Arc<dyn CommandExecutor>,
        base_working_dir: impl Into<PathBuf>,
        cleanup: CleanupConfig,
        metrics: &Metrics,
    ) -> Self {
        Self {
            persistence,
            search,
            transfer,
            mail,
            executor,
            base_working_dir: base_working_dir.into(),
            cleanup,
            counters: CompletionCounters::new(metrics),
        }
    }

    /// Run the completion pipeline for one `JobFinished` event.
    ///
    /// Safe to call again with the same event: the gate sees the terminal
    /// status written by the first delivery and returns without effects.
    pub async fn handle(&self, event: &Event) -> Result<(), CompletionError> {
        let Event::JobFinished { id, reason, message } = event else {
            return Ok(());
        };

        let job = self
            .search
            .get_job(id)
            .await
            .map_err(|source| CompletionError::Gate { id: id.clone(), source })?;

        if job.status.is_terminal() {
            tracing::debug!(job_id = %id, status = %job.status, "job already finished; nothing to do");
            return Ok(());
        }

        match job.status {
            JobStatus::Init => self.assign_status_from_reason(id, *reason, message).await,
            JobStatus::Running => {
                self.finalize_from_done_file(id).await;
                self.cleanup_process_group(id).await;
            }
            // Terminal statuses returned above; nothing else exists.
            _ => {}
        }

        // Runs regardless of which branch handled the status.
        self.process_job_dir(id).await;
        self.send_completion_email(id).await;

        Ok(())
    }

    /// The job never left INIT; the event's reason is the whole story.
    async fn assign_status_from_reason(
        &self,
        id: &JobId,
        reason: JobFinishedReason,
        message: &str,
    ) {
        let status = match reason {
            JobFinishedReason::Killed => JobStatus::Killed,
            JobFinishedReason::Invalid => JobStatus::Invalid,
            JobFinishedReason::FailedToInit => JobStatus::Failed,
            JobFinishedReason::ProcessCompleted => JobStatus::Succeeded,
            JobFinishedReason::Unknown => {
                tracing::error!(job_id = %id, "unknown finish reason; leaving status untouched");
                self.counters.final_status_update_failure.increment();
                return;
            }
        };

        if let Err(e) = self.persistence.update_job_status(id, status, message).await {
            tracing::error!(job_id = %id, status = %status, error = %e, "final status update failed");
            self.counters.final_status_update_failure.increment();
        }
    }

    /// Finalize a RUNNING job from the wrapper's exit record.
    async fn finalize_from_done_file(&self, id: &JobId) {
        let path = done_file::done_file_path(&self.base_working_dir, id);
        let result = match done_file::load(&path) {
            Ok(done) => {
                tracing::debug!(job_id = %id, exit_code = done.exit_code, "read done file");
                self.persistence.set_exit_code(id, done.exit_code).await
            }
            Err(e) => {
                // The wrapper writes the done file as its last act, so a
                // missing record means the run ended abnormally.
                self.counters.done_file_processing_failure.increment();
                tracing::error!(job_id = %id, error = %e, "could not load done file; marking job failed");
                self.persistence
                    .update_job_status(id, JobStatus::Failed, DONE_FILE_FAILURE_MESSAGE)
                    .await
            }
        };

        if let Err(e) = result {
            tracing::error!(job_id = %id, error = %e, "could not update exit code and status");
            self.counters.final_status_update_failure.increment();
        }
    }

    /// Safety net against children the wrapper script left behind.
    ///
    /// The group is expected to be gone, so the pkill is expected to fail;
    /// a pkill that finds something to kill is the anomaly we count.
    async fn cleanup_process_group(&self, id: &JobId) {
        let execution = match self.search.get_job_execution(id).await {
            Ok(execution) => execution,
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "no execution record; cannot clean up process group");
                self.counters.process_group_cleanup_failure.increment();
                return;
            }
        };

        let spec = CommandSpec::new("pkill")
            .arg(PKILL_SIGNAL_FLAG)
            .arg(execution.process_id.to_string());
        match self.executor.run(&spec).await {
            Ok(()) => {
                tracing::warn!(
                    job_id = %id,
                    pid = execution.process_id,
                    "process group outlived the wrapper script"
                );
                self.counters.process_group_cleanup_failure.increment();
            }
            Err(_) => {
                tracing::debug!(job_id = %id, "process group already gone");
            }
        }
    }

    /// Archive the working directory and prune dependency trees.
    async fn process_job_dir(&self, id: &JobId) {
        let job = match self.search.get_job(id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "could not load job; skipping directory processing");
                return;
            }
        };

        let job_dir = self.base_working_dir.join(id.as_str());
        if !job_dir.exists() {
            return;
        }

        if self.cleanup.delete_dependencies {
            self.delete_application_dependencies(id, &job_dir).await;
        }

        let Some(location) = job.archive_location.as_deref().map(str::trim).filter(|l| !l.is_empty())
        else {
            return;
        };

        if let Err(e) = self.archive_and_upload(id, &job_dir, location).await {
            tracing::error!(job_id = %id, error = %e, "could not archive job directory");
            self.counters.archival_failure.increment();
        }
    }

    async fn archive_and_upload(
        &self,
        id: &JobId,
        job_dir: &Path,
        location: &str,
    ) -> anyhow::Result<()> {
        let archive = job_dir
            .join(done_file::JOB_MARKER_DIR)
            .join("logs")
            .join(format!("{id}.tar.gz"));

        // The job directory can contain files owned by the run-as user, so
        // the tar always goes through sudo.
        let spec = CommandSpec::new("sudo")
            .args(["tar", "-c", "-z", "-f"])
            .arg(archive.display().to_string())
            .arg("./")
            .cwd(job_dir);
        self.executor.run(&spec).await?;

        self.transfer.put_file(&archive, location).await?;

        if self.cleanup.delete_archive_file {
            if let Err(e) = std::fs::remove_file(&archive) {
                tracing::error!(job_id = %id, path = %archive.display(), error = %e, "failed to delete archive file");
                self.counters.archive_file_deletion_failure.increment();
            }
        }

        Ok(())
    }

    async fn delete_application_dependencies(&self, id: &JobId, job_dir: &Path) {
        let result: anyhow::Result<()> = async {
            let applications = self.search.get_job_applications(id).await?;
            for app in applications {
                let dependency_dir = job_dir
                    .join(done_file::JOB_MARKER_DIR)
                    .join("applications")
                    .join(app.as_str())
                    .join("dependencies");
                if !dependency_dir.exists() {
                    continue;
                }

                let spec = if self.cleanup.run_as_user {
                    CommandSpec::new("sudo").args(["rm", "-rf"])
                } else {
                    CommandSpec::new("rm").arg("-rf")
                }
                .arg(dependency_dir.display().to_string());

                tracing::debug!(job_id = %id, command = %spec.display_line(), "deleting dependencies");
                self.executor.run(&spec).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(job_id = %id, error = %e, "could not delete job dependencies");
            self.counters.delete_dependencies_failure.increment();
        }
    }

    async fn send_completion_email(&self, id: &JobId) {
        let result: anyhow::Result<bool> = async {
            let request = self.search.get_job_request(id).await?;
            let Some(to) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
            else {
                return Ok(false);
            };

            let status = self.search.get_job_status(id).await?;
            self.mail
                .send_email(
                    to,
                    &format!("{EMAIL_SUBJECT_PREFIX}{id}"),
                    &format!("Job with id [{id}] finished with status {status}"),
                )
                .await?;
            Ok(true)
        }
        .await;

        match result {
            Ok(true) => self.counters.email_success.increment(),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "could not send completion email");
                self.counters.email_failure.increment();
            }
        }
    }
}

#[async_trait]
impl EventSubscriber for JobCompletionHandler {
    async fn on_event(&self, event: &Event) {
        if let Err(e) = self.handle(event).await {
            tracing::error!(error = %e, "completion handler aborted for this event");
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
