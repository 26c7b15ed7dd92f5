// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity, status machine, and the read models owned by persistence.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque job identity, assigned by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of an application a job depends on. The on-disk dependency
/// path inside the job working directory is derived from this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Persisted job status.
///
/// Progresses monotonically: once a terminal status is assigned the
/// persistence layer accepts no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job record created, child process not yet confirmed running
    Init,
    /// Child process is running under a monitor
    Running,
    /// Process exited with code 0
    Succeeded,
    /// Process exited non-zero, or finalization forced the failure
    Failed,
    /// Job was killed (operator, timeout, or output overflow)
    Killed,
    /// Job request never became runnable
    Invalid,
}

impl JobStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Killed | JobStatus::Invalid
        )
    }
}

crate::simple_display! {
    JobStatus {
        Init => "INIT",
        Running => "RUNNING",
        Succeeded => "SUCCEEDED",
        Failed => "FAILED",
        Killed => "KILLED",
        Invalid => "INVALID",
    }
}

/// Job read model, owned by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Remote URI the working-directory tarball is uploaded to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_location: Option<String>,
    /// Submitter email, if one was provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

crate::builder! {
    pub struct JobBuilder => Job {
        set {
            id: JobId = JobId::from("job-1"),
            status: JobStatus = JobStatus::Running,
        }
        option {
            archive_location: String = None,
            email: String = None,
        }
    }
}

/// Execution record for a launched job, owned by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExecution {
    /// OS process id of the child running the job.
    pub process_id: u32,
    /// Fixed delay between monitor probes, measured from the end of the
    /// previous probe.
    #[serde(with = "duration_millis")]
    pub check_delay: Duration,
    /// Absolute wall-clock deadline (epoch milliseconds). `None` means the
    /// job never times out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_epoch_ms: Option<u64>,
}

crate::builder! {
    pub struct JobExecutionBuilder => JobExecution {
        set {
            process_id: u32 = 4242u32,
            check_delay: Duration = Duration::from_millis(100),
        }
        option {
            timeout_epoch_ms: u64 = None,
        }
    }
}

/// Original submission request, owned by the persistence service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Submitter email to notify on completion, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Applications the job depends on.
    #[serde(default)]
    pub applications: Vec<ApplicationId>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
