// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events published by job monitors and consumed by the
//! completion handler and the launcher subsystem.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

/// Why a job reached its end of life.
///
/// `Unknown` absorbs reason tags this node does not recognize (an older
/// supervisor receiving events from a newer producer). The completion
/// handler counts it and leaves the persisted status untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobFinishedReason {
    /// The child process exited on its own; the expected terminal path.
    ProcessCompleted,
    /// The job was killed (timeout, output overflow, probe escalation).
    Killed,
    /// The launcher never got the child process running.
    FailedToInit,
    /// The request was rejected before launch.
    Invalid,
    #[serde(other)]
    Unknown,
}

crate::simple_display! {
    JobFinishedReason {
        ProcessCompleted => "PROCESS_COMPLETED",
        Killed => "KILLED",
        FailedToInit => "FAILED_TO_INIT",
        Invalid => "INVALID",
        Unknown => "UNKNOWN",
    }
}

/// Events that flow over the supervisor bus.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A job's child process will not run any further; the completion
    /// handler owns everything that happens next.
    #[serde(rename = "job:finished")]
    JobFinished { id: JobId, reason: JobFinishedReason, message: String },

    /// Request to kill a running job. Consumed by the launcher subsystem,
    /// which signals the child and then emits `JobFinished(Killed)`.
    /// This event by itself transitions no persisted state.
    #[serde(rename = "job:kill")]
    KillJob { id: JobId, reason: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobFinished { .. } => "job:finished",
            Event::KillJob { .. } => "job:kill",
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobFinished { id, .. } | Event::KillJob { id, .. } => id,
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::JobFinished { id, reason, message } => {
                format!("{t} id={id} reason={reason} message={message}")
            }
            Event::KillJob { id, reason } => format!("{t} id={id} reason={reason}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
