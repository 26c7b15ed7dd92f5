// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness probe for a job's child process.

use crate::exec::{CommandExecutor, CommandSpec, ExecError};
use std::sync::Arc;
use stoker_core::Clock;
use thiserror::Error;

/// Why a probe did not come back "alive".
#[derive(Debug, Error)]
pub enum CheckError {
    /// The job's wall-clock deadline has passed. Takes precedence over
    /// live/dead detection: a timed-out job is reported as timed out even
    /// when the process is still running.
    #[error("job exceeded its wall-clock deadline")]
    Timeout,

    /// The PID no longer names a live process.
    #[error("process is no longer running")]
    ProcessGone,

    /// The probe itself failed; nothing is known about the process.
    #[error("process probe failed: {0}")]
    ProbeError(String),
}

/// Signal-zero liveness checker for POSIX hosts.
///
/// `kill -0 <pid>` delivers no signal; it only asks the kernel whether the
/// PID names a live process we may signal. The probe is idempotent and has
/// no effect on the child.
pub struct UnixProcessChecker<C: Clock> {
    pid: u32,
    timeout_epoch_ms: Option<u64>,
    executor: Arc<dyn CommandExecutor>,
    clock: C,
}

impl<C: Clock> UnixProcessChecker<C> {
    pub fn new(
        pid: u32,
        timeout_epoch_ms: Option<u64>,
        executor: Arc<dyn CommandExecutor>,
        clock: C,
    ) -> Self {
        Self { pid, timeout_epoch_ms, executor, clock }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Probe the process. Returns `Ok(())` while the PID names a live
    /// process and the deadline has not passed.
    pub async fn check_process(&self) -> Result<(), CheckError> {
        if let Some(deadline) = self.timeout_epoch_ms {
            if self.clock.epoch_ms() > deadline {
                return Err(CheckError::Timeout);
            }
        }

        let spec = CommandSpec::new("kill").arg("-0").arg(self.pid.to_string());
        match self.executor.run(&spec).await {
            Ok(()) => Ok(()),
            Err(ExecError::NonZeroExit { .. }) => Err(CheckError::ProcessGone),
            Err(e @ ExecError::Spawn { .. }) => Err(CheckError::ProbeError(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
