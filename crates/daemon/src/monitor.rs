// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job monitor: probes the child process on a fixed delay and publishes
//! the job's terminal lifecycle event.

use crate::bus::EventBus;
use crate::config::OutputLimits;
use crate::output;
use crate::process::{CheckError, UnixProcessChecker};
use std::path::PathBuf;
use std::time::Duration;
use stoker_core::{counter_names, Clock, Counter, Event, JobExecution, JobFinishedReason, JobId, Metrics};

/// How many consecutive probe errors we tolerate before forcing a kill.
/// The escalation fires on error number `MAX_ERRORS + 1`.
pub const MAX_ERRORS: u32 = 5;

pub(crate) const STD_OUT_EXCEEDED: &str = "Std out length exceeded";
pub(crate) const STD_ERR_EXCEEDED: &str = "Std err length exceeded";
pub(crate) const TIMEOUT_EXCEEDED: &str = "Job exceeded timeout";
pub(crate) const PROCESS_COMPLETE: &str = "Process detected to be complete";

/// What a tick decided about the monitor's future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Probe again after the check delay.
    Continue,
    /// A terminal event was published; the monitor is done.
    Finished,
}

struct MonitorCounters {
    successful_check: Counter,
    unsuccessful_check: Counter,
    timeout: Counter,
    finished: Counter,
    std_out_too_large: Counter,
    std_err_too_large: Counter,
}

impl MonitorCounters {
    fn new(metrics: &Metrics) -> Self {
        Self {
            successful_check: metrics.counter(counter_names::SUCCESSFUL_STATUS_CHECK),
            unsuccessful_check: metrics.counter(counter_names::UNSUCCESSFUL_STATUS_CHECK),
            timeout: metrics.counter(counter_names::TIMEOUT),
            finished: metrics.counter(counter_names::FINISHED),
            std_out_too_large: metrics.counter(counter_names::STD_OUT_TOO_LARGE),
            std_err_too_large: metrics.counter(counter_names::STD_ERR_TOO_LARGE),
        }
    }
}

/// Monitor for one running job.
///
/// Fixed-delay scheduling means ticks for the same job never overlap, so
/// `error_count` needs no lock. The terminal event a tick publishes is the
/// last event this monitor ever emits.
pub struct JobMonitor<C: Clock> {
    id: JobId,
    check_delay: Duration,
    std_out: PathBuf,
    std_err: PathBuf,
    checker: UnixProcessChecker<C>,
    bus: EventBus,
    limits: OutputLimits,
    counters: MonitorCounters,
    error_count: u32,
}

impl<C: Clock> JobMonitor<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: JobId,
        execution: &JobExecution,
        std_out: PathBuf,
        std_err: PathBuf,
        checker: UnixProcessChecker<C>,
        bus: EventBus,
        limits: OutputLimits,
        metrics: &Metrics,
    ) -> Self {
        Self {
            id,
            check_delay: execution.check_delay,
            std_out,
            std_err,
            checker,
            bus,
            limits,
            counters: MonitorCounters::new(metrics),
            error_count: 0,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.id
    }

    /// Run the fixed-delay probe loop until a tick publishes a terminal
    /// event. The next tick starts `check_delay` after the previous one
    /// returned, never earlier.
    pub async fn run(mut self) {
        while self.tick().await == TickOutcome::Continue {
            tokio::time::sleep(self.check_delay).await;
        }
        tracing::info!(job_id = %self.id, "monitor finished");
    }

    /// One probe. Exactly one of the four branches runs.
    pub async fn tick(&mut self) -> TickOutcome {
        match self.checker.check_process().await {
            Ok(()) => {
                tracing::debug!(job_id = %self.id, "job is still running");
                self.error_count = 0;

                if !output::within_limit(&self.std_out, self.limits.max_std_out) {
                    self.bus.publish(Event::KillJob {
                        id: self.id.clone(),
                        reason: STD_OUT_EXCEEDED.to_string(),
                    });
                    self.counters.std_out_too_large.increment();
                    return TickOutcome::Finished;
                }

                if !output::within_limit(&self.std_err, self.limits.max_std_err) {
                    self.bus.publish(Event::KillJob {
                        id: self.id.clone(),
                        reason: STD_ERR_EXCEEDED.to_string(),
                    });
                    self.counters.std_err_too_large.increment();
                    return TickOutcome::Finished;
                }

                self.counters.successful_check.increment();
                TickOutcome::Continue
            }
            Err(CheckError::Timeout) => {
                tracing::info!(job_id = %self.id, "job has timed out");
                self.counters.timeout.increment();
                self.bus.publish(Event::KillJob {
                    id: self.id.clone(),
                    reason: TIMEOUT_EXCEEDED.to_string(),
                });
                TickOutcome::Finished
            }
            Err(CheckError::ProcessGone) => {
                tracing::info!(job_id = %self.id, "job has finished");
                self.counters.finished.increment();
                self.bus.publish(Event::JobFinished {
                    id: self.id.clone(),
                    reason: JobFinishedReason::ProcessCompleted,
                    message: PROCESS_COMPLETE.to_string(),
                });
                TickOutcome::Finished
            }
            Err(CheckError::ProbeError(message)) => {
                tracing::error!(
                    job_id = %self.id,
                    pid = self.checker.pid(),
                    error = %message,
                    "unable to check process status"
                );
                self.error_count += 1;
                self.counters.unsuccessful_check.increment();
                if self.error_count > MAX_ERRORS {
                    let reason = format!(
                        "Couldn't check process status {MAX_ERRORS} consecutive times"
                    );
                    self.bus
                        .publish(Event::KillJob { id: self.id.clone(), reason: reason.clone() });
                    // The kill request alone can't land if the probe keeps
                    // failing, so also declare the job finished.
                    self.bus.publish(Event::JobFinished {
                        id: self.id.clone(),
                        reason: JobFinishedReason::Killed,
                        message: reason,
                    });
                    TickOutcome::Finished
                } else {
                    TickOutcome::Continue
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
