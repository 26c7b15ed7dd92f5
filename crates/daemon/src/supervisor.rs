// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node-local supervisor: one monitor task per running job, one pump task
//! delivering lifecycle events to the completion handler and the launcher's
//! kill path.
//!
//! Monitors live in memory only. On a supervisor restart they are gone and
//! the persistence layer remains the system of record; jobs whose status is
//! still non-terminal at that point need operator attention.

use crate::bus::{channel, EventBus, EventSubscriber};
use crate::completion::JobCompletionHandler;
use crate::config::SupervisorConfig;
use crate::exec::CommandExecutor;
use crate::monitor::JobMonitor;
use crate::process::UnixProcessChecker;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use stoker_core::{Clock, Event, JobExecution, JobId, Metrics};
use thiserror::Error;
use tokio::task::JoinHandle;

/// How long shutdown waits for queued events to reach subscribers.
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("job {0} already has a live monitor")]
    AlreadyMonitored(JobId),
}

/// Receives kill requests published by monitors.
///
/// Implemented by the launcher subsystem, which signals the child process
/// and then publishes the follow-up `JobFinished(Killed)` event.
#[async_trait]
pub trait KillRequestSink: Send + Sync {
    async fn kill_requested(&self, id: &JobId, reason: &str);
}

/// Forwards `KillJob` events from the bus to the launcher's kill path.
struct KillForwarder {
    sink: Arc<dyn KillRequestSink>,
}

#[async_trait]
impl EventSubscriber for KillForwarder {
    async fn on_event(&self, event: &Event) {
        if let Event::KillJob { id, reason } = event {
            self.sink.kill_requested(id, reason).await;
        }
    }
}

/// Drops a job's monitor entry once its termination is observed.
///
/// By the time a `JobFinished` event is delivered the monitor has published
/// its terminal event and its loop has ended; this clears the registry slot
/// so the job id can be attached again. Only finished tasks are removed: a
/// stale event must never evict a monitor attached for a fresh run of the
/// same job id (attach prunes finished leftovers itself).
struct MonitorReaper {
    monitors: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
}

#[async_trait]
impl EventSubscriber for MonitorReaper {
    async fn on_event(&self, event: &Event) {
        if let Event::JobFinished { id, .. } = event {
            let mut monitors = self.monitors.lock();
            if monitors.get(id).is_some_and(|handle| handle.is_finished()) {
                monitors.remove(id);
                tracing::debug!(job_id = %id, "monitor removed from registry");
            }
        }
    }
}

/// Everything the supervisor needs from the rest of the node.
pub struct SupervisorDeps {
    pub completion: Arc<JobCompletionHandler>,
    pub kill_sink: Arc<dyn KillRequestSink>,
    pub executor: Arc<dyn CommandExecutor>,
    pub metrics: Metrics,
}

/// Per-node registry of job monitors plus the event pump.
pub struct Supervisor<C: Clock> {
    clock: C,
    config: SupervisorConfig,
    executor: Arc<dyn CommandExecutor>,
    metrics: Metrics,
    bus: EventBus,
    monitors: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
    pump: JoinHandle<()>,
}

impl<C: Clock> Supervisor<C> {
    /// Wire the bus and start the pump.
    ///
    /// Subscriber order is fixed: the launcher's kill path first, the
    /// completion handler second, the registry reaper last — so a monitor's
    /// slot is cleared only after the completion handler saw the event.
    pub fn start(config: SupervisorConfig, deps: SupervisorDeps, clock: C) -> Self {
        let (bus, mut pump) = channel();
        let monitors: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        pump.subscribe(Arc::new(KillForwarder { sink: deps.kill_sink }));
        pump.subscribe(deps.completion);
        pump.subscribe(Arc::new(MonitorReaper { monitors: monitors.clone() }));
        let pump = tokio::spawn(pump.run());

        Self {
            clock,
            config,
            executor: deps.executor,
            metrics: deps.metrics,
            bus,
            monitors,
            pump,
        }
    }

    /// Publishing handle for collaborators outside the monitors (the
    /// launcher publishes `JobFinished(FailedToInit)` and kill follow-ups
    /// through this).
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    /// Start monitoring a job the launcher reports as running.
    ///
    /// At most one monitor may exist per job id; an entry whose task already
    /// finished does not count.
    pub fn attach(
        &self,
        id: JobId,
        execution: JobExecution,
        std_out: PathBuf,
        std_err: PathBuf,
    ) -> Result<(), SupervisorError> {
        let mut monitors = self.monitors.lock();
        if let Some(existing) = monitors.get(&id) {
            if existing.is_finished() {
                monitors.remove(&id);
            } else {
                return Err(SupervisorError::AlreadyMonitored(id));
            }
        }

        let checker = UnixProcessChecker::new(
            execution.process_id,
            execution.timeout_epoch_ms,
            self.executor.clone(),
            self.clock.clone(),
        );
        let monitor = JobMonitor::new(
            id.clone(),
            &execution,
            std_out,
            std_err,
            checker,
            self.bus.clone(),
            self.config.output,
            &self.metrics,
        );

        tracing::info!(
            job_id = %id,
            pid = execution.process_id,
            check_delay_ms = execution.check_delay.as_millis() as u64,
            "monitor attached"
        );
        monitors.insert(id, tokio::spawn(monitor.run()));
        Ok(())
    }

    /// True while the job has a live monitor task.
    pub fn is_monitoring(&self, id: &JobId) -> bool {
        self.monitors.lock().get(id).is_some_and(|handle| !handle.is_finished())
    }

    pub fn monitor_count(&self) -> usize {
        let mut monitors = self.monitors.lock();
        monitors.retain(|_, handle| !handle.is_finished());
        monitors.len()
    }

    /// Abort every monitor, drain in-flight events, and stop the pump.
    pub async fn shutdown(self) {
        for (id, handle) in self.monitors.lock().drain() {
            tracing::debug!(job_id = %id, "aborting monitor");
            handle.abort();
        }
        drop(self.bus);
        // Outstanding bus clones (the launcher's handle) can keep the pump
        // alive past the drain window; cut it loose then.
        let mut pump = self.pump;
        if tokio::time::timeout(DRAIN_TIMEOUT, &mut pump).await.is_err() {
            tracing::warn!("event pump did not drain in time; aborting");
            pump.abort();
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
