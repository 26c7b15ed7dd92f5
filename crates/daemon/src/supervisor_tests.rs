// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end supervisor scenarios: monitor, pump, completion, launcher
//! kill path, all on fakes.

use super::*;
use crate::config::OutputLimits;
use crate::exec::{FakeCommandExecutor, FakeOutcome};
use crate::services::{FakeFileTransfer, FakeJobStore, FakeMailService, PersistenceService};
use std::time::Duration;
use stoker_core::{
    counter_names, FakeClock, Job, JobFinishedReason, JobRequest, JobStatus,
};

/// Stand-in for the launcher's kill path. Records requests; when
/// `finish_on_kill` is set it behaves like the real launcher: marks the job
/// killed and publishes the follow-up `JobFinished(Killed)`.
struct LauncherFake {
    store: FakeJobStore,
    bus: Mutex<Option<EventBus>>,
    kills: Mutex<Vec<(JobId, String)>>,
    finish_on_kill: bool,
}

impl LauncherFake {
    fn new(store: FakeJobStore, finish_on_kill: bool) -> Self {
        Self { store, bus: Mutex::new(None), kills: Mutex::new(Vec::new()), finish_on_kill }
    }

    fn set_bus(&self, bus: EventBus) {
        *self.bus.lock() = Some(bus);
    }

    /// Drop the launcher's publishing handle so a shutting-down pump can
    /// observe channel closure instead of waiting out the drain window.
    fn clear_bus(&self) {
        *self.bus.lock() = None;
    }

    fn kills(&self) -> Vec<(JobId, String)> {
        self.kills.lock().clone()
    }
}

#[async_trait]
impl KillRequestSink for LauncherFake {
    async fn kill_requested(&self, id: &JobId, reason: &str) {
        self.kills.lock().push((id.clone(), reason.to_string()));
        if self.finish_on_kill {
            let _ = self.store.update_job_status(id, JobStatus::Killed, reason).await;
            let bus = self.bus.lock().clone();
            if let Some(bus) = bus {
                bus.publish(Event::JobFinished {
                    id: id.clone(),
                    reason: JobFinishedReason::Killed,
                    message: reason.to_string(),
                });
            }
        }
    }
}

struct Fixture {
    supervisor: Supervisor<FakeClock>,
    store: FakeJobStore,
    mail: FakeMailService,
    executor: FakeCommandExecutor,
    launcher: Arc<LauncherFake>,
    metrics: Metrics,
    base: tempfile::TempDir,
}

fn fixture(finish_on_kill: bool) -> Fixture {
    let base = tempfile::tempdir().unwrap();
    let clock = FakeClock::at_epoch_ms(10_000);
    let store = FakeJobStore::new();
    let mail = FakeMailService::new();
    let transfer = FakeFileTransfer::new();
    let executor = FakeCommandExecutor::new();
    let metrics = Metrics::new();
    let launcher = Arc::new(LauncherFake::new(store.clone(), finish_on_kill));

    let mut config = SupervisorConfig::new(base.path());
    config.output = OutputLimits { max_std_out: 100, max_std_err: 100 };

    let completion = Arc::new(JobCompletionHandler::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(transfer),
        Arc::new(mail.clone()),
        Arc::new(executor.clone()),
        base.path(),
        config.cleanup,
        &metrics,
    ));

    let supervisor = Supervisor::start(
        config,
        SupervisorDeps {
            completion,
            kill_sink: launcher.clone(),
            executor: Arc::new(executor.clone()),
            metrics: metrics.clone(),
        },
        clock.clone(),
    );
    launcher.set_bus(supervisor.bus());

    Fixture { supervisor, store, mail, executor, launcher, metrics, base }
}

impl Fixture {
    fn seed_running_job(&self, id: &str, email: Option<&str>) -> JobId {
        let job_id = JobId::from(id);
        self.store.insert_job(Job::builder().id(job_id.clone()).status(JobStatus::Running).build());
        self.store.insert_request(
            &job_id,
            JobRequest { email: email.map(String::from), applications: Vec::new() },
        );
        job_id
    }

    fn execution(&self, timeout_epoch_ms: Option<u64>) -> JobExecution {
        let mut builder = JobExecution::builder()
            .process_id(4242u32)
            .check_delay(Duration::from_millis(1));
        if let Some(deadline) = timeout_epoch_ms {
            builder = builder.timeout_epoch_ms(deadline);
        }
        let execution = builder.build();
        self.store.insert_execution(&JobId::from("job-1"), execution.clone());
        execution
    }

    fn out_paths(&self) -> (PathBuf, PathBuf) {
        (self.base.path().join("stdout"), self.base.path().join("stderr"))
    }

    fn write_done_file(&self, id: &JobId, exit_code: i32) {
        let dir = self.base.path().join(id.as_str()).join("genie");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("genie.done"), format!("{{\"exitCode\": {exit_code}}}")).unwrap();
    }
}

async fn wait_until(mut pred: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if pred() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn happy_path_process_completes_and_job_succeeds() {
    let f = fixture(false);
    let id = f.seed_running_job("job-1", Some("u@x"));
    let execution = f.execution(None);
    f.write_done_file(&id, 0);

    // Three healthy probes, then the process is gone; the pkill safety net
    // also sees a dead group.
    f.executor.push_outcome(FakeOutcome::Ok);
    f.executor.push_outcome(FakeOutcome::Ok);
    f.executor.push_outcome(FakeOutcome::Ok);
    f.executor.set_default_outcome(FakeOutcome::ExitCode(1));

    let (std_out, std_err) = f.out_paths();
    f.supervisor.attach(id.clone(), execution, std_out, std_err).unwrap();

    wait_until(|| f.store.status(&id) == Some(JobStatus::Succeeded)).await;
    wait_until(|| !f.supervisor.is_monitoring(&id)).await;

    assert_eq!(f.metrics.value(counter_names::FINISHED), 1);
    assert_eq!(f.metrics.value(counter_names::SUCCESSFUL_STATUS_CHECK), 3);
    assert_eq!(f.metrics.value(counter_names::EMAIL_SUCCESS), 1);
    assert_eq!(f.metrics.value(counter_names::ARCHIVAL_FAILURE), 0);
    assert_eq!(f.mail.sent().len(), 1);
    assert_eq!(f.store.exit_code(&id), Some(0));
    assert!(f.launcher.kills().is_empty());
    assert_eq!(f.supervisor.monitor_count(), 0);
}

#[tokio::test]
async fn timeout_kill_lands_as_killed_without_exit_code() {
    let f = fixture(true);
    let id = f.seed_running_job("job-1", None);
    // Deadline already behind the clock.
    let execution = f.execution(Some(500));

    let (std_out, std_err) = f.out_paths();
    f.supervisor.attach(id.clone(), execution, std_out, std_err).unwrap();

    wait_until(|| f.store.status(&id) == Some(JobStatus::Killed)).await;

    assert_eq!(f.metrics.value(counter_names::TIMEOUT), 1);
    assert_eq!(f.launcher.kills(), vec![(id.clone(), "Job exceeded timeout".to_string())]);
    assert_eq!(f.store.exit_code(&id), None);
    // The completion handler found the job already KILLED and did nothing.
    assert!(f.mail.sent().is_empty());
}

#[tokio::test]
async fn stdout_overflow_requests_a_kill_but_transitions_nothing() {
    let f = fixture(false);
    let id = f.seed_running_job("job-1", None);
    let execution = f.execution(None);
    let (std_out, std_err) = f.out_paths();
    std::fs::write(&std_out, vec![b'x'; 101]).unwrap();

    f.supervisor.attach(id.clone(), execution, std_out, std_err).unwrap();

    wait_until(|| !f.launcher.kills().is_empty()).await;

    assert_eq!(f.launcher.kills(), vec![(id.clone(), "Std out length exceeded".to_string())]);
    assert_eq!(f.metrics.value(counter_names::STD_OUT_TOO_LARGE), 1);
    // KillJob is a request; the monitor itself transitions no state.
    assert_eq!(f.store.status(&id), Some(JobStatus::Running));
}

#[tokio::test]
async fn at_most_one_monitor_per_job() {
    let f = fixture(false);
    let id = f.seed_running_job("job-1", None);
    // Slow cadence so the first monitor is still alive for the second attach.
    let execution = JobExecution::builder()
        .process_id(4242u32)
        .check_delay(Duration::from_secs(60))
        .build();

    let (std_out, std_err) = f.out_paths();
    f.supervisor.attach(id.clone(), execution.clone(), std_out.clone(), std_err.clone()).unwrap();
    let second = f.supervisor.attach(id.clone(), execution, std_out, std_err);

    assert!(matches!(second, Err(SupervisorError::AlreadyMonitored(_))));
    assert_eq!(f.supervisor.monitor_count(), 1);

    f.launcher.clear_bus();
    f.supervisor.shutdown().await;
}

#[tokio::test]
async fn job_id_can_be_attached_again_after_completion() {
    let f = fixture(false);
    let id = f.seed_running_job("job-1", None);
    let execution = f.execution(None);
    f.write_done_file(&id, 0);
    f.executor.set_default_outcome(FakeOutcome::ExitCode(1));

    let (std_out, std_err) = f.out_paths();
    f.supervisor.attach(id.clone(), execution.clone(), std_out.clone(), std_err.clone()).unwrap();
    wait_until(|| !f.supervisor.is_monitoring(&id)).await;

    // A fresh run of the same job id gets a fresh monitor.
    f.executor.set_default_outcome(FakeOutcome::Ok);
    f.supervisor.attach(id.clone(), execution, std_out, std_err).unwrap();
    assert!(f.supervisor.is_monitoring(&id));

    f.launcher.clear_bus();
    f.supervisor.shutdown().await;
}

#[tokio::test]
async fn shutdown_aborts_live_monitors() {
    let f = fixture(false);
    let id = f.seed_running_job("job-1", None);
    let execution = JobExecution::builder()
        .process_id(4242u32)
        .check_delay(Duration::from_secs(60))
        .build();

    let (std_out, std_err) = f.out_paths();
    f.supervisor.attach(id.clone(), execution, std_out, std_err).unwrap();
    assert_eq!(f.supervisor.monitor_count(), 1);

    f.launcher.clear_bus();
    f.supervisor.shutdown().await;
}
