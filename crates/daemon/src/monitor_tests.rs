// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::{channel, RecordingSubscriber};
use crate::exec::{FakeCommandExecutor, FakeOutcome};
use std::sync::Arc;
use stoker_core::{FakeClock, JobExecution};

struct Fixture {
    monitor: JobMonitor<FakeClock>,
    executor: FakeCommandExecutor,
    recorder: Arc<RecordingSubscriber>,
    pump: tokio::task::JoinHandle<()>,
    metrics: Metrics,
    clock: FakeClock,
    _dir: tempfile::TempDir,
    std_out: PathBuf,
    std_err: PathBuf,
}

fn fixture(execution: JobExecution, limits: OutputLimits) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let std_out = dir.path().join("stdout");
    let std_err = dir.path().join("stderr");
    let clock = FakeClock::at_epoch_ms(1_000);
    let executor = FakeCommandExecutor::new();
    let metrics = Metrics::new();
    let (bus, mut pump) = channel();
    let recorder = Arc::new(RecordingSubscriber::new());
    pump.subscribe(recorder.clone());
    let pump = tokio::spawn(pump.run());

    let checker = UnixProcessChecker::new(
        execution.process_id,
        execution.timeout_epoch_ms,
        Arc::new(executor.clone()),
        clock.clone(),
    );
    let monitor = JobMonitor::new(
        JobId::from("job-1"),
        &execution,
        std_out.clone(),
        std_err.clone(),
        checker,
        bus,
        limits,
        &metrics,
    );

    Fixture { monitor, executor, recorder, pump, metrics, clock, _dir: dir, std_out, std_err }
}

impl Fixture {
    /// Let the pump drain everything published so far.
    async fn drained_events(self) -> Vec<Event> {
        drop(self.monitor);
        self.pump.await.unwrap();
        self.recorder.events()
    }
}

fn default_limits() -> OutputLimits {
    OutputLimits { max_std_out: 1_000, max_std_err: 1_000 }
}

#[tokio::test]
async fn healthy_tick_counts_successful_check() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    assert_eq!(f.metrics.value(counter_names::SUCCESSFUL_STATUS_CHECK), 1);
    let events = f.drained_events().await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn process_gone_publishes_finished() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    f.executor.push_outcome(FakeOutcome::ExitCode(1));
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::FINISHED), 1);

    let events = f.drained_events().await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::JobFinished { reason, message, .. } => {
            assert_eq!(*reason, JobFinishedReason::ProcessCompleted);
            assert_eq!(message, "Process detected to be complete");
        }
        other => panic!("expected JobFinished, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_publishes_kill_and_takes_precedence_over_liveness() {
    let execution = JobExecution::builder().timeout_epoch_ms(500u64).build();
    let mut f = fixture(execution, default_limits());
    // Clock starts at 1_000, past the 500ms deadline; process would probe
    // alive but timeout wins.
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::TIMEOUT), 1);
    assert!(f.executor.calls().is_empty());

    let events = f.drained_events().await;
    assert_eq!(
        events,
        vec![Event::KillJob { id: JobId::from("job-1"), reason: "Job exceeded timeout".into() }]
    );
}

#[tokio::test]
async fn stdout_overflow_requests_kill_without_counting_success() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    std::fs::write(&f.std_out, vec![b'x'; 1_001]).unwrap();
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::STD_OUT_TOO_LARGE), 1);
    assert_eq!(f.metrics.value(counter_names::SUCCESSFUL_STATUS_CHECK), 0);

    let events = f.drained_events().await;
    assert_eq!(
        events,
        vec![Event::KillJob { id: JobId::from("job-1"), reason: "Std out length exceeded".into() }]
    );
}

#[tokio::test]
async fn stdout_at_exactly_max_does_not_kill() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    std::fs::write(&f.std_out, vec![b'x'; 1_000]).unwrap();
    assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    assert_eq!(f.metrics.value(counter_names::STD_OUT_TOO_LARGE), 0);
}

#[tokio::test]
async fn stderr_overflow_checked_after_stdout() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    std::fs::write(&f.std_err, vec![b'x'; 1_001]).unwrap();
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::STD_ERR_TOO_LARGE), 1);

    let events = f.drained_events().await;
    assert_eq!(
        events,
        vec![Event::KillJob { id: JobId::from("job-1"), reason: "Std err length exceeded".into() }]
    );
}

#[tokio::test]
async fn five_probe_errors_keep_the_monitor_alive() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    for _ in 0..MAX_ERRORS {
        f.executor.push_outcome(FakeOutcome::SpawnError("probe broken".into()));
        assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    }
    assert_eq!(f.metrics.value(counter_names::UNSUCCESSFUL_STATUS_CHECK), 5);
    let events = f.drained_events().await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn sixth_probe_error_escalates_with_both_events() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    f.executor.set_default_outcome(FakeOutcome::SpawnError("probe broken".into()));
    for _ in 0..MAX_ERRORS {
        assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    }
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::UNSUCCESSFUL_STATUS_CHECK), 6);

    let events = f.drained_events().await;
    let reason = "Couldn't check process status 5 consecutive times";
    assert_eq!(
        events,
        vec![
            Event::KillJob { id: JobId::from("job-1"), reason: reason.into() },
            Event::JobFinished {
                id: JobId::from("job-1"),
                reason: JobFinishedReason::Killed,
                message: reason.into(),
            },
        ]
    );
}

#[tokio::test]
async fn successful_probe_resets_the_error_count() {
    let mut f = fixture(JobExecution::builder().build(), default_limits());
    for _ in 0..MAX_ERRORS {
        f.executor.push_outcome(FakeOutcome::SpawnError("probe broken".into()));
        assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    }
    // One good probe resets the streak; five more errors still don't escalate.
    assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    for _ in 0..MAX_ERRORS {
        f.executor.push_outcome(FakeOutcome::SpawnError("probe broken".into()));
        assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    }
    let events = f.drained_events().await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn run_loop_stops_after_terminal_event() {
    let execution =
        JobExecution::builder().check_delay(std::time::Duration::from_millis(1)).build();
    let mut f = fixture(execution, default_limits());
    // Two healthy ticks, then the process disappears.
    f.executor.push_outcome(FakeOutcome::Ok);
    f.executor.push_outcome(FakeOutcome::Ok);
    f.executor.set_default_outcome(FakeOutcome::ExitCode(1));

    let executor = f.executor.clone();
    let metrics = f.metrics.clone();
    f.monitor.run().await;

    assert_eq!(executor.calls().len(), 3);
    assert_eq!(metrics.value(counter_names::SUCCESSFUL_STATUS_CHECK), 2);
    assert_eq!(metrics.value(counter_names::FINISHED), 1);

    // run() consumed the monitor and with it the last bus handle, so the
    // pump drains and exits on its own.
    f.pump.await.unwrap();
    let events = f.recorder.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::JobFinished { .. }));
}

#[tokio::test]
async fn timeout_only_fires_once_deadline_passes() {
    let execution = JobExecution::builder().timeout_epoch_ms(2_000u64).build();
    let mut f = fixture(execution, default_limits());
    assert_eq!(f.monitor.tick().await, TickOutcome::Continue);
    f.clock.advance(std::time::Duration::from_millis(1_500));
    assert_eq!(f.monitor.tick().await, TickOutcome::Finished);
    assert_eq!(f.metrics.value(counter_names::TIMEOUT), 1);
}
