// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stoker-daemon: the node-local job lifecycle supervisor.
//!
//! Each launched job gets a monitor task that probes its child process on a
//! fixed delay and publishes a terminal lifecycle event when the process is
//! gone or must be killed. The completion handler consumes those events and
//! runs the post-mortem pipeline: final status, process-group cleanup,
//! archive upload, dependency pruning, and submitter email.

pub mod bus;
pub mod completion;
pub mod config;
pub mod done_file;
pub mod exec;
pub mod monitor;
pub mod output;
pub mod process;
pub mod services;
pub mod supervisor;

pub use bus::{channel, EventBus, EventPump, EventSubscriber};
pub use completion::{CompletionError, JobCompletionHandler};
pub use config::{CleanupConfig, OutputLimits, SupervisorConfig};
pub use done_file::JobDoneFile;
pub use exec::{CommandExecutor, CommandSpec, ExecError, ProcessCommandExecutor};
pub use monitor::{JobMonitor, TickOutcome, MAX_ERRORS};
pub use process::{CheckError, UnixProcessChecker};
pub use supervisor::{KillRequestSink, Supervisor, SupervisorDeps, SupervisorError};
