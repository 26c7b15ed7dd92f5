// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External command execution.
//!
//! Every external command the supervisor ever runs (pkill, rm, tar, the
//! signal-zero probe) goes through one executor seam. Arguments are discrete
//! tokens; nothing is ever handed to a shell, and child output is discarded.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;

/// A fully tokenized command line with an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Rendering for logs only; this string is never executed.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code:?}")]
    NonZeroExit { program: String, code: Option<i32> },
}

/// Executor seam for external commands.
///
/// Implementations must accept concurrent invocations; the process-backed
/// executor spawns a fresh child per call and keeps no shared state.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the command to completion. `Ok` means exit status zero.
    async fn run(&self, spec: &CommandSpec) -> Result<(), ExecError>;
}

/// Executor backed by real child processes.
///
/// stdin, stdout, and stderr are all null; callers only see the exit status.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandExecutor;

impl ProcessCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<(), ExecError> {
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let status = command
            .status()
            .await
            .map_err(|source| ExecError::Spawn { program: spec.program.clone(), source })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::NonZeroExit { program: spec.program.clone(), code: status.code() })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CommandExecutor, CommandSpec, ExecError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted outcome for one `run` call on the fake executor.
    #[derive(Debug, Clone)]
    pub enum FakeOutcome {
        Ok,
        ExitCode(i32),
        SpawnError(String),
    }

    impl FakeOutcome {
        fn into_result(self, program: &str) -> Result<(), ExecError> {
            match self {
                FakeOutcome::Ok => Ok(()),
                FakeOutcome::ExitCode(code) => Err(ExecError::NonZeroExit {
                    program: program.to_string(),
                    code: Some(code),
                }),
                FakeOutcome::SpawnError(message) => Err(ExecError::Spawn {
                    program: program.to_string(),
                    source: std::io::Error::other(message),
                }),
            }
        }
    }

    struct FakeExecutorState {
        calls: Vec<CommandSpec>,
        queue: VecDeque<FakeOutcome>,
        default: FakeOutcome,
    }

    /// Fake executor recording every invocation.
    ///
    /// Outcomes pushed with [`push_outcome`](FakeCommandExecutor::push_outcome)
    /// are consumed in order; once the queue is empty the default outcome
    /// (initially `Ok`) applies.
    #[derive(Clone)]
    pub struct FakeCommandExecutor {
        inner: Arc<Mutex<FakeExecutorState>>,
    }

    impl Default for FakeCommandExecutor {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeExecutorState {
                    calls: Vec::new(),
                    queue: VecDeque::new(),
                    default: FakeOutcome::Ok,
                })),
            }
        }
    }

    impl FakeCommandExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_outcome(&self, outcome: FakeOutcome) {
            self.inner.lock().queue.push_back(outcome);
        }

        pub fn set_default_outcome(&self, outcome: FakeOutcome) {
            self.inner.lock().default = outcome;
        }

        /// Every command run so far, in order.
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.inner.lock().calls.clone()
        }

        /// Display lines of every command run so far, for compact asserts.
        pub fn call_lines(&self) -> Vec<String> {
            self.inner.lock().calls.iter().map(CommandSpec::display_line).collect()
        }
    }

    #[async_trait]
    impl CommandExecutor for FakeCommandExecutor {
        async fn run(&self, spec: &CommandSpec) -> Result<(), ExecError> {
            let outcome = {
                let mut state = self.inner.lock();
                state.calls.push(spec.clone());
                state.queue.pop_front().unwrap_or_else(|| state.default.clone())
            };
            outcome.into_result(&spec.program)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCommandExecutor, FakeOutcome};

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
