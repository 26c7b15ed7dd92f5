// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output cap: 8 GiB for stdout and stderr alike.
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 8 * 1024 * 1024 * 1024;

/// Byte thresholds beyond which a live job is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLimits {
    #[serde(default = "default_max_output")]
    pub max_std_out: u64,
    #[serde(default = "default_max_output")]
    pub max_std_err: u64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self { max_std_out: DEFAULT_MAX_OUTPUT_BYTES, max_std_err: DEFAULT_MAX_OUTPUT_BYTES }
    }
}

fn default_max_output() -> u64 {
    DEFAULT_MAX_OUTPUT_BYTES
}

/// Flags controlling the destructive parts of the completion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Delete the local tarball after a successful upload.
    #[serde(default = "default_true")]
    pub delete_archive_file: bool,
    /// Delete per-application dependency trees after the job completes.
    #[serde(default = "default_true")]
    pub delete_dependencies: bool,
    /// Issue destructive filesystem operations via `sudo`.
    #[serde(default)]
    pub run_as_user: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { delete_archive_file: true, delete_dependencies: true, run_as_user: false }
    }
}

fn default_true() -> bool {
    true
}

/// Top-level supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Directory under which the launcher creates one directory per job.
    pub base_working_dir: PathBuf,
    #[serde(default)]
    pub output: OutputLimits,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl SupervisorConfig {
    pub fn new(base_working_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_working_dir: base_working_dir.into(),
            output: OutputLimits::default(),
            cleanup: CleanupConfig::default(),
        }
    }

    /// Apply `STOKER_*` environment overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = bool_env("STOKER_DELETE_ARCHIVE_FILE") {
            self.cleanup.delete_archive_file = v;
        }
        if let Some(v) = bool_env("STOKER_DELETE_DEPENDENCIES") {
            self.cleanup.delete_dependencies = v;
        }
        if let Some(v) = bool_env("STOKER_RUN_AS_USER") {
            self.cleanup.run_as_user = v;
        }
        if let Some(v) = u64_env("STOKER_MAX_STD_OUT") {
            self.output.max_std_out = v;
        }
        if let Some(v) = u64_env("STOKER_MAX_STD_ERR") {
            self.output.max_std_err = v;
        }
        self
    }
}

fn bool_env(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|s| match s.trim() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    })
}

fn u64_env(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
