// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reader for the exit record the child wrapper script leaves behind.
//!
//! Stable filesystem contract with the launcher: the wrapper writes a small
//! JSON document to `<base>/<job-id>/genie/genie.done` as its very last act.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stoker_core::JobId;
use thiserror::Error;

/// Name of the per-job marker directory the launcher lays out.
pub const JOB_MARKER_DIR: &str = "genie";

/// File name of the exit record inside the marker directory.
pub const DONE_FILE_NAME: &str = "genie.done";

/// Exit record written by the wrapper script on child exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDoneFile {
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
}

#[derive(Debug, Error)]
pub enum DoneFileError {
    #[error("could not read done file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed done file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Path of the done file for `job_id` under `base_working_dir`.
pub fn done_file_path(base_working_dir: &Path, job_id: &JobId) -> PathBuf {
    base_working_dir.join(job_id.as_str()).join(JOB_MARKER_DIR).join(DONE_FILE_NAME)
}

/// Load and parse the done file at `path`.
pub fn load(path: &Path) -> Result<JobDoneFile, DoneFileError> {
    let bytes = std::fs::read(path)
        .map_err(|source| DoneFileError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes)
        .map_err(|source| DoneFileError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "done_file_tests.rs"]
mod tests;
