// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output size guard for job stdout/stderr files.

use std::path::Path;

/// True when the file at `path` is within `max` bytes.
///
/// A missing file is no violation, and a file we cannot stat is treated the
/// same way; the monitor only kills on evidence of an oversized file. A file
/// at exactly `max` bytes passes; the first byte over trips the guard.
pub fn within_limit(path: &Path, max: u64) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() <= max,
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
