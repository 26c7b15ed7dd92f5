// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_is_within_limit() {
    let dir = tempfile::tempdir().unwrap();
    assert!(within_limit(&dir.path().join("stdout"), 0));
}

#[test]
fn file_at_exactly_max_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stdout");
    std::fs::write(&path, vec![b'x'; 100]).unwrap();
    assert!(within_limit(&path, 100));
}

#[test]
fn one_byte_over_max_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stdout");
    std::fs::write(&path, vec![b'x'; 101]).unwrap();
    assert!(!within_limit(&path, 100));
}

#[test]
fn empty_file_passes_zero_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stderr");
    std::fs::write(&path, b"").unwrap();
    assert!(within_limit(&path, 0));
}
