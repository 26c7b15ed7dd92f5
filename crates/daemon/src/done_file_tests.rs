// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn done_file_path_layout() {
    let path = done_file_path(Path::new("/var/jobs"), &JobId::from("job-9"));
    assert_eq!(path, PathBuf::from("/var/jobs/job-9/genie/genie.done"));
}

#[test]
fn loads_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DONE_FILE_NAME);
    std::fs::write(&path, br#"{"exitCode": 0}"#).unwrap();
    assert_eq!(load(&path).unwrap(), JobDoneFile { exit_code: 0 });
}

#[test]
fn loads_nonzero_and_negative_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DONE_FILE_NAME);
    std::fs::write(&path, br#"{"exitCode": 137}"#).unwrap();
    assert_eq!(load(&path).unwrap().exit_code, 137);
    std::fs::write(&path, br#"{"exitCode": -1}"#).unwrap();
    assert_eq!(load(&path).unwrap().exit_code, -1);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.done");
    assert!(matches!(load(&path), Err(DoneFileError::Read { .. })));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DONE_FILE_NAME);
    std::fs::write(&path, b"{ truncated").unwrap();
    assert!(matches!(load(&path), Err(DoneFileError::Parse { .. })));
}

#[test]
fn missing_exit_code_field_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DONE_FILE_NAME);
    std::fs::write(&path, br#"{"status": "done"}"#).unwrap();
    assert!(matches!(load(&path), Err(DoneFileError::Parse { .. })));
}
