// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File transfer to the remote archive store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload to {uri} failed: {message}")]
    Upload { uri: String, message: String },
}

/// Uploads a local file to a remote URI.
#[async_trait]
pub trait FileTransferService: Send + Sync {
    async fn put_file(&self, local: &Path, remote_uri: &str) -> Result<(), TransferError>;
}

/// HTTP-backed transfer: a single PUT of the file body to the remote URI.
#[derive(Clone, Default)]
pub struct HttpFileTransfer {
    client: reqwest::Client,
}

impl HttpFileTransfer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileTransferService for HttpFileTransfer {
    async fn put_file(&self, local: &Path, remote_uri: &str) -> Result<(), TransferError> {
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|source| TransferError::Read { path: local.to_path_buf(), source })?;

        tracing::info!(path = %local.display(), uri = remote_uri, bytes = bytes.len(), "uploading archive");

        self.client
            .put(remote_uri)
            .body(bytes)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TransferError::Upload {
                uri: remote_uri.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{FileTransferService, TransferError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct FakeTransferState {
        uploads: Vec<(PathBuf, String)>,
        fail_next: bool,
    }

    /// Fake transfer service recording uploads.
    #[derive(Clone)]
    pub struct FakeFileTransfer {
        inner: Arc<Mutex<FakeTransferState>>,
    }

    impl Default for FakeFileTransfer {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeTransferState {
                    uploads: Vec::new(),
                    fail_next: false,
                })),
            }
        }
    }

    impl FakeFileTransfer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next(&self) {
            self.inner.lock().fail_next = true;
        }

        pub fn uploads(&self) -> Vec<(PathBuf, String)> {
            self.inner.lock().uploads.clone()
        }
    }

    #[async_trait]
    impl FileTransferService for FakeFileTransfer {
        async fn put_file(&self, local: &Path, remote_uri: &str) -> Result<(), TransferError> {
            let mut state = self.inner.lock();
            if std::mem::take(&mut state.fail_next) {
                return Err(TransferError::Upload {
                    uri: remote_uri.to_string(),
                    message: "scripted failure".to_string(),
                });
            }
            state.uploads.push((local.to_path_buf(), remote_uri.to_string()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFileTransfer;
