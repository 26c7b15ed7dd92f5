// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion email notifications.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail send failed: {0}")]
    SendFailed(String),
}

/// Sends a single plain-text email.
#[async_trait]
pub trait MailService: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Mail service that only logs.
///
/// Nodes without an outbound mail relay run with this; the real relay
/// implementation lives with the deployment, not in this crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailService;

#[async_trait]
impl MailService for LogMailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tracing::info!(to, subject, body, "mail relay not configured; logging instead");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{MailError, MailService};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded email.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    struct FakeMailState {
        sent: Vec<SentMail>,
        fail_next: bool,
    }

    /// Fake mail service recording every message.
    #[derive(Clone)]
    pub struct FakeMailService {
        inner: Arc<Mutex<FakeMailState>>,
    }

    impl Default for FakeMailService {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeMailState { sent: Vec::new(), fail_next: false })) }
        }
    }

    impl FakeMailService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next(&self) {
            self.inner.lock().fail_next = true;
        }

        pub fn sent(&self) -> Vec<SentMail> {
            self.inner.lock().sent.clone()
        }
    }

    #[async_trait]
    impl MailService for FakeMailService {
        async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
            let mut state = self.inner.lock();
            if std::mem::take(&mut state.fail_next) {
                return Err(MailError::SendFailed("scripted failure".to_string()));
            }
            state.sent.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMailService, SentMail};
