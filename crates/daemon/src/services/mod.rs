// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service seams for the completion pipeline's external collaborators.
//!
//! Persistence, search, file transfer, and mail are remote services owned
//! elsewhere; the supervisor only sees these traits. Every trait ships an
//! in-process fake for tests.

pub mod mail;
pub mod persistence;
pub mod search;
pub mod transfer;

pub use mail::{LogMailService, MailError, MailService};
pub use persistence::{PersistenceError, PersistenceService};
pub use search::{SearchError, SearchService};
pub use transfer::{FileTransferService, HttpFileTransfer, TransferError};

#[cfg(any(test, feature = "test-support"))]
mod fake_store;
#[cfg(any(test, feature = "test-support"))]
pub use fake_store::{FakeJobStore, StatusUpdate};
#[cfg(any(test, feature = "test-support"))]
pub use mail::FakeMailService;
#[cfg(any(test, feature = "test-support"))]
pub use transfer::FakeFileTransfer;
