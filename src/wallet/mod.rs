// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet capability detection and the single active wallet session.

use std::time::Duration;

pub mod extension;
pub mod provider;
pub mod session;

pub use extension::{ExtensionError, ExtensionSlot, KeyedExtension, WalletExtension};
pub use provider::{
    InjectedDetector, WalletDescriptor, WalletDetector, WalletProvider, WalletRegistry,
};
pub use session::{SessionSigner, SessionState, WalletSession, WalletSessionManager};

use crate::blockchain::AccountId;

/// Errors raised by the wallet layer.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet `{0}` is not installed")]
    NotInstalled(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("A {provider} session for {account_id} is already active; replace it explicitly")]
    SessionActive {
        provider: WalletProvider,
        account_id: AccountId,
    },

    #[error("A wallet connection is already in progress")]
    ConnectInProgress,

    /// The extension's own error, unchanged.
    #[error(transparent)]
    Handshake(ExtensionError),

    #[error("Wallet did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Wallet connection cancelled")]
    Cancelled,
}
