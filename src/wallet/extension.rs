// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet extension contract and injection slots.
//!
//! A wallet extension holds the user's keys and authorizes operations. The
//! service never sees a private key for an extension-backed session: it asks
//! the extension to connect and to sign.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::blockchain::{AccountId, LocalKey, SignaturePair, UnsignedOperation};

/// Error reported by a wallet extension. Surfaced to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ExtensionError(pub String);

impl ExtensionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A wallet extension: connection handshake and operation signing.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Run the extension's own connection flow and return the connected account.
    async fn handshake(&self) -> Result<AccountId, ExtensionError>;

    /// Ask the extension to sign `operation` as `account`.
    async fn sign(
        &self,
        account: &AccountId,
        operation: &UnsignedOperation,
    ) -> Result<SignaturePair, ExtensionError>;
}

/// An extension backed by a locally held key.
///
/// Used for server-side wallets configured from the environment and as the
/// wallet in tests.
#[derive(Debug, Clone)]
pub struct KeyedExtension {
    key: LocalKey,
}

impl KeyedExtension {
    pub fn new(key: LocalKey) -> Self {
        Self { key }
    }

    pub fn account_id(&self) -> &AccountId {
        self.key.account_id()
    }

    pub fn public_key_hex(&self) -> String {
        self.key.public_key_hex()
    }
}

#[async_trait]
impl WalletExtension for KeyedExtension {
    async fn handshake(&self) -> Result<AccountId, ExtensionError> {
        Ok(self.key.account_id().clone())
    }

    async fn sign(
        &self,
        account: &AccountId,
        operation: &UnsignedOperation,
    ) -> Result<SignaturePair, ExtensionError> {
        self.key
            .sign_operation(account, operation)
            .map_err(|e| ExtensionError::new(e.to_string()))
    }
}

/// Late-bound slot an extension injects itself into.
///
/// Cloning shares the slot. Presence is read at call time, so a detector never
/// reports a stale answer.
#[derive(Clone, Default)]
pub struct ExtensionSlot {
    inner: Arc<RwLock<Option<Arc<dyn WalletExtension>>>>,
}

impl ExtensionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot that already holds `extension`.
    pub fn with(extension: Arc<dyn WalletExtension>) -> Self {
        let slot = Self::new();
        slot.inject(extension);
        slot
    }

    pub fn inject(&self, extension: Arc<dyn WalletExtension>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(extension);
        }
    }

    pub fn eject(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn get(&self) -> Option<Arc<dyn WalletExtension>> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_present(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for ExtensionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionSlot")
            .field("present", &self.is_present())
            .finish()
    }
}
