// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-slot wallet session.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──handshake ok──▶ Connected
//!      ▲                        │                           │
//!      └──── handshake error ───┘◀──────── disconnect ──────┘
//! ```
//!
//! `connect` is compare-and-swap: it refuses to run while a session exists or
//! a handshake is in flight. Swapping sessions is explicit through
//! [`WalletSessionManager::replace_session`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extension::{ExtensionError, WalletExtension};
use super::provider::{WalletProvider, WalletRegistry};
use super::WalletError;
use crate::blockchain::{AccountId, SignaturePair, UnsignedOperation};
use crate::bounded::{run_bounded, CallOptions, Interrupted};

/// The active wallet connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WalletSession {
    /// Identifies this connection; changes on every connect.
    pub session_id: Uuid,
    pub provider: WalletProvider,
    pub account_id: AccountId,
    pub connected: bool,
    pub connected_at: DateTime<Utc>,
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting { provider: WalletProvider },
    Connected { session: WalletSession },
}

enum Slot {
    Disconnected,
    Connecting {
        provider: WalletProvider,
        attempt: Uuid,
    },
    Connected {
        session: WalletSession,
        extension: Arc<dyn WalletExtension>,
    },
}

/// Owner of the one active wallet session.
pub struct WalletSessionManager {
    registry: Arc<WalletRegistry>,
    slot: RwLock<Slot>,
}

impl WalletSessionManager {
    pub fn new(registry: Arc<WalletRegistry>) -> Self {
        Self {
            registry,
            slot: RwLock::new(Slot::Disconnected),
        }
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    /// Connect the named wallet. Fails if a session exists or is being established.
    pub async fn connect(
        &self,
        wallet_name: &str,
        options: &CallOptions,
    ) -> Result<WalletSession, WalletError> {
        self.establish(wallet_name, options, false).await
    }

    /// Drop any existing session and connect the named wallet in its place.
    pub async fn replace_session(
        &self,
        wallet_name: &str,
        options: &CallOptions,
    ) -> Result<WalletSession, WalletError> {
        self.establish(wallet_name, options, true).await
    }

    /// Clear the session. Idempotent.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.write().await;
        if let Slot::Connected { session, .. } = &*slot {
            info!(
                provider = %session.provider,
                account_id = %session.account_id,
                "Wallet disconnected"
            );
        }
        *slot = Slot::Disconnected;
    }

    pub async fn state(&self) -> SessionState {
        match &*self.slot.read().await {
            Slot::Disconnected => SessionState::Disconnected,
            Slot::Connecting { provider, .. } => SessionState::Connecting {
                provider: *provider,
            },
            Slot::Connected { session, .. } => SessionState::Connected {
                session: session.clone(),
            },
        }
    }

    pub async fn current(&self) -> Option<WalletSession> {
        match &*self.slot.read().await {
            Slot::Connected { session, .. } => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.current().await.is_some()
    }

    /// Whether `session_id` is still the active session.
    pub async fn is_current(&self, session_id: Uuid) -> bool {
        matches!(
            &*self.slot.read().await,
            Slot::Connected { session, .. } if session.session_id == session_id
        )
    }

    /// Signer bound to the active session.
    pub async fn signer(&self) -> Result<SessionSigner, WalletError> {
        match &*self.slot.read().await {
            Slot::Connected { session, extension } => Ok(SessionSigner {
                session_id: session.session_id,
                account_id: session.account_id.clone(),
                extension: extension.clone(),
            }),
            _ => Err(WalletError::NotConnected),
        }
    }

    async fn establish(
        &self,
        wallet_name: &str,
        options: &CallOptions,
        replace: bool,
    ) -> Result<WalletSession, WalletError> {
        let detector = self
            .registry
            .find_installed(wallet_name)
            .ok_or_else(|| WalletError::NotInstalled(wallet_name.to_string()))?;
        let provider = detector.provider();
        let extension = detector
            .extension()
            .ok_or_else(|| WalletError::NotInstalled(wallet_name.to_string()))?;

        let attempt = Uuid::new_v4();
        {
            let mut slot = self.slot.write().await;
            match &*slot {
                Slot::Connecting { .. } => return Err(WalletError::ConnectInProgress),
                Slot::Connected { session, .. } if !replace => {
                    return Err(WalletError::SessionActive {
                        provider: session.provider,
                        account_id: session.account_id.clone(),
                    });
                }
                Slot::Connected { session, .. } => {
                    warn!(
                        previous_provider = %session.provider,
                        previous_account = %session.account_id,
                        provider = %provider,
                        "Replacing active wallet session"
                    );
                }
                Slot::Disconnected => {}
            }
            *slot = Slot::Connecting { provider, attempt };
        }

        info!(provider = %provider, "Connecting wallet");
        let outcome = run_bounded(options, extension.handshake()).await;

        let mut slot = self.slot.write().await;
        let still_ours = matches!(&*slot, Slot::Connecting { attempt: a, .. } if *a == attempt);

        let account_id = match outcome {
            Ok(Ok(account_id)) if still_ours => account_id,
            Ok(Ok(_)) => {
                warn!(provider = %provider, "Wallet connect superseded before handshake finished");
                return Err(WalletError::Cancelled);
            }
            Ok(Err(e)) => {
                if still_ours {
                    *slot = Slot::Disconnected;
                }
                warn!(provider = %provider, error = %e, "Wallet handshake failed");
                return Err(WalletError::Handshake(e));
            }
            Err(interrupted) => {
                if still_ours {
                    *slot = Slot::Disconnected;
                }
                warn!(provider = %provider, ?interrupted, "Wallet handshake interrupted");
                return Err(interrupted.into());
            }
        };

        let session = WalletSession {
            session_id: Uuid::new_v4(),
            provider,
            account_id,
            connected: true,
            connected_at: Utc::now(),
        };
        *slot = Slot::Connected {
            session: session.clone(),
            extension,
        };

        info!(
            provider = %session.provider,
            account_id = %session.account_id,
            session_id = %session.session_id,
            "Wallet connected"
        );
        Ok(session)
    }
}

impl From<Interrupted> for WalletError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut(after) => WalletError::Timeout(after),
            Interrupted::Cancelled => WalletError::Cancelled,
        }
    }
}

/// Signs through the extension bound to one session.
#[derive(Clone)]
pub struct SessionSigner {
    session_id: Uuid,
    account_id: AccountId,
    extension: Arc<dyn WalletExtension>,
}

impl SessionSigner {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Ask the session's extension to sign `operation` as the session account.
    pub async fn sign(&self, operation: &UnsignedOperation) -> Result<SignaturePair, ExtensionError> {
        self.extension.sign(&self.account_id, operation).await
    }
}
