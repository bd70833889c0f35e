// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport seam to the ledger network.
//!
//! The network (consensus nodes, gRPC wire protocol, receipts) is an external
//! collaborator. [`super::LedgerClient`] only needs to submit a signed
//! operation and wait for its receipt, and to read token balances.

use async_trait::async_trait;

use super::types::{AccountId, SignedOperation, TokenId, TransactionReceipt};

/// Errors raised by a ledger transport before a receipt exists.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// The network refused the operation at precheck (bad payer, signature, duplicate).
    #[error("{0}")]
    Rejected(String),

    /// The transport itself failed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A ledger network that executes signed operations.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Submit an operation and wait until the network issues its receipt.
    async fn submit(&self, operation: SignedOperation) -> Result<TransactionReceipt, NetworkError>;

    /// Current balance of `token` held by `account`, in the token's smallest unit.
    async fn token_balance(&self, account: &AccountId, token: &TokenId) -> Result<u64, NetworkError>;
}
