// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Mirror Store
//!
//! Denormalized copies of ledger-confirmed facts, kept in a remote row store
//! for fast listing. The ledger is the source of truth: a row is only written
//! after its ledger operation returned a successful receipt, but a confirmed
//! operation may exist without a row if the mirror write failed.
//!
//! ## Tables
//!
//! ```text
//! tokens                  # fungible tokens created through this service
//! aid_tokens              # aid issued to recipients
//! distributions           # distributions against aid requests
//! midnight_transactions   # one row per mirrored ledger transaction
//! ```
//!
//! Only select and insert are issued. The schema is owned elsewhere.

pub mod listing_cache;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use listing_cache::ListingCache;
pub use memory::InMemoryMirror;
pub use rest::RestMirror;

pub const TOKENS_TABLE: &str = "tokens";
pub const AID_TOKENS_TABLE: &str = "aid_tokens";
pub const DISTRIBUTIONS_TABLE: &str = "distributions";
pub const TRANSACTIONS_TABLE: &str = "midnight_transactions";

// =============================================================================
// Records
// =============================================================================

/// A fungible token created through this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenRecord {
    pub id: Uuid,
    pub creator_id: String,
    pub name: String,
    pub symbol: String,
    pub supply: u64,
    /// Ledger token id (`0.0.N`)
    #[serde(rename = "contract_address")]
    pub ledger_token_id: Option<String>,
    /// Ledger transaction id of the creation
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewToken {
    pub creator_id: String,
    pub name: String,
    pub symbol: String,
    pub supply: u64,
    #[serde(rename = "contract_address")]
    pub ledger_token_id: String,
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: String,
    pub is_active: bool,
}

/// Aid issued to a recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AidTokenRecord {
    pub id: Uuid,
    pub recipient_id: String,
    /// Service-side aid identifier (`AID_<millis>`)
    pub token_id: String,
    pub amount: u64,
    pub token_type: String,
    #[serde(rename = "contract_address")]
    pub ledger_token_id: String,
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub restrictions: Option<serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub used_amount: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAidToken {
    pub recipient_id: String,
    pub token_id: String,
    pub amount: u64,
    pub token_type: String,
    #[serde(rename = "contract_address")]
    pub ledger_token_id: String,
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: String,
    pub restrictions: Option<serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub used_amount: u64,
}

/// Lifecycle of a distribution row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Pending,
    Completed,
    Failed,
}

/// A distribution against an aid request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DistributionRecord {
    pub id: Uuid,
    pub aid_request_id: String,
    pub distributor_id: String,
    pub recipient_id: String,
    pub amount: u64,
    #[serde(rename = "token_contract_address")]
    pub ledger_token_id: Option<String>,
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: Option<String>,
    #[serde(rename = "shielded_memo")]
    pub memo: Option<String>,
    pub status: DistributionStatus,
    pub distributed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDistribution {
    pub aid_request_id: String,
    pub distributor_id: String,
    pub recipient_id: String,
    pub amount: u64,
    #[serde(rename = "token_contract_address")]
    pub ledger_token_id: String,
    #[serde(rename = "midnight_tx_hash")]
    pub ledger_tx_id: String,
    #[serde(rename = "shielded_memo")]
    pub memo: Option<String>,
    pub status: DistributionStatus,
    pub distributed_at: DateTime<Utc>,
}

/// Kind of mirrored ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTxType {
    TokenCreation,
    TokenTransfer,
    Distribution,
}

/// Status of a mirrored ledger transaction. Only confirmed operations are mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTxStatus {
    Confirmed,
}

/// One mirrored ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerTransactionRecord {
    pub id: Uuid,
    pub tx_hash: String,
    pub tx_type: LedgerTxType,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub amount: u64,
    pub shielded: bool,
    pub status: LedgerTxStatus,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerTransaction {
    pub tx_hash: String,
    pub tx_type: LedgerTxType,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub amount: u64,
    pub shielded: bool,
    pub status: LedgerTxStatus,
    pub metadata: serde_json::Value,
}

// =============================================================================
// Store
// =============================================================================

/// Errors returned by a mirror store.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Mirror store request failed: {0}")]
    Request(String),

    #[error("Mirror store returned {status} for `{table}`: {body}")]
    Status {
        table: &'static str,
        status: u16,
        body: String,
    },

    #[error("Mirror store response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Mirror store is unavailable: {0}")]
    Unavailable(String),
}

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Row store holding mirrored records. Select and insert only.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// The newest active token, if any.
    async fn active_token(&self) -> MirrorResult<Option<TokenRecord>>;

    /// Active tokens, newest first.
    async fn list_active_tokens(&self) -> MirrorResult<Vec<TokenRecord>>;

    async fn insert_token(&self, token: NewToken) -> MirrorResult<TokenRecord>;

    async fn insert_aid_token(&self, aid: NewAidToken) -> MirrorResult<AidTokenRecord>;

    /// Aid issued to `recipient_id`, newest first.
    async fn list_aid_tokens(&self, recipient_id: &str) -> MirrorResult<Vec<AidTokenRecord>>;

    async fn insert_distribution(
        &self,
        distribution: NewDistribution,
    ) -> MirrorResult<DistributionRecord>;

    /// Distributions where `user_id` is the distributor or the recipient, newest first.
    async fn list_distributions(&self, user_id: &str) -> MirrorResult<Vec<DistributionRecord>>;

    async fn insert_transaction(
        &self,
        transaction: NewLedgerTransaction,
    ) -> MirrorResult<LedgerTransactionRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_table_column_names() {
        let new = NewDistribution {
            aid_request_id: "req-1".to_string(),
            distributor_id: "user-1".to_string(),
            recipient_id: "0.0.2002".to_string(),
            amount: 50,
            ledger_token_id: "0.0.5000".to_string(),
            ledger_tx_id: "0.0.1001@1700000000.000000001".to_string(),
            memo: Some("water".to_string()),
            status: DistributionStatus::Completed,
            distributed_at: Utc::now(),
        };
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["token_contract_address"], "0.0.5000");
        assert_eq!(value["midnight_tx_hash"], "0.0.1001@1700000000.000000001");
        assert_eq!(value["shielded_memo"], "water");
        assert_eq!(value["status"], "completed");
    }

    #[test]
    fn transaction_types_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(LedgerTxType::TokenCreation).unwrap(),
            "token_creation"
        );
        assert_eq!(
            serde_json::to_value(LedgerTxStatus::Confirmed).unwrap(),
            "confirmed"
        );
    }
}
