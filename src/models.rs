// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies used by the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for JSON handling and
//! OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Session**: wallet connection requests
//! - **Tokens**: fungible token creation
//! - **Aid tokens**: aid issued to a recipient
//! - **Distributions**: distributions against aid requests
//!
//! Required fields of the orchestration requests are optional at the JSON
//! level so that a missing field is reported as a validation error with a
//! readable message instead of a deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::TokenRecord;
use crate::wallet::{WalletDescriptor, WalletProvider};

// =============================================================================
// Session Models
// =============================================================================

/// Connect (or replace) the wallet session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Wallet display name or provider key (`HashPack`, `blade`, ...)
    pub wallet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletDescriptor>,
}

// =============================================================================
// Token Models
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTokenRequest {
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// Initial supply in the token's smallest unit
    pub supply: Option<u64>,
    /// Defaults to 2
    pub decimals: Option<u32>,
    pub wallet_provider: Option<WalletProvider>,
}

/// A token created on the ledger and mirrored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedToken {
    pub token: TokenRecord,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalanceResponse {
    pub account_id: String,
    pub token_id: String,
    pub balance: u64,
}

// =============================================================================
// Aid Token Models
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IssueAidTokenRequest {
    /// Ledger account of the recipient (`0.0.N`)
    pub recipient_id: Option<String>,
    pub amount: Option<u64>,
    /// Kind of aid (`food`, `water`, `medical`, ...)
    pub token_type: Option<String>,
    pub wallet_provider: Option<WalletProvider>,
    #[schema(value_type = Option<Object>)]
    pub restrictions: Option<serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Distribution Models
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateDistributionRequest {
    pub aid_request_id: Option<String>,
    /// Ledger account of the recipient (`0.0.N`)
    pub recipient_id: Option<String>,
    pub amount: Option<u64>,
    pub memo: Option<String>,
    pub wallet_provider: Option<WalletProvider>,
}
