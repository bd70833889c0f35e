// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger identifiers, network configuration and operation/receipt types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Network Configuration
// =============================================================================

/// Which Hedera network the service talks to.
///
/// `Sandbox` is the in-process simulated ledger. Nothing submitted to it
/// exists on a public network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LedgerNetworkKind {
    Sandbox,
    Testnet,
    Mainnet,
}

impl LedgerNetworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerNetworkKind::Sandbox => "sandbox",
            LedgerNetworkKind::Testnet => "testnet",
            LedgerNetworkKind::Mainnet => "mainnet",
        }
    }

    pub fn config(&self) -> NetworkConfig {
        match self {
            LedgerNetworkKind::Sandbox => HEDERA_SANDBOX,
            LedgerNetworkKind::Testnet => HEDERA_TESTNET,
            LedgerNetworkKind::Mainnet => HEDERA_MAINNET,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, LedgerNetworkKind::Sandbox)
    }
}

impl FromStr for LedgerNetworkKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(LedgerNetworkKind::Sandbox),
            "testnet" => Ok(LedgerNetworkKind::Testnet),
            "mainnet" => Ok(LedgerNetworkKind::Mainnet),
            other => Err(format!(
                "Unsupported network `{other}` (expected `sandbox`, `testnet` or `mainnet`)"
            )),
        }
    }
}

/// Hedera network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Network selector
    pub kind: LedgerNetworkKind,
    /// Label written into mirrored transaction metadata
    pub label: &'static str,
    /// Mirror node REST endpoint
    pub mirror_node_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Explorer link for a transaction id.
    pub fn transaction_url(&self, transaction_id: &TransactionId) -> String {
        format!("{}/transaction/{}", self.explorer_url, transaction_id)
    }
}

/// Hedera mainnet configuration.
pub const HEDERA_MAINNET: NetworkConfig = NetworkConfig {
    name: "Hedera Mainnet",
    kind: LedgerNetworkKind::Mainnet,
    label: "hedera-mainnet",
    mirror_node_url: "https://mainnet-public.mirrornode.hedera.com",
    explorer_url: "https://hashscan.io/mainnet",
};

/// In-process simulated ledger. Explorer links use a `sandbox://` scheme so
/// they can never be mistaken for HashScan pages.
pub const HEDERA_SANDBOX: NetworkConfig = NetworkConfig {
    name: "Hedera Sandbox (simulated, in-process)",
    kind: LedgerNetworkKind::Sandbox,
    label: "hedera-sandbox",
    mirror_node_url: "in-process",
    explorer_url: "sandbox://hedera",
};

/// Hedera testnet configuration.
pub const HEDERA_TESTNET: NetworkConfig = NetworkConfig {
    name: "Hedera Testnet",
    kind: LedgerNetworkKind::Testnet,
    label: "hedera-testnet",
    mirror_node_url: "https://testnet.mirrornode.hedera.com",
    explorer_url: "https://hashscan.io/testnet",
};

// =============================================================================
// Entity Identifiers
// =============================================================================

/// Parse a `shard.realm.num` entity id into its three components.
pub fn parse_entity_id(raw: &str) -> Result<(u64, u64, u64), String> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(format!("Invalid entity id `{raw}` (expected shard.realm.num)"));
    }

    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u64>()
            .map_err(|_| format!("Invalid entity id `{raw}` (non-numeric component)"))?;
    }

    Ok((nums[0], nums[1], nums[2]))
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Build an id in shard 0, realm 0.
            pub fn from_num(num: u64) -> Self {
                Self(format!("0.0.{num}"))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The entity number (last component).
            pub fn num(&self) -> u64 {
                parse_entity_id(&self.0).map(|(_, _, num)| num).unwrap_or(0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num) = parse_entity_id(raw)?;
                Ok(Self(format!("{shard}.{realm}.{num}")))
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Hedera account id (`0.0.1234`).
    AccountId
);
entity_id!(
    /// Hedera token id (`0.0.5678`).
    TokenId
);
entity_id!(
    /// Hedera consensus topic id (`0.0.9012`).
    TopicId
);

// =============================================================================
// Transaction Identifiers
// =============================================================================

/// Transaction id: payer account plus valid-start timestamp.
///
/// Rendered as `0.0.1234@1700000000.000000123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: DateTime<Utc>,
}

impl TransactionId {
    /// New id for `payer`, valid from now.
    pub fn generate(payer: &AccountId) -> Self {
        Self {
            payer: payer.clone(),
            valid_start: Utc::now(),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.payer,
            self.valid_start.timestamp(),
            self.valid_start.timestamp_subsec_nanos()
        )
    }
}

impl FromStr for TransactionId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (payer, start) = raw
            .split_once('@')
            .ok_or_else(|| format!("Invalid transaction id `{raw}`"))?;
        let (secs, nanos) = start
            .split_once('.')
            .ok_or_else(|| format!("Invalid transaction id `{raw}`"))?;
        let secs: i64 = secs
            .parse()
            .map_err(|_| format!("Invalid transaction id `{raw}`"))?;
        let nanos: u32 = nanos
            .parse()
            .map_err(|_| format!("Invalid transaction id `{raw}`"))?;
        let valid_start = Utc
            .timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| format!("Invalid transaction id `{raw}`"))?;

        Ok(Self {
            payer: payer.parse()?,
            valid_start,
        })
    }
}

impl TryFrom<String> for TransactionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(value: TransactionId) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Token supply model. Only finite supply is issued by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    Finite,
    Infinite,
}

/// One leg of a token transfer. Negative amounts debit, positive credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub account: AccountId,
    pub amount: i64,
}

/// The body of a ledger operation, before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationBody {
    TokenCreate {
        name: String,
        symbol: String,
        decimals: u32,
        initial_supply: u64,
        max_supply: u64,
        supply_type: SupplyType,
        treasury: AccountId,
        freeze_default: bool,
    },
    TokenAssociate {
        account: AccountId,
        tokens: Vec<TokenId>,
    },
    TokenTransfer {
        token: TokenId,
        transfers: Vec<TransferLeg>,
    },
    TopicCreate {
        memo: String,
        admin_key: String,
    },
    TopicMessageSubmit {
        topic: TopicId,
        message: String,
    },
}

/// A frozen, unsigned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedOperation {
    pub transaction_id: TransactionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub body: OperationBody,
}

impl UnsignedOperation {
    /// Canonical bytes that signers sign over.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Public key and signature over [`UnsignedOperation::signing_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// SEC1 compressed secp256k1 public key, hex
    pub public_key: String,
    /// DER-encoded ECDSA signature, hex
    pub signature: String,
}

/// An operation with the signatures collected from the active signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    pub operation: UnsignedOperation,
    pub signatures: Vec<SignaturePair>,
}

// =============================================================================
// Receipts
// =============================================================================

/// Receipt status codes, named after the network's response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Success,
    InvalidTokenId,
    InvalidTopicId,
    InvalidAccountId,
    InvalidTreasuryAccountForToken,
    InvalidTokenInitialSupply,
    InvalidTokenMaxSupply,
    InvalidSignature,
    InsufficientTokenBalance,
    TokenNotAssociatedToAccount,
    TokenAlreadyAssociatedToAccount,
    TransfersNotZeroSumForToken,
    InvalidAccountAmounts,
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ReceiptStatus::Success)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ReceiptStatus::Success => "SUCCESS",
            ReceiptStatus::InvalidTokenId => "INVALID_TOKEN_ID",
            ReceiptStatus::InvalidTopicId => "INVALID_TOPIC_ID",
            ReceiptStatus::InvalidAccountId => "INVALID_ACCOUNT_ID",
            ReceiptStatus::InvalidTreasuryAccountForToken => "INVALID_TREASURY_ACCOUNT_FOR_TOKEN",
            ReceiptStatus::InvalidTokenInitialSupply => "INVALID_TOKEN_INITIAL_SUPPLY",
            ReceiptStatus::InvalidTokenMaxSupply => "INVALID_TOKEN_MAX_SUPPLY",
            ReceiptStatus::InvalidSignature => "INVALID_SIGNATURE",
            ReceiptStatus::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            ReceiptStatus::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            ReceiptStatus::TokenAlreadyAssociatedToAccount => {
                "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT"
            }
            ReceiptStatus::TransfersNotZeroSumForToken => "TRANSFERS_NOT_ZERO_SUM_FOR_TOKEN",
            ReceiptStatus::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
        };
        f.write_str(code)
    }
}

/// Receipt returned once the network reaches consensus on an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub status: ReceiptStatus,
    /// Hex-encoded SHA-384 hash of the signed operation
    pub transaction_hash: String,
    /// Set for successful token creations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    /// Set for successful topic creations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    pub consensus_timestamp: DateTime<Utc>,
}

/// Result of a token creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenCreation {
    pub token_id: TokenId,
    #[schema(value_type = String)]
    pub transaction_id: TransactionId,
    pub explorer_url: String,
}

/// A message on the transparency topic describing a distribution event.
///
/// Write-once: once the network accepts it the entry cannot change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub tx_hash: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}
