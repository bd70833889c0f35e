// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aid distribution orchestration.
//!
//! Each write hook runs its side effects in a fixed order:
//!
//! 1. ledger operation (abort here on failure, nothing is mirrored)
//! 2. mirror-store rows
//! 3. listing cache invalidation
//! 4. user notification
//!
//! A mirror failure after a confirmed ledger operation is not rolled back.
//! It is returned as [`DistributionError::MirrorWrite`] carrying the ledger
//! transaction id and logged at error level so the gap can be found later.

pub mod notify;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info};

use crate::blockchain::{
    AccountId, LedgerClient, LedgerError, TokenCreationParams, TokenId, TransferParams,
};
use crate::bounded::CallOptions;
use crate::models::{
    CreateDistributionRequest, CreateTokenRequest, CreatedToken, IssueAidTokenRequest,
};
use crate::storage::{
    AidTokenRecord, DistributionRecord, DistributionStatus,
    LedgerTxStatus, LedgerTxType, ListingCache, MirrorError, MirrorStore, NewAidToken,
    NewDistribution, NewLedgerTransaction, NewToken, TokenRecord,
};
use crate::wallet::{WalletError, WalletProvider, WalletSessionManager};

pub use notify::{Notification, NotificationLevel, Notifier};

const LISTING_CACHE_CAPACITY: usize = 256;
const LISTING_CACHE_TTL: Duration = Duration::from_secs(30);
const ACTIVE_TOKENS_SCOPE: &str = "active";

/// Errors surfaced by the orchestration hooks.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("{0}")]
    Validation(String),

    #[error("No active tokens found. Please create a token first.")]
    NoActiveToken,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// The ledger operation is confirmed but its mirror row was not written.
    #[error("Ledger transaction {ledger_tx_id} confirmed but not recorded: {source}")]
    MirrorWrite {
        ledger_tx_id: String,
        source: MirrorError,
    },
}

/// Composes the ledger client with the mirror store.
pub struct DistributionService {
    ledger: Arc<LedgerClient>,
    sessions: Arc<WalletSessionManager>,
    mirror: Arc<dyn MirrorStore>,
    notifier: Arc<Notifier>,
    tokens_cache: ListingCache<TokenRecord>,
    aid_cache: ListingCache<AidTokenRecord>,
    distributions_cache: ListingCache<DistributionRecord>,
}

impl DistributionService {
    pub fn new(
        ledger: Arc<LedgerClient>,
        sessions: Arc<WalletSessionManager>,
        mirror: Arc<dyn MirrorStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            ledger,
            sessions,
            mirror,
            notifier,
            tokens_cache: ListingCache::new(LISTING_CACHE_CAPACITY, LISTING_CACHE_TTL),
            aid_cache: ListingCache::new(LISTING_CACHE_CAPACITY, LISTING_CACHE_TTL),
            distributions_cache: ListingCache::new(LISTING_CACHE_CAPACITY, LISTING_CACHE_TTL),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // =========================================================================
    // Write hooks
    // =========================================================================

    /// Transfer aid from the active token to a recipient and mirror it.
    pub async fn issue_aid_token(
        &self,
        actor: &str,
        request: IssueAidTokenRequest,
        options: &CallOptions,
    ) -> Result<AidTokenRecord, DistributionError> {
        debug!(actor, "Issuing aid token");
        let result = self.issue_aid_token_inner(request, options).await;
        self.report(
            &result,
            "Failed to create aid token",
            "Aid tokens distributed on Hedera",
            |_| "Transaction confirmed and logged on HCS".to_string(),
        );
        result
    }

    /// Execute a distribution against an aid request and mirror it.
    pub async fn create_distribution(
        &self,
        actor: &str,
        request: CreateDistributionRequest,
        options: &CallOptions,
    ) -> Result<DistributionRecord, DistributionError> {
        debug!(actor, "Creating distribution");
        let result = self.create_distribution_inner(actor, request, options).await;
        self.report(
            &result,
            "Failed to execute distribution",
            "Distribution executed on Hedera",
            |_| "Transparent and logged on Hedera Consensus Service".to_string(),
        );
        result
    }

    /// Create a token with the connected account as treasury and mirror it.
    pub async fn create_token(
        &self,
        actor: &str,
        request: CreateTokenRequest,
        options: &CallOptions,
    ) -> Result<CreatedToken, DistributionError> {
        debug!(actor, "Creating token");
        let result = self.create_token_inner(actor, request, options).await;
        self.report(
            &result,
            "Failed to create token",
            "Token created on Hedera",
            |created| {
                format!(
                    "{} ({}) is now live on Hedera network",
                    created.token.name, created.token.symbol
                )
            },
        );
        result
    }

    // =========================================================================
    // Read hooks
    // =========================================================================

    /// Active tokens, newest first.
    pub async fn list_active_tokens(&self) -> Result<Vec<TokenRecord>, DistributionError> {
        if let Some(rows) = self.tokens_cache.get(ACTIVE_TOKENS_SCOPE) {
            return Ok(rows);
        }
        let rows = self.mirror.list_active_tokens().await?;
        self.tokens_cache.put(ACTIVE_TOKENS_SCOPE, rows.clone());
        Ok(rows)
    }

    /// Aid issued to `recipient_id`, newest first.
    pub async fn list_aid_tokens(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<AidTokenRecord>, DistributionError> {
        if let Some(rows) = self.aid_cache.get(recipient_id) {
            return Ok(rows);
        }
        let rows = self.mirror.list_aid_tokens(recipient_id).await?;
        self.aid_cache.put(recipient_id, rows.clone());
        Ok(rows)
    }

    /// Distributions where `user_id` distributed or received, newest first.
    pub async fn list_distributions(
        &self,
        user_id: &str,
    ) -> Result<Vec<DistributionRecord>, DistributionError> {
        if let Some(rows) = self.distributions_cache.get(user_id) {
            return Ok(rows);
        }
        let rows = self.mirror.list_distributions(user_id).await?;
        self.distributions_cache.put(user_id, rows.clone());
        Ok(rows)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn issue_aid_token_inner(
        &self,
        request: IssueAidTokenRequest,
        options: &CallOptions,
    ) -> Result<AidTokenRecord, DistributionError> {
        let (Some(recipient), Some(amount), Some(token_type)) = (
            non_empty(request.recipient_id),
            request.amount.filter(|amount| *amount > 0),
            non_empty(request.token_type),
        ) else {
            return Err(DistributionError::Validation(
                "Recipient ID, amount, and token type are required".to_string(),
            ));
        };
        let recipient = parse_account(&recipient)?;

        let token_id = self.active_token_id().await?;
        self.ensure_session(request.wallet_provider, options).await?;
        let sender = self.ledger.signer_account().await?;

        let tx_id = self
            .ledger
            .transfer_tokens(
                TransferParams {
                    token_id: token_id.clone(),
                    recipient: recipient.clone(),
                    amount,
                    memo: Some(format!("{token_type} Aid Distribution")),
                },
                options,
            )
            .await?
            .to_string();

        let aid_token_id = format!("AID_{}", Utc::now().timestamp_millis());
        let record = self
            .mirror
            .insert_aid_token(NewAidToken {
                recipient_id: recipient.to_string(),
                token_id: aid_token_id.clone(),
                amount,
                token_type: token_type.clone(),
                ledger_token_id: token_id.to_string(),
                ledger_tx_id: tx_id.clone(),
                restrictions: request.restrictions,
                expires_at: request.expires_at,
                is_active: true,
                used_amount: 0,
            })
            .await
            .map_err(|source| drift(&tx_id, source))?;

        self.aid_cache.invalidate(recipient.as_str());
        self.mirror_transaction(NewLedgerTransaction {
            tx_hash: tx_id.clone(),
            tx_type: LedgerTxType::TokenTransfer,
            from_address: Some(sender.to_string()),
            to_address: Some(recipient.to_string()),
            amount,
            shielded: false,
            status: LedgerTxStatus::Confirmed,
            metadata: json!({
                "token_type": token_type,
                "token_id": token_id,
                "aid_token_id": aid_token_id,
                "network": self.ledger.network().label,
            }),
        })
        .await;

        info!(aid_token_id = %record.token_id, transaction_id = %tx_id, "Aid token issued");
        Ok(record)
    }

    async fn create_distribution_inner(
        &self,
        actor: &str,
        request: CreateDistributionRequest,
        options: &CallOptions,
    ) -> Result<DistributionRecord, DistributionError> {
        let (Some(aid_request_id), Some(recipient), Some(amount)) = (
            non_empty(request.aid_request_id),
            non_empty(request.recipient_id),
            request.amount.filter(|amount| *amount > 0),
        ) else {
            return Err(DistributionError::Validation(
                "Aid request ID, recipient ID, and amount are required".to_string(),
            ));
        };
        let recipient = parse_account(&recipient)?;

        let token_id = self.active_token_id().await?;
        self.ensure_session(request.wallet_provider, options).await?;
        let sender = self.ledger.signer_account().await?;

        let tx_id = self
            .ledger
            .transfer_tokens(
                TransferParams {
                    token_id: token_id.clone(),
                    recipient: recipient.clone(),
                    amount,
                    memo: request.memo.clone(),
                },
                options,
            )
            .await?
            .to_string();

        let record = self
            .mirror
            .insert_distribution(NewDistribution {
                aid_request_id: aid_request_id.clone(),
                distributor_id: actor.to_string(),
                recipient_id: recipient.to_string(),
                amount,
                ledger_token_id: token_id.to_string(),
                ledger_tx_id: tx_id.clone(),
                memo: request.memo,
                status: DistributionStatus::Completed,
                distributed_at: Utc::now(),
            })
            .await
            .map_err(|source| drift(&tx_id, source))?;

        self.distributions_cache.invalidate_all();
        self.mirror_transaction(NewLedgerTransaction {
            tx_hash: tx_id.clone(),
            tx_type: LedgerTxType::Distribution,
            from_address: Some(sender.to_string()),
            to_address: Some(recipient.to_string()),
            amount,
            shielded: false,
            status: LedgerTxStatus::Confirmed,
            metadata: json!({
                "token_id": token_id,
                "aid_request_id": aid_request_id,
                "network": self.ledger.network().label,
            }),
        })
        .await;

        info!(distribution_id = %record.id, transaction_id = %tx_id, "Distribution recorded");
        Ok(record)
    }

    async fn create_token_inner(
        &self,
        actor: &str,
        request: CreateTokenRequest,
        options: &CallOptions,
    ) -> Result<CreatedToken, DistributionError> {
        let (Some(name), Some(symbol), Some(supply)) = (
            non_empty(request.name),
            non_empty(request.symbol),
            request.supply.filter(|supply| *supply > 0),
        ) else {
            return Err(DistributionError::Validation(
                "Name, symbol, and supply are required".to_string(),
            ));
        };

        self.ensure_session(request.wallet_provider, options).await?;
        let treasury = self.ledger.signer_account().await?;

        let created = self
            .ledger
            .create_token(
                TokenCreationParams {
                    name: name.clone(),
                    symbol: symbol.clone(),
                    total_supply: supply,
                    decimals: request.decimals,
                    treasury: treasury.clone(),
                },
                options,
            )
            .await?;
        let tx_id = created.transaction_id.to_string();

        let record = self
            .mirror
            .insert_token(NewToken {
                creator_id: actor.to_string(),
                name: name.clone(),
                symbol: symbol.clone(),
                supply,
                ledger_token_id: created.token_id.to_string(),
                ledger_tx_id: tx_id.clone(),
                is_active: true,
            })
            .await
            .map_err(|source| drift(&tx_id, source))?;

        self.tokens_cache.invalidate_all();
        self.mirror_transaction(NewLedgerTransaction {
            tx_hash: tx_id.clone(),
            tx_type: LedgerTxType::TokenCreation,
            from_address: Some(treasury.to_string()),
            to_address: None,
            amount: supply,
            shielded: false,
            status: LedgerTxStatus::Confirmed,
            metadata: json!({
                "token_id": created.token_id,
                "token_name": name,
                "token_symbol": symbol,
                "network": self.ledger.network().label,
            }),
        })
        .await;

        Ok(CreatedToken {
            token: record,
            explorer_url: created.explorer_url,
        })
    }

    /// Ledger id of the newest active token in the mirror store.
    async fn active_token_id(&self) -> Result<TokenId, DistributionError> {
        let token = self
            .mirror
            .active_token()
            .await?
            .ok_or(DistributionError::NoActiveToken)?;

        token
            .ledger_token_id
            .as_deref()
            .ok_or(DistributionError::NoActiveToken)?
            .parse()
            .map_err(|e: String| {
                DistributionError::Mirror(MirrorError::InvalidResponse(format!(
                    "active token {} has an invalid ledger id: {e}",
                    token.id
                )))
            })
    }

    /// Connect `provider` when nothing can sign yet.
    async fn ensure_session(
        &self,
        provider: Option<WalletProvider>,
        options: &CallOptions,
    ) -> Result<(), DistributionError> {
        if self.ledger.has_operator() || self.sessions.is_connected().await {
            return Ok(());
        }
        let provider = provider.ok_or_else(|| {
            DistributionError::Validation(
                "wallet_provider is required when no wallet is connected".to_string(),
            )
        })?;
        self.sessions.connect(provider.key(), options).await?;
        Ok(())
    }

    /// Record the audit row for a confirmed operation. The primary row is
    /// already stored, so a failure here is logged drift, not a failed call.
    async fn mirror_transaction(&self, transaction: NewLedgerTransaction) {
        let tx_id = transaction.tx_hash.clone();
        if let Err(source) = self.mirror.insert_transaction(transaction).await {
            error!(
                ledger_tx_id = %tx_id,
                error = %source,
                "Ledger transaction row not mirrored; audit log has drifted"
            );
        }
    }

    fn report<T>(
        &self,
        result: &Result<T, DistributionError>,
        failure_title: &str,
        success_title: &str,
        describe: impl FnOnce(&T) -> String,
    ) {
        let notification = match result {
            Ok(value) => Notification::success(success_title, describe(value)),
            Err(e) => Notification::error(failure_title, e.to_string()),
        };
        self.notifier.notify(notification);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_account(raw: &str) -> Result<AccountId, DistributionError> {
    raw.parse()
        .map_err(|e: String| DistributionError::Validation(format!("Invalid recipient ID: {e}")))
}

/// Log and wrap a mirror failure that followed a confirmed ledger operation.
fn drift(ledger_tx_id: &str, source: MirrorError) -> DistributionError {
    error!(
        ledger_tx_id,
        error = %source,
        "Ledger operation confirmed but mirror write failed; records have drifted"
    );
    DistributionError::MirrorWrite {
        ledger_tx_id: ledger_tx_id.to_string(),
        source,
    }
}
