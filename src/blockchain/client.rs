// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hedera ledger client for token lifecycle operations.
//!
//! Every write follows the same sequence: build an unsigned operation, have
//! the active signer sign it, submit it and wait for the receipt. The active
//! signer is the operator credential when one is configured, otherwise the
//! wallet bound to the current session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::network::LedgerNetwork;
use super::signing::LocalKey;
use super::types::*;
use crate::bounded::{run_bounded, CallOptions, Interrupted};
use crate::wallet::{SessionSigner, WalletError, WalletSessionManager};

/// Decimals used when the caller does not pass any.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 2;

/// Max supply is this multiple of the initial supply, leaving room to mint.
pub const MAX_SUPPLY_MULTIPLIER: u64 = 10;

/// Memo attached to transfers without one.
pub const DEFAULT_TRANSFER_MEMO: &str = "CrisisChain Aid Distribution";

const OP_CREATE_TOKEN: &str = "Token creation";
const OP_ASSOCIATE: &str = "Token association";
const OP_TRANSFER: &str = "Token transfer";
const OP_CREATE_TOPIC: &str = "Topic creation";
const OP_LOG: &str = "Consensus logging";
const OP_BALANCE: &str = "Balance query";

/// Parameters for [`LedgerClient::create_token`].
#[derive(Debug, Clone)]
pub struct TokenCreationParams {
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    pub decimals: Option<u32>,
    pub treasury: AccountId,
}

/// Parameters for [`LedgerClient::transfer_tokens`].
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub token_id: TokenId,
    pub recipient: AccountId,
    pub amount: u64,
    pub memo: Option<String>,
}

/// Whoever signs and pays for the next operation.
enum ActiveSigner {
    Operator(Arc<LocalKey>),
    Session(SessionSigner),
}

impl ActiveSigner {
    fn account_id(&self) -> &AccountId {
        match self {
            ActiveSigner::Operator(key) => key.account_id(),
            ActiveSigner::Session(signer) => signer.account_id(),
        }
    }

    async fn sign(&self, operation: &UnsignedOperation) -> Result<SignaturePair, String> {
        match self {
            ActiveSigner::Operator(key) => key
                .sign_operation(key.account_id(), operation)
                .map_err(|e| e.to_string()),
            ActiveSigner::Session(signer) => {
                signer.sign(operation).await.map_err(|e| e.to_string())
            }
        }
    }
}

/// Client for one Hedera network.
pub struct LedgerClient {
    network: NetworkConfig,
    transport: Arc<dyn LedgerNetwork>,
    sessions: Arc<WalletSessionManager>,
    operator: Option<Arc<LocalKey>>,
    transparency_topic: Option<TopicId>,
}

impl LedgerClient {
    pub fn new(
        network: NetworkConfig,
        transport: Arc<dyn LedgerNetwork>,
        sessions: Arc<WalletSessionManager>,
    ) -> Self {
        Self {
            network,
            transport,
            sessions,
            operator: None,
            transparency_topic: None,
        }
    }

    /// Sign and pay with a server-side operator key instead of the wallet.
    pub fn with_operator(mut self, operator: LocalKey) -> Self {
        self.operator = Some(Arc::new(operator));
        self
    }

    /// Topic that receives an audit entry after every transfer.
    pub fn with_transparency_topic(mut self, topic: TopicId) -> Self {
        self.transparency_topic = Some(topic);
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn has_operator(&self) -> bool {
        self.operator.is_some()
    }

    pub fn transparency_topic(&self) -> Option<&TopicId> {
        self.transparency_topic.as_ref()
    }

    /// Account that will sign the next operation.
    pub async fn signer_account(&self) -> Result<AccountId, LedgerError> {
        Ok(self.active_signer().await?.account_id().clone())
    }

    /// Create a finite-supply fungible token.
    pub async fn create_token(
        &self,
        params: TokenCreationParams,
        options: &CallOptions,
    ) -> Result<TokenCreation, LedgerError> {
        let max_supply = params
            .total_supply
            .checked_mul(MAX_SUPPLY_MULTIPLIER)
            .ok_or_else(|| LedgerError::InvalidAmount("supply is too large".to_string()))?;

        let body = OperationBody::TokenCreate {
            name: params.name,
            symbol: params.symbol,
            decimals: params.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
            initial_supply: params.total_supply,
            max_supply,
            supply_type: SupplyType::Finite,
            treasury: params.treasury,
            freeze_default: false,
        };

        let receipt = self.execute(OP_CREATE_TOKEN, body, None, options).await?;
        let token_id = receipt
            .token_id
            .ok_or_else(|| LedgerError::operation(OP_CREATE_TOKEN, "receipt carried no token id"))?;

        info!(
            token_id = %token_id,
            transaction_id = %receipt.transaction_id,
            network = self.network.label,
            "Token created"
        );

        Ok(TokenCreation {
            token_id,
            explorer_url: self.network.transaction_url(&receipt.transaction_id),
            transaction_id: receipt.transaction_id,
        })
    }

    /// Associate `token_id` with `account_id` so the account can hold it.
    pub async fn associate_token(
        &self,
        account_id: &AccountId,
        token_id: &TokenId,
        options: &CallOptions,
    ) -> Result<TransactionId, LedgerError> {
        let body = OperationBody::TokenAssociate {
            account: account_id.clone(),
            tokens: vec![token_id.clone()],
        };
        let receipt = self.execute(OP_ASSOCIATE, body, None, options).await?;
        info!(account_id = %account_id, token_id = %token_id, "Token associated");
        Ok(receipt.transaction_id)
    }

    /// Move `amount` of a token from the signer to `recipient`.
    ///
    /// On success an audit entry is appended to the transparency topic. A
    /// failed append is logged and does not fail the transfer.
    pub async fn transfer_tokens(
        &self,
        params: TransferParams,
        options: &CallOptions,
    ) -> Result<TransactionId, LedgerError> {
        let amount = i64::try_from(params.amount)
            .ok()
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                LedgerError::InvalidAmount(format!("cannot transfer {}", params.amount))
            })?;

        let signer = self.active_signer().await?;
        let sender = signer.account_id().clone();
        let memo = params
            .memo
            .clone()
            .unwrap_or_else(|| DEFAULT_TRANSFER_MEMO.to_string());

        let body = OperationBody::TokenTransfer {
            token: params.token_id.clone(),
            transfers: transfer_legs(&sender, &params.recipient, amount),
        };
        let receipt = self
            .execute_with(&signer, OP_TRANSFER, body, Some(memo), options)
            .await?;

        info!(
            token_id = %params.token_id,
            from = %sender,
            to = %params.recipient,
            amount = params.amount,
            transaction_id = %receipt.transaction_id,
            "Tokens transferred"
        );

        self.append_transfer_audit(&params, &receipt, options).await;
        Ok(receipt.transaction_id)
    }

    /// Create the transparency topic. Requires the operator credential,
    /// whose public key becomes the topic admin key.
    pub async fn create_transparency_topic(
        &self,
        memo: &str,
        options: &CallOptions,
    ) -> Result<TopicId, LedgerError> {
        let operator = self
            .operator
            .clone()
            .ok_or(LedgerError::OperatorRequired(OP_CREATE_TOPIC))?;

        let body = OperationBody::TopicCreate {
            memo: memo.to_string(),
            admin_key: operator.public_key_hex(),
        };
        let receipt = self
            .execute_with(&ActiveSigner::Operator(operator), OP_CREATE_TOPIC, body, None, options)
            .await?;
        let topic_id = receipt
            .topic_id
            .ok_or_else(|| LedgerError::operation(OP_CREATE_TOPIC, "receipt carried no topic id"))?;

        info!(topic_id = %topic_id, "Transparency topic created");
        Ok(topic_id)
    }

    /// Append `message` to a consensus topic.
    pub async fn log_to_consensus(
        &self,
        topic_id: &TopicId,
        message: &str,
        options: &CallOptions,
    ) -> Result<TransactionId, LedgerError> {
        let body = OperationBody::TopicMessageSubmit {
            topic: topic_id.clone(),
            message: message.to_string(),
        };
        let receipt = self.execute(OP_LOG, body, None, options).await?;
        Ok(receipt.transaction_id)
    }

    /// Balance of `token_id` held by `account_id`. Always queries the network.
    pub async fn get_token_balance(
        &self,
        account_id: &AccountId,
        token_id: &TokenId,
        options: &CallOptions,
    ) -> Result<u64, LedgerError> {
        run_bounded(options, self.transport.token_balance(account_id, token_id))
            .await?
            .map_err(|e| LedgerError::operation(OP_BALANCE, e))
    }

    async fn active_signer(&self) -> Result<ActiveSigner, LedgerError> {
        if let Some(operator) = &self.operator {
            return Ok(ActiveSigner::Operator(operator.clone()));
        }
        match self.sessions.signer().await {
            Ok(signer) => Ok(ActiveSigner::Session(signer)),
            Err(WalletError::NotConnected) => Err(LedgerError::NotConnected),
            Err(e) => Err(LedgerError::operation("Signer lookup", e)),
        }
    }

    async fn execute(
        &self,
        op: &'static str,
        body: OperationBody,
        memo: Option<String>,
        options: &CallOptions,
    ) -> Result<TransactionReceipt, LedgerError> {
        let signer = self.active_signer().await?;
        self.execute_with(&signer, op, body, memo, options).await
    }

    async fn execute_with(
        &self,
        signer: &ActiveSigner,
        op: &'static str,
        body: OperationBody,
        memo: Option<String>,
        options: &CallOptions,
    ) -> Result<TransactionReceipt, LedgerError> {
        let operation = UnsignedOperation {
            transaction_id: TransactionId::generate(signer.account_id()),
            memo,
            body,
        };

        let signature = run_bounded(options, signer.sign(&operation))
            .await?
            .map_err(|cause| LedgerError::operation(op, cause))?;

        // A session swapped out while the wallet was signing must not submit.
        if let ActiveSigner::Session(session) = signer {
            if !self.sessions.is_current(session.session_id()).await {
                warn!(op, "Wallet session changed while signing, dropping operation");
                return Err(LedgerError::NotConnected);
            }
        }

        let signed = SignedOperation {
            operation,
            signatures: vec![signature],
        };
        let receipt = run_bounded(options, self.transport.submit(signed))
            .await?
            .map_err(|e| LedgerError::operation(op, e))?;

        if !receipt.status.is_success() {
            warn!(op, status = %receipt.status, transaction_id = %receipt.transaction_id, "Operation rejected");
            return Err(LedgerError::operation(op, receipt.status));
        }
        Ok(receipt)
    }

    async fn append_transfer_audit(
        &self,
        params: &TransferParams,
        receipt: &TransactionReceipt,
        options: &CallOptions,
    ) {
        let Some(topic) = &self.transparency_topic else {
            return;
        };

        let entry = AuditLogEntry {
            tx_hash: receipt.transaction_hash.clone(),
            entry_type: "token_transfer".to_string(),
            amount: params.amount,
            timestamp: Utc::now(),
            metadata: json!({
                "tokenId": params.token_id,
                "recipientId": params.recipient,
                "transactionId": receipt.transaction_id.to_string(),
                "memo": params.memo,
            }),
        };

        let message = match serde_json::to_string(&entry) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to encode audit entry");
                return;
            }
        };

        if let Err(e) = self.log_to_consensus(topic, &message, options).await {
            warn!(
                topic_id = %topic,
                transaction_id = %receipt.transaction_id,
                error = %e,
                "Audit log append failed; transfer stands"
            );
        }
    }
}

/// Balanced two-leg transfer: `-amount` from `sender`, `+amount` to `recipient`.
pub fn transfer_legs(sender: &AccountId, recipient: &AccountId, amount: i64) -> Vec<TransferLeg> {
    vec![
        TransferLeg {
            account: sender.clone(),
            amount: -amount,
        },
        TransferLeg {
            account: recipient.clone(),
            amount,
        },
    ]
}

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("No wallet connected")]
    NotConnected,

    /// SDK, network or receipt failure; `cause` is preserved verbatim.
    #[error("{op} failed: {cause}")]
    Operation { op: &'static str, cause: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0} requires an operator credential")]
    OperatorRequired(&'static str),

    #[error("Ledger call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ledger call cancelled")]
    Cancelled,
}

impl LedgerError {
    fn operation(op: &'static str, cause: impl ToString) -> Self {
        LedgerError::Operation {
            op,
            cause: cause.to_string(),
        }
    }
}

impl From<Interrupted> for LedgerError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut(after) => LedgerError::Timeout(after),
            Interrupted::Cancelled => LedgerError::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::signing::tests::{OTHER_KEY_HEX, TEST_KEY_HEX};
    use crate::blockchain::SimulatedLedger;
    use crate::wallet::{ExtensionSlot, KeyedExtension, WalletRegistry};

    const TREASURY: u64 = 1001;
    const RECIPIENT: u64 = 2002;

    struct Fixture {
        ledger: Arc<SimulatedLedger>,
        sessions: Arc<WalletSessionManager>,
        client: LedgerClient,
    }

    fn treasury_key() -> LocalKey {
        LocalKey::from_hex(AccountId::from_num(TREASURY), TEST_KEY_HEX).unwrap()
    }

    fn recipient_key() -> LocalKey {
        LocalKey::from_hex(AccountId::from_num(RECIPIENT), OTHER_KEY_HEX).unwrap()
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(SimulatedLedger::new());
        ledger.register_account(AccountId::from_num(TREASURY), treasury_key().public_key_hex());
        ledger.register_account(AccountId::from_num(RECIPIENT), recipient_key().public_key_hex());

        let hashpack = ExtensionSlot::with(Arc::new(KeyedExtension::new(treasury_key())));
        let blade = ExtensionSlot::with(Arc::new(KeyedExtension::new(recipient_key())));
        let sessions = Arc::new(WalletSessionManager::new(Arc::new(
            WalletRegistry::with_slots(hashpack, blade),
        )));
        let client = LedgerClient::new(HEDERA_SANDBOX, ledger.clone(), sessions.clone());

        Fixture {
            ledger,
            sessions,
            client,
        }
    }

    fn token_params(supply: u64) -> TokenCreationParams {
        TokenCreationParams {
            name: "Aid".to_string(),
            symbol: "AIDX".to_string(),
            total_supply: supply,
            decimals: None,
            treasury: AccountId::from_num(TREASURY),
        }
    }

    async fn connect(f: &Fixture, wallet: &str) {
        f.sessions
            .connect(wallet, &CallOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn operations_without_session_fail_not_connected() {
        let f = fixture();
        let err = f
            .client
            .create_token(token_params(1000), &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotConnected));
        assert_eq!(f.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn created_token_is_held_by_treasury() {
        let f = fixture();
        connect(&f, "HashPack").await;
        let options = CallOptions::default();

        let created = f
            .client
            .create_token(token_params(1000), &options)
            .await
            .unwrap();
        assert!(!created.token_id.as_str().is_empty());
        assert!(!created.transaction_id.to_string().is_empty());
        assert!(created.explorer_url.starts_with("sandbox://hedera/transaction/"));

        let balance = f
            .client
            .get_token_balance(&AccountId::from_num(TREASURY), &created.token_id, &options)
            .await
            .unwrap();
        assert_eq!(balance, 1000);
        assert_eq!(f.ledger.total_supply(&created.token_id), Some(1000));
    }

    #[tokio::test]
    async fn transfer_requires_association_then_balances_move() {
        let f = fixture();
        let options = CallOptions::default();

        connect(&f, "HashPack").await;
        let token = f
            .client
            .create_token(token_params(1000), &options)
            .await
            .unwrap()
            .token_id;

        let transfer = TransferParams {
            token_id: token.clone(),
            recipient: AccountId::from_num(RECIPIENT),
            amount: 50,
            memo: None,
        };
        let err = f
            .client
            .transfer_tokens(transfer.clone(), &options)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Token transfer failed: TOKEN_NOT_ASSOCIATED_TO_ACCOUNT"
        );

        f.sessions
            .replace_session("Blade", &options)
            .await
            .unwrap();
        f.client
            .associate_token(&AccountId::from_num(RECIPIENT), &token, &options)
            .await
            .unwrap();

        f.sessions
            .replace_session("HashPack", &options)
            .await
            .unwrap();
        f.client.transfer_tokens(transfer, &options).await.unwrap();

        let treasury = f
            .client
            .get_token_balance(&AccountId::from_num(TREASURY), &token, &options)
            .await
            .unwrap();
        let recipient = f
            .client
            .get_token_balance(&AccountId::from_num(RECIPIENT), &token, &options)
            .await
            .unwrap();
        assert_eq!((treasury, recipient), (950, 50));
    }

    #[test]
    fn transfer_legs_sum_to_zero() {
        let legs = transfer_legs(&AccountId::from_num(1), &AccountId::from_num(2), 75);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].amount, -75);
        assert_eq!(legs[1].amount, 75);
        assert_eq!(legs.iter().map(|leg| leg.amount).sum::<i64>(), 0);
    }

    #[tokio::test]
    async fn zero_amount_transfer_is_refused_before_submission() {
        let f = fixture();
        connect(&f, "HashPack").await;
        let err = f
            .client
            .transfer_tokens(
                TransferParams {
                    token_id: TokenId::from_num(5000),
                    recipient: AccountId::from_num(RECIPIENT),
                    amount: 0,
                    memo: None,
                },
                &CallOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(f.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn transfer_appends_audit_entry_to_topic() {
        let f = fixture();
        let options = CallOptions::default();
        let operator_client = LedgerClient::new(HEDERA_SANDBOX, f.ledger.clone(), f.sessions.clone())
            .with_operator(treasury_key());
        let topic = operator_client
            .create_transparency_topic("CrisisChain transparency log", &options)
            .await
            .unwrap();
        assert_eq!(
            f.ledger.topic_memo(&topic).as_deref(),
            Some("CrisisChain transparency log")
        );

        let client = operator_client.with_transparency_topic(topic.clone());
        let token = client
            .create_token(token_params(500), &options)
            .await
            .unwrap()
            .token_id;

        f.sessions.connect("Blade", &options).await.unwrap();
        LedgerClient::new(HEDERA_SANDBOX, f.ledger.clone(), f.sessions.clone())
            .associate_token(&AccountId::from_num(RECIPIENT), &token, &options)
            .await
            .unwrap();

        client
            .transfer_tokens(
                TransferParams {
                    token_id: token.clone(),
                    recipient: AccountId::from_num(RECIPIENT),
                    amount: 20,
                    memo: Some("Food Aid Distribution".to_string()),
                },
                &options,
            )
            .await
            .unwrap();

        let messages = f.ledger.topic_messages(&topic);
        assert_eq!(messages.len(), 1);
        let entry: AuditLogEntry = serde_json::from_str(&messages[0].contents).unwrap();
        assert_eq!(entry.entry_type, "token_transfer");
        assert_eq!(entry.amount, 20);
        assert_eq!(entry.metadata["tokenId"], token.as_str());
        assert_eq!(entry.tx_hash.len(), 96);
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_transfer() {
        let f = fixture();
        let options = CallOptions::default();
        connect(&f, "HashPack").await;
        let token = f
            .client
            .create_token(token_params(100), &options)
            .await
            .unwrap()
            .token_id;

        // Treasury self-transfer is a valid zero-net move; the topic does not exist.
        let client = LedgerClient::new(HEDERA_SANDBOX, f.ledger.clone(), f.sessions.clone())
            .with_transparency_topic(TopicId::from_num(999_999));
        let tx = client
            .transfer_tokens(
                TransferParams {
                    token_id: token.clone(),
                    recipient: AccountId::from_num(TREASURY),
                    amount: 10,
                    memo: None,
                },
                &options,
            )
            .await;
        assert!(tx.is_ok());
    }

    #[tokio::test]
    async fn topic_creation_requires_operator() {
        let f = fixture();
        connect(&f, "HashPack").await;
        let err = f
            .client
            .create_transparency_topic("log", &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::OperatorRequired(_)));
    }

    #[tokio::test]
    async fn operator_signs_without_session() {
        let f = fixture();
        let client = LedgerClient::new(HEDERA_SANDBOX, f.ledger.clone(), f.sessions.clone())
            .with_operator(treasury_key());

        assert!(client.has_operator());
        assert_eq!(
            client.signer_account().await.unwrap(),
            AccountId::from_num(TREASURY)
        );
        client
            .create_token(token_params(10), &CallOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn slow_network_times_out() {
        let f = fixture();
        connect(&f, "HashPack").await;
        f.ledger.set_latency(Duration::from_millis(200));

        let err = f
            .client
            .create_token(token_params(10), &CallOptions::new(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Timeout(_)));
    }

    #[tokio::test]
    async fn cancelled_call_is_not_submitted() {
        let f = fixture();
        connect(&f, "HashPack").await;
        let options = CallOptions::default();
        options.cancel.cancel();

        let err = f
            .client
            .create_token(token_params(10), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled));
        assert_eq!(f.ledger.submission_count(), 0);
    }
}
