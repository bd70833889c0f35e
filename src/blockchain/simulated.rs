// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process ledger used as a test double and for local sandbox runs.
//!
//! **Not a network integration.** It applies the subset of Hedera token and
//! consensus semantics this service relies on: signature checks against
//! registered account keys, token association, zero-sum transfers,
//! finite supply limits and append-only topics.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha384};

use super::network::{LedgerNetwork, NetworkError};
use super::signing::verify_signature;
use super::types::{
    AccountId, OperationBody, ReceiptStatus, SignedOperation, SupplyType, TokenId, TopicId,
    TransactionReceipt, TransferLeg,
};

/// First entity number handed out to tokens and topics.
const FIRST_ENTITY_NUM: u64 = 5000;

#[derive(Debug, Clone)]
struct TokenState {
    total_supply: u64,
}

/// A message accepted on a consensus topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub sequence_number: u64,
    pub contents: String,
    pub consensus_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TopicState {
    memo: String,
    messages: Vec<TopicMessage>,
}

#[derive(Debug, Default)]
struct LedgerState {
    next_entity: u64,
    accounts: HashMap<AccountId, String>,
    tokens: HashMap<TokenId, TokenState>,
    balances: HashMap<(AccountId, TokenId), u64>,
    associations: HashSet<(AccountId, TokenId)>,
    topics: HashMap<TopicId, TopicState>,
    seen_transactions: HashSet<String>,
}

impl LedgerState {
    fn allocate(&mut self) -> u64 {
        let num = self.next_entity;
        self.next_entity += 1;
        num
    }
}

/// Outcome of applying an operation body.
struct Applied {
    status: ReceiptStatus,
    token_id: Option<TokenId>,
    topic_id: Option<TopicId>,
}

impl Applied {
    fn status(status: ReceiptStatus) -> Self {
        Self {
            status,
            token_id: None,
            topic_id: None,
        }
    }
}

/// Simulated ledger network.
#[derive(Debug)]
pub struct SimulatedLedger {
    state: Mutex<LedgerState>,
    latency: Mutex<Duration>,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_entity: FIRST_ENTITY_NUM,
                ..LedgerState::default()
            }),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Register an account and the public key that signs for it.
    pub fn register_account(&self, account: AccountId, public_key_hex: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.accounts.insert(account, public_key_hex.into());
        }
    }

    /// Delay every submission, to exercise deadlines.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Messages accepted on a topic, oldest first.
    pub fn topic_messages(&self, topic: &TopicId) -> Vec<TopicMessage> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.topics.get(topic).map(|t| t.messages.clone()))
            .unwrap_or_default()
    }

    /// Memo of a topic, if it exists.
    pub fn topic_memo(&self, topic: &TopicId) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.topics.get(topic).map(|t| t.memo.clone()))
    }

    /// Total supply of a token, if it exists.
    pub fn total_supply(&self, token: &TokenId) -> Option<u64> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tokens.get(token).map(|t| t.total_supply))
    }

    /// Number of operations the ledger has accepted (any receipt status).
    pub fn submission_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.seen_transactions.len())
            .unwrap_or(0)
    }

    fn precheck(state: &LedgerState, signed: &SignedOperation) -> Result<AccountId, NetworkError> {
        let payer = &signed.operation.transaction_id.payer;
        let registered_key = state
            .accounts
            .get(payer)
            .ok_or_else(|| NetworkError::Rejected("PAYER_ACCOUNT_NOT_FOUND".to_string()))?;

        let bytes = signed
            .operation
            .signing_bytes()
            .map_err(|e| NetworkError::Rejected(format!("INVALID_TRANSACTION_BODY: {e}")))?;

        let payer_signed = signed.signatures.iter().any(|pair| {
            &pair.public_key == registered_key && verify_signature(pair, &bytes).is_ok()
        });
        if !payer_signed {
            return Err(NetworkError::Rejected("INVALID_SIGNATURE".to_string()));
        }

        let tx_key = signed.operation.transaction_id.to_string();
        if state.seen_transactions.contains(&tx_key) {
            return Err(NetworkError::Rejected("DUPLICATE_TRANSACTION".to_string()));
        }

        Ok(payer.clone())
    }

    fn apply(state: &mut LedgerState, payer: &AccountId, body: &OperationBody) -> Applied {
        match body {
            OperationBody::TokenCreate {
                initial_supply,
                max_supply,
                supply_type,
                treasury,
                ..
            } => {
                if !state.accounts.contains_key(treasury) {
                    return Applied::status(ReceiptStatus::InvalidTreasuryAccountForToken);
                }
                if treasury != payer {
                    return Applied::status(ReceiptStatus::InvalidSignature);
                }
                if *supply_type == SupplyType::Finite && *max_supply == 0 {
                    return Applied::status(ReceiptStatus::InvalidTokenMaxSupply);
                }
                if *supply_type == SupplyType::Finite && initial_supply > max_supply {
                    return Applied::status(ReceiptStatus::InvalidTokenInitialSupply);
                }

                let token = TokenId::from_num(state.allocate());
                state.tokens.insert(
                    token.clone(),
                    TokenState {
                        total_supply: *initial_supply,
                    },
                );
                state
                    .associations
                    .insert((treasury.clone(), token.clone()));
                state
                    .balances
                    .insert((treasury.clone(), token.clone()), *initial_supply);

                Applied {
                    status: ReceiptStatus::Success,
                    token_id: Some(token),
                    topic_id: None,
                }
            }
            OperationBody::TokenAssociate { account, tokens } => {
                if !state.accounts.contains_key(account) {
                    return Applied::status(ReceiptStatus::InvalidAccountId);
                }
                if account != payer {
                    return Applied::status(ReceiptStatus::InvalidSignature);
                }
                for token in tokens {
                    if !state.tokens.contains_key(token) {
                        return Applied::status(ReceiptStatus::InvalidTokenId);
                    }
                    if state.associations.contains(&(account.clone(), token.clone())) {
                        return Applied::status(ReceiptStatus::TokenAlreadyAssociatedToAccount);
                    }
                }
                for token in tokens {
                    state.associations.insert((account.clone(), token.clone()));
                }
                Applied::status(ReceiptStatus::Success)
            }
            OperationBody::TokenTransfer { token, transfers } => {
                Applied::status(Self::apply_transfer(state, payer, token, transfers))
            }
            OperationBody::TopicCreate { memo, .. } => {
                let topic = TopicId::from_num(state.allocate());
                state.topics.insert(
                    topic.clone(),
                    TopicState {
                        memo: memo.clone(),
                        messages: Vec::new(),
                    },
                );
                Applied {
                    status: ReceiptStatus::Success,
                    token_id: None,
                    topic_id: Some(topic),
                }
            }
            OperationBody::TopicMessageSubmit { topic, message } => {
                let Some(state_topic) = state.topics.get_mut(topic) else {
                    return Applied::status(ReceiptStatus::InvalidTopicId);
                };
                let sequence_number = state_topic.messages.len() as u64 + 1;
                state_topic.messages.push(TopicMessage {
                    sequence_number,
                    contents: message.clone(),
                    consensus_timestamp: Utc::now(),
                });
                Applied::status(ReceiptStatus::Success)
            }
        }
    }

    fn apply_transfer(
        state: &mut LedgerState,
        payer: &AccountId,
        token: &TokenId,
        transfers: &[TransferLeg],
    ) -> ReceiptStatus {
        if !state.tokens.contains_key(token) {
            return ReceiptStatus::InvalidTokenId;
        }
        if transfers.iter().any(|leg| leg.amount == 0) {
            return ReceiptStatus::InvalidAccountAmounts;
        }
        if transfers.iter().map(|leg| leg.amount as i128).sum::<i128>() != 0 {
            return ReceiptStatus::TransfersNotZeroSumForToken;
        }

        // Net each account's legs so repeated debits are checked together.
        let mut net: HashMap<&AccountId, i128> = HashMap::new();
        for leg in transfers {
            if !state.accounts.contains_key(&leg.account) {
                return ReceiptStatus::InvalidAccountId;
            }
            if leg.amount < 0 && &leg.account != payer {
                return ReceiptStatus::InvalidSignature;
            }
            if !state
                .associations
                .contains(&(leg.account.clone(), token.clone()))
            {
                return ReceiptStatus::TokenNotAssociatedToAccount;
            }
            *net.entry(&leg.account).or_insert(0) += i128::from(leg.amount);
        }

        for (account, change) in &net {
            let held = state
                .balances
                .get(&((*account).clone(), token.clone()))
                .copied()
                .unwrap_or(0);
            if i128::from(held) + change < 0 {
                return ReceiptStatus::InsufficientTokenBalance;
            }
        }

        for (account, change) in net {
            let balance = state
                .balances
                .entry((account.clone(), token.clone()))
                .or_insert(0);
            // Non-negative after the check above, and bounded by the token supply.
            *balance = (i128::from(*balance) + change) as u64;
        }

        ReceiptStatus::Success
    }
}

#[async_trait]
impl LedgerNetwork for SimulatedLedger {
    async fn submit(&self, signed: SignedOperation) -> Result<TransactionReceipt, NetworkError> {
        let latency = self.latency.lock().map(|l| *l).unwrap_or(Duration::ZERO);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let encoded = serde_json::to_vec(&signed)
            .map_err(|e| NetworkError::Transport(format!("encode failed: {e}")))?;
        let transaction_hash = hex::encode(Sha384::digest(&encoded));

        let mut state = self
            .state
            .lock()
            .map_err(|_| NetworkError::Transport("ledger state poisoned".to_string()))?;

        let payer = Self::precheck(&state, &signed)?;
        state
            .seen_transactions
            .insert(signed.operation.transaction_id.to_string());

        let applied = Self::apply(&mut state, &payer, &signed.operation.body);

        tracing::debug!(
            transaction_id = %signed.operation.transaction_id,
            status = %applied.status,
            "Simulated ledger applied operation"
        );

        Ok(TransactionReceipt {
            transaction_id: signed.operation.transaction_id,
            status: applied.status,
            transaction_hash,
            token_id: applied.token_id,
            topic_id: applied.topic_id,
            consensus_timestamp: Utc::now(),
        })
    }

    async fn token_balance(&self, account: &AccountId, token: &TokenId) -> Result<u64, NetworkError> {
        let state = self
            .state
            .lock()
            .map_err(|_| NetworkError::Transport("ledger state poisoned".to_string()))?;

        if !state.accounts.contains_key(account) {
            return Err(NetworkError::Rejected("INVALID_ACCOUNT_ID".to_string()));
        }

        Ok(state
            .balances
            .get(&(account.clone(), token.clone()))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::signing::tests::{OTHER_KEY_HEX, TEST_KEY_HEX};
    use crate::blockchain::signing::LocalKey;
    use crate::blockchain::types::{TransactionId, UnsignedOperation};

    fn keyed(num: u64, hex_key: &str, ledger: &SimulatedLedger) -> LocalKey {
        let key = LocalKey::from_hex(AccountId::from_num(num), hex_key).unwrap();
        ledger.register_account(key.account_id().clone(), key.public_key_hex());
        key
    }

    fn sign(key: &LocalKey, body: OperationBody) -> SignedOperation {
        let operation = UnsignedOperation {
            transaction_id: TransactionId::generate(key.account_id()),
            memo: None,
            body,
        };
        let pair = key.sign_operation(key.account_id(), &operation).unwrap();
        SignedOperation {
            operation,
            signatures: vec![pair],
        }
    }

    fn create_body(treasury: &AccountId, supply: u64) -> OperationBody {
        OperationBody::TokenCreate {
            name: "Aid".into(),
            symbol: "AIDX".into(),
            decimals: 2,
            initial_supply: supply,
            max_supply: supply * 10,
            supply_type: SupplyType::Finite,
            treasury: treasury.clone(),
            freeze_default: false,
        }
    }

    #[tokio::test]
    async fn token_create_credits_treasury() {
        let ledger = SimulatedLedger::new();
        let treasury = keyed(1001, TEST_KEY_HEX, &ledger);

        let receipt = ledger
            .submit(sign(&treasury, create_body(treasury.account_id(), 1000)))
            .await
            .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(receipt.transaction_hash.len(), 96);

        let token = receipt.token_id.unwrap();
        assert_eq!(token.num(), FIRST_ENTITY_NUM);
        assert_eq!(ledger.total_supply(&token), Some(1000));
        assert_eq!(
            ledger.token_balance(treasury.account_id(), &token).await.unwrap(),
            1000
        );
    }

    #[tokio::test]
    async fn unsigned_or_unknown_payers_are_rejected() {
        let ledger = SimulatedLedger::new();
        let registered = keyed(1001, TEST_KEY_HEX, &ledger);
        let stranger = LocalKey::from_hex(AccountId::from_num(1001), OTHER_KEY_HEX).unwrap();

        let err = ledger
            .submit(sign(&stranger, create_body(registered.account_id(), 10)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "INVALID_SIGNATURE");

        let unknown = LocalKey::from_hex(AccountId::from_num(9), TEST_KEY_HEX).unwrap();
        let err = ledger
            .submit(sign(&unknown, create_body(unknown.account_id(), 10)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "PAYER_ACCOUNT_NOT_FOUND");
        assert_eq!(ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_transaction_ids_are_rejected() {
        let ledger = SimulatedLedger::new();
        let treasury = keyed(1001, TEST_KEY_HEX, &ledger);
        let signed = sign(&treasury, create_body(treasury.account_id(), 10));

        ledger.submit(signed.clone()).await.unwrap();
        let err = ledger.submit(signed).await.unwrap_err();
        assert_eq!(err.to_string(), "DUPLICATE_TRANSACTION");
    }

    #[tokio::test]
    async fn transfers_require_association_and_balance() {
        let ledger = SimulatedLedger::new();
        let treasury = keyed(1001, TEST_KEY_HEX, &ledger);
        let recipient = keyed(2002, OTHER_KEY_HEX, &ledger);

        let token = ledger
            .submit(sign(&treasury, create_body(treasury.account_id(), 100)))
            .await
            .unwrap()
            .token_id
            .unwrap();

        let transfer = |amount: i64| OperationBody::TokenTransfer {
            token: token.clone(),
            transfers: vec![
                TransferLeg {
                    account: treasury.account_id().clone(),
                    amount: -amount,
                },
                TransferLeg {
                    account: recipient.account_id().clone(),
                    amount,
                },
            ],
        };

        let receipt = ledger.submit(sign(&treasury, transfer(10))).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::TokenNotAssociatedToAccount);

        let associate = OperationBody::TokenAssociate {
            account: recipient.account_id().clone(),
            tokens: vec![token.clone()],
        };
        let receipt = ledger.submit(sign(&recipient, associate)).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);

        let receipt = ledger.submit(sign(&treasury, transfer(500))).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::InsufficientTokenBalance);

        let receipt = ledger.submit(sign(&treasury, transfer(40))).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(
            ledger.token_balance(treasury.account_id(), &token).await.unwrap(),
            60
        );
        assert_eq!(
            ledger.token_balance(recipient.account_id(), &token).await.unwrap(),
            40
        );
    }

    #[tokio::test]
    async fn repeated_debit_legs_are_checked_together() {
        let ledger = SimulatedLedger::new();
        let treasury = keyed(1001, TEST_KEY_HEX, &ledger);
        let recipient = keyed(2002, OTHER_KEY_HEX, &ledger);
        let token = ledger
            .submit(sign(&treasury, create_body(treasury.account_id(), 100)))
            .await
            .unwrap()
            .token_id
            .unwrap();
        let associate = OperationBody::TokenAssociate {
            account: recipient.account_id().clone(),
            tokens: vec![token.clone()],
        };
        ledger.submit(sign(&recipient, associate)).await.unwrap();

        let debit = TransferLeg {
            account: treasury.account_id().clone(),
            amount: -60,
        };
        let body = OperationBody::TokenTransfer {
            token: token.clone(),
            transfers: vec![
                debit.clone(),
                debit,
                TransferLeg {
                    account: recipient.account_id().clone(),
                    amount: 120,
                },
            ],
        };
        let receipt = ledger.submit(sign(&treasury, body)).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::InsufficientTokenBalance);
        assert_eq!(
            ledger.token_balance(treasury.account_id(), &token).await.unwrap(),
            100
        );
        assert_eq!(
            ledger.token_balance(recipient.account_id(), &token).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn unbalanced_transfers_are_refused() {
        let ledger = SimulatedLedger::new();
        let treasury = keyed(1001, TEST_KEY_HEX, &ledger);
        let token = ledger
            .submit(sign(&treasury, create_body(treasury.account_id(), 100)))
            .await
            .unwrap()
            .token_id
            .unwrap();

        let body = OperationBody::TokenTransfer {
            token,
            transfers: vec![TransferLeg {
                account: treasury.account_id().clone(),
                amount: -5,
            }],
        };
        let receipt = ledger.submit(sign(&treasury, body)).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::TransfersNotZeroSumForToken);
    }

    #[tokio::test]
    async fn topics_append_in_order() {
        let ledger = SimulatedLedger::new();
        let operator = keyed(2, TEST_KEY_HEX, &ledger);

        let topic = ledger
            .submit(sign(
                &operator,
                OperationBody::TopicCreate {
                    memo: "audit".into(),
                    admin_key: operator.public_key_hex(),
                },
            ))
            .await
            .unwrap()
            .topic_id
            .unwrap();
        assert_eq!(ledger.topic_memo(&topic).as_deref(), Some("audit"));

        for message in ["first", "second"] {
            let receipt = ledger
                .submit(sign(
                    &operator,
                    OperationBody::TopicMessageSubmit {
                        topic: topic.clone(),
                        message: message.into(),
                    },
                ))
                .await
                .unwrap();
            assert!(receipt.status.is_success());
        }

        let messages = ledger.topic_messages(&topic);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sequence_number, 1);
        assert_eq!(messages[1].contents, "second");

        let receipt = ledger
            .submit(sign(
                &operator,
                OperationBody::TopicMessageSubmit {
                    topic: TopicId::from_num(1),
                    message: "lost".into(),
                },
            ))
            .await
            .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::InvalidTopicId);
    }
}
