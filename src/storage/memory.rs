// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process mirror store for local runs and tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::*;

#[derive(Debug, Default)]
struct Tables {
    tokens: Vec<TokenRecord>,
    aid_tokens: Vec<AidTokenRecord>,
    distributions: Vec<DistributionRecord>,
    transactions: Vec<LedgerTransactionRecord>,
}

/// Mirror store backed by in-memory tables.
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
    failing_tables: Mutex<HashSet<&'static str>>,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert fail, to exercise the ledger/mirror drift path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make inserts into one table fail while the others keep working.
    pub fn fail_writes_to(&self, table: &'static str) {
        if let Ok(mut tables) = self.failing_tables.lock() {
            tables.insert(table);
        }
    }

    /// All mirrored ledger transactions, oldest first.
    pub async fn transactions(&self) -> Vec<LedgerTransactionRecord> {
        self.tables.read().await.transactions.clone()
    }

    /// All aid token rows regardless of recipient, oldest first.
    pub async fn all_aid_tokens(&self) -> Vec<AidTokenRecord> {
        self.tables.read().await.aid_tokens.clone()
    }

    /// All distribution rows, oldest first.
    pub async fn all_distributions(&self) -> Vec<DistributionRecord> {
        self.tables.read().await.distributions.clone()
    }

    fn check_writable(&self, table: &'static str) -> MirrorResult<()> {
        let table_fails = self
            .failing_tables
            .lock()
            .map(|tables| tables.contains(table))
            .unwrap_or(false);
        if table_fails || self.fail_writes.load(Ordering::SeqCst) {
            return Err(MirrorError::Unavailable(format!("writes to `{table}` disabled")));
        }
        Ok(())
    }
}

/// Newest first; later inserts win ties.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = rows.iter().rev().cloned().collect();
    sorted.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    sorted
}

#[async_trait]
impl MirrorStore for InMemoryMirror {
    async fn active_token(&self) -> MirrorResult<Option<TokenRecord>> {
        Ok(self.list_active_tokens().await?.into_iter().next())
    }

    async fn list_active_tokens(&self) -> MirrorResult<Vec<TokenRecord>> {
        let tables = self.tables.read().await;
        let active: Vec<TokenRecord> = tables
            .tokens
            .iter()
            .filter(|token| token.is_active)
            .cloned()
            .collect();
        Ok(newest_first(&active, |token| token.created_at))
    }

    async fn insert_token(&self, token: NewToken) -> MirrorResult<TokenRecord> {
        self.check_writable(TOKENS_TABLE)?;
        let now = Utc::now();
        let record = TokenRecord {
            id: Uuid::new_v4(),
            creator_id: token.creator_id,
            name: token.name,
            symbol: token.symbol,
            supply: token.supply,
            ledger_token_id: Some(token.ledger_token_id),
            ledger_tx_id: Some(token.ledger_tx_id),
            is_active: token.is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.tokens.push(record.clone());
        Ok(record)
    }

    async fn insert_aid_token(&self, aid: NewAidToken) -> MirrorResult<AidTokenRecord> {
        self.check_writable(AID_TOKENS_TABLE)?;
        let now = Utc::now();
        let record = AidTokenRecord {
            id: Uuid::new_v4(),
            recipient_id: aid.recipient_id,
            token_id: aid.token_id,
            amount: aid.amount,
            token_type: aid.token_type,
            ledger_token_id: aid.ledger_token_id,
            ledger_tx_id: Some(aid.ledger_tx_id),
            restrictions: aid.restrictions,
            expires_at: aid.expires_at,
            is_active: aid.is_active,
            used_amount: aid.used_amount,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.aid_tokens.push(record.clone());
        Ok(record)
    }

    async fn list_aid_tokens(&self, recipient_id: &str) -> MirrorResult<Vec<AidTokenRecord>> {
        let tables = self.tables.read().await;
        let rows: Vec<AidTokenRecord> = tables
            .aid_tokens
            .iter()
            .filter(|aid| aid.recipient_id == recipient_id)
            .cloned()
            .collect();
        Ok(newest_first(&rows, |aid| aid.created_at))
    }

    async fn insert_distribution(
        &self,
        distribution: NewDistribution,
    ) -> MirrorResult<DistributionRecord> {
        self.check_writable(DISTRIBUTIONS_TABLE)?;
        let record = DistributionRecord {
            id: Uuid::new_v4(),
            aid_request_id: distribution.aid_request_id,
            distributor_id: distribution.distributor_id,
            recipient_id: distribution.recipient_id,
            amount: distribution.amount,
            ledger_token_id: Some(distribution.ledger_token_id),
            ledger_tx_id: Some(distribution.ledger_tx_id),
            memo: distribution.memo,
            status: distribution.status,
            distributed_at: Some(distribution.distributed_at),
            created_at: Utc::now(),
        };
        self.tables.write().await.distributions.push(record.clone());
        Ok(record)
    }

    async fn list_distributions(&self, user_id: &str) -> MirrorResult<Vec<DistributionRecord>> {
        let tables = self.tables.read().await;
        let rows: Vec<DistributionRecord> = tables
            .distributions
            .iter()
            .filter(|d| d.distributor_id == user_id || d.recipient_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&rows, |d| d.created_at))
    }

    async fn insert_transaction(
        &self,
        transaction: NewLedgerTransaction,
    ) -> MirrorResult<LedgerTransactionRecord> {
        self.check_writable(TRANSACTIONS_TABLE)?;
        let record = LedgerTransactionRecord {
            id: Uuid::new_v4(),
            tx_hash: transaction.tx_hash,
            tx_type: transaction.tx_type,
            from_address: transaction.from_address,
            to_address: transaction.to_address,
            amount: transaction.amount,
            shielded: transaction.shielded,
            status: transaction.status,
            metadata: transaction.metadata,
            created_at: Utc::now(),
        };
        self.tables.write().await.transactions.push(record.clone());
        Ok(record)
    }
}
