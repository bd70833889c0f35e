// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::blockchain::{LedgerClient, LedgerError, LedgerNetworkKind, SimulatedLedger};
use crate::bounded::CallOptions;
use crate::config::AppConfig;
use crate::distribution::{DistributionService, Notifier};
use crate::storage::{InMemoryMirror, MirrorError, MirrorStore, RestMirror};
use crate::wallet::{
    ExtensionSlot, KeyedExtension, WalletProvider, WalletRegistry, WalletSessionManager,
};

const TRANSPARENCY_TOPIC_MEMO: &str = "CrisisChain Aid Distribution Audit Log";

/// Startup failures while wiring the state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Only the in-process sandbox ledger is available to this build.
    #[error("no {} ledger transport is available; set HEDERA_NETWORK=sandbox", .0.as_str())]
    NetworkUnavailable(LedgerNetworkKind),

    #[error("mirror store: {0}")]
    Mirror(#[from] MirrorError),

    #[error("transparency topic: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<WalletSessionManager>,
    pub ledger: Arc<LedgerClient>,
    pub distributions: Arc<DistributionService>,
    pub call_timeout: Duration,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        sessions: Arc<WalletSessionManager>,
        ledger: Arc<LedgerClient>,
        distributions: Arc<DistributionService>,
        call_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sessions,
            ledger,
            distributions,
            call_timeout,
            shutdown,
        }
    }

    /// Deadline and cancellation for one request's wallet and ledger calls.
    pub fn call_options(&self) -> CallOptions {
        CallOptions::with_cancel(self.call_timeout, self.shutdown.child_token())
    }

    /// Wire the service against the in-process Hedera sandbox.
    ///
    /// Any other network is refused: results from the simulated ledger must
    /// never be labelled as testnet or mainnet. The operator and every keyed
    /// wallet are registered as sandbox accounts. With an operator and no
    /// configured topic, a transparency topic is created so transfers get
    /// audit entries.
    pub async fn from_config(
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, StateError> {
        if !config.network.is_sandbox() {
            return Err(StateError::NetworkUnavailable(config.network));
        }
        let network = config.network.config();
        warn!(network = network.label, "Using the simulated in-process ledger");
        let sandbox = Arc::new(SimulatedLedger::new());

        if let Some(operator) = &config.operator {
            sandbox.register_account(operator.account_id().clone(), operator.public_key_hex());
        }

        let hashpack = ExtensionSlot::new();
        let blade = ExtensionSlot::new();
        for wallet in &config.keyed_wallets {
            sandbox.register_account(wallet.key.account_id().clone(), wallet.key.public_key_hex());
            let slot = match wallet.provider {
                WalletProvider::HashPack => &hashpack,
                WalletProvider::Blade => &blade,
            };
            slot.inject(Arc::new(KeyedExtension::new(wallet.key.clone())));
            info!(
                provider = %wallet.provider,
                account_id = %wallet.key.account_id(),
                "Keyed wallet installed"
            );
        }

        let sessions = Arc::new(WalletSessionManager::new(Arc::new(
            WalletRegistry::with_slots(hashpack, blade),
        )));

        let build_client = || {
            let client = LedgerClient::new(network.clone(), sandbox.clone(), sessions.clone());
            match &config.operator {
                Some(operator) => client.with_operator(operator.clone()),
                None => client,
            }
        };

        let transparency_topic = match (&config.transparency_topic, &config.operator) {
            (Some(topic), _) => Some(topic.clone()),
            (None, Some(_)) => {
                let options = CallOptions::with_cancel(config.call_timeout, shutdown.child_token());
                Some(
                    build_client()
                        .create_transparency_topic(TRANSPARENCY_TOPIC_MEMO, &options)
                        .await?,
                )
            }
            (None, None) => {
                warn!("No operator or transparency topic configured; transfer audit disabled");
                None
            }
        };

        let ledger = Arc::new(match transparency_topic {
            Some(topic) => build_client().with_transparency_topic(topic),
            None => build_client(),
        });

        let mirror: Arc<dyn MirrorStore> = match &config.mirror_store {
            Some(store) => {
                info!(url = %store.url, "Using REST mirror store");
                Arc::new(RestMirror::new(&store.url, &store.api_key)?)
            }
            None => {
                warn!("MIRROR_STORE_URL not set; mirror rows are kept in memory");
                Arc::new(InMemoryMirror::new())
            }
        };

        let distributions = Arc::new(DistributionService::new(
            ledger.clone(),
            sessions.clone(),
            mirror,
            Arc::new(Notifier::default()),
        ));

        Ok(Self::new(
            sessions,
            ledger,
            distributions,
            config.call_timeout,
            shutdown,
        ))
    }
}
