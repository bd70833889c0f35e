// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded from
//! them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `HEDERA_NETWORK` | Ledger network (`sandbox`, `testnet` or `mainnet`) | `sandbox` |
//! | `HEDERA_OPERATOR_ID` | Operator account for server-side signing | Optional |
//! | `HEDERA_OPERATOR_KEY` | Operator private key (hex or PEM) | Optional |
//! | `HEDERA_TRANSPARENCY_TOPIC_ID` | Topic receiving transfer audit entries | Optional (audit skipped) |
//! | `LEDGER_TIMEOUT_SECS` | Deadline for each wallet or ledger call | `30` |
//! | `MIRROR_STORE_URL` | PostgREST base URL of the mirror store | Optional (in-memory) |
//! | `MIRROR_STORE_API_KEY` | API key sent as `apikey` and bearer token | Required with URL |
//! | `HASHPACK_ACCOUNT_ID` / `HASHPACK_KEY` | Server-side keyed HashPack wallet | Optional |
//! | `BLADE_ACCOUNT_ID` / `BLADE_KEY` | Server-side keyed Blade wallet | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::time::Duration;

use crate::blockchain::{AccountId, LedgerNetworkKind, LocalKey, TopicId};
use crate::bounded::DEFAULT_CALL_TIMEOUT;
use crate::wallet::WalletProvider;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const HEDERA_NETWORK_ENV: &str = "HEDERA_NETWORK";
pub const HEDERA_OPERATOR_ID_ENV: &str = "HEDERA_OPERATOR_ID";
pub const HEDERA_OPERATOR_KEY_ENV: &str = "HEDERA_OPERATOR_KEY";
pub const HEDERA_TRANSPARENCY_TOPIC_ENV: &str = "HEDERA_TRANSPARENCY_TOPIC_ID";
pub const LEDGER_TIMEOUT_ENV: &str = "LEDGER_TIMEOUT_SECS";
pub const MIRROR_STORE_URL_ENV: &str = "MIRROR_STORE_URL";
pub const MIRROR_STORE_API_KEY_ENV: &str = "MIRROR_STORE_API_KEY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{var} is required when {because} is set")]
    Missing {
        var: &'static str,
        because: &'static str,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Mirror store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStoreConfig {
    pub url: String,
    pub api_key: String,
}

/// A wallet whose key the server holds.
#[derive(Debug, Clone)]
pub struct KeyedWalletConfig {
    pub provider: WalletProvider,
    pub key: LocalKey,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub network: LedgerNetworkKind,
    pub operator: Option<LocalKey>,
    pub transparency_topic: Option<TopicId>,
    pub call_timeout: Duration,
    pub mirror_store: Option<MirrorStoreConfig>,
    pub keyed_wallets: Vec<KeyedWalletConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| invalid(PORT_ENV, e))?,
            None => DEFAULT_PORT,
        };

        let network = match get(HEDERA_NETWORK_ENV) {
            Some(raw) => raw.parse().map_err(|e| invalid(HEDERA_NETWORK_ENV, e))?,
            None => LedgerNetworkKind::Sandbox,
        };

        let operator = match (get(HEDERA_OPERATOR_ID_ENV), get(HEDERA_OPERATOR_KEY_ENV)) {
            (Some(id), Some(key)) => Some(load_key(
                HEDERA_OPERATOR_ID_ENV,
                HEDERA_OPERATOR_KEY_ENV,
                &id,
                &key,
            )?),
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: HEDERA_OPERATOR_KEY_ENV,
                    because: HEDERA_OPERATOR_ID_ENV,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    var: HEDERA_OPERATOR_ID_ENV,
                    because: HEDERA_OPERATOR_KEY_ENV,
                })
            }
            (None, None) => None,
        };

        let transparency_topic = get(HEDERA_TRANSPARENCY_TOPIC_ENV)
            .map(|raw| raw.parse::<TopicId>().map_err(|e| invalid(HEDERA_TRANSPARENCY_TOPIC_ENV, e)))
            .transpose()?;

        let call_timeout = match get(LEDGER_TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| invalid(LEDGER_TIMEOUT_ENV, e))?;
                if secs == 0 {
                    return Err(invalid(LEDGER_TIMEOUT_ENV, "must be at least 1 second"));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_CALL_TIMEOUT,
        };

        let mirror_store = match (get(MIRROR_STORE_URL_ENV), get(MIRROR_STORE_API_KEY_ENV)) {
            (Some(url), Some(api_key)) => Some(MirrorStoreConfig { url, api_key }),
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: MIRROR_STORE_API_KEY_ENV,
                    because: MIRROR_STORE_URL_ENV,
                })
            }
            (None, _) => None,
        };

        let mut keyed_wallets = Vec::new();
        for provider in WalletProvider::ALL {
            let (id_var, key_var) = keyed_wallet_vars(provider);
            match (get(id_var), get(key_var)) {
                (Some(id), Some(key)) => keyed_wallets.push(KeyedWalletConfig {
                    provider,
                    key: load_key(id_var, key_var, &id, &key)?,
                }),
                (Some(_), None) => {
                    return Err(ConfigError::Missing {
                        var: key_var,
                        because: id_var,
                    })
                }
                (None, Some(_)) => {
                    return Err(ConfigError::Missing {
                        var: id_var,
                        because: key_var,
                    })
                }
                (None, None) => {}
            }
        }

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            network,
            operator,
            transparency_topic,
            call_timeout,
            mirror_store,
            keyed_wallets,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Account and key variables of a keyed wallet.
pub fn keyed_wallet_vars(provider: WalletProvider) -> (&'static str, &'static str) {
    match provider {
        WalletProvider::HashPack => ("HASHPACK_ACCOUNT_ID", "HASHPACK_KEY"),
        WalletProvider::Blade => ("BLADE_ACCOUNT_ID", "BLADE_KEY"),
    }
}

fn load_key(
    id_var: &'static str,
    key_var: &'static str,
    id: &str,
    key: &str,
) -> Result<LocalKey, ConfigError> {
    let account: AccountId = id.parse().map_err(|e| invalid(id_var, e))?;
    LocalKey::parse(account, key).map_err(|e| invalid(key_var, e))
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}
