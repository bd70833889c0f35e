// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hedera ledger integration.
//!
//! This module provides functionality for:
//! - Creating and associating fungible tokens (Hedera Token Service)
//! - Balanced token transfers with an audit trail on a consensus topic
//! - Point-in-time token balance queries
//! - Local secp256k1 signing for the operator credential

pub mod client;
pub mod network;
pub mod signing;
pub mod simulated;
pub mod types;

pub use client::{
    transfer_legs, LedgerClient, LedgerError, TokenCreationParams, TransferParams,
    DEFAULT_TOKEN_DECIMALS, DEFAULT_TRANSFER_MEMO, MAX_SUPPLY_MULTIPLIER,
};
pub use network::{LedgerNetwork, NetworkError};
pub use signing::{LocalKey, SigningError};
pub use simulated::SimulatedLedger;
pub use types::*;
