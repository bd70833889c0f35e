// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CrisisChain - Aid Distribution Service on Hedera
//!
//! Connects a browser-style wallet (HashPack or Blade), executes token
//! operations on Hedera, and mirrors every confirmed operation into a
//! relational store for fast listing.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Hedera ledger client, signing, and the in-process sandbox
//! - `bounded` - Deadlines and cancellation for wallet and ledger calls
//! - `distribution` - Orchestration of ledger writes, mirror rows, and notifications
//! - `storage` - Mirror store (PostgREST or in-memory) and listing caches
//! - `wallet` - Wallet discovery and the single active session

pub mod api;
pub mod blockchain;
pub mod bounded;
pub mod config;
pub mod distribution;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
pub mod wallet;
