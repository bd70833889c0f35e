// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Time-bounded, cancellable execution of network-bound calls.
//!
//! Every wallet handshake, signature request and ledger submission runs
//! through [`run_bounded`]. The caller supplies both the deadline and the
//! [`CancellationToken`], so an abandoned request (client disconnect,
//! shutdown) stops waiting on a hung extension or network call.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default deadline for a single ledger or wallet call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline and cancellation handle for one logical operation.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl CallOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an existing token, typically a child of the shutdown token.
    pub fn with_cancel(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }
}

/// Why a bounded call stopped before its future resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    TimedOut(Duration),
    Cancelled,
}

/// Drive `fut` to completion unless the deadline passes or the token fires.
pub async fn run_bounded<F, T>(options: &CallOptions, fut: F) -> Result<T, Interrupted>
where
    F: Future<Output = T>,
{
    if options.cancel.is_cancelled() {
        return Err(Interrupted::Cancelled);
    }

    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(Interrupted::Cancelled),
        result = tokio::time::timeout(options.timeout, fut) => {
            result.map_err(|_| Interrupted::TimedOut(options.timeout))
        }
    }
}
