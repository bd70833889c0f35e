// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with the state of each component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Ledger network label (`hedera-sandbox`, `hedera-testnet`, `hedera-mainnet`).
    pub network: String,
    /// Mirror node of the configured network.
    pub mirror_node: String,
    /// "connected" or "disconnected".
    pub wallet_session: String,
    /// Whether an operator credential signs server-side.
    pub operator: bool,
    /// Whether transfers are appended to a transparency topic.
    pub transparency_log: bool,
}

/// Simple health check response for liveness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is healthy", body = ReadyResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<ReadyResponse> {
    let network = state.ledger.network();
    let wallet_session = if state.sessions.is_connected().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(ReadyResponse {
        status: "ok".to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            network: network.label.to_string(),
            mirror_node: network.mirror_node_url.to_string(),
            wallet_session: wallet_session.to_string(),
            operator: state.ledger.has_operator(),
            transparency_log: state.ledger.transparency_topic().is_some(),
        },
    })
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded::CallOptions;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn reports_network_and_session() {
        let (state, sb) = test_state();

        let Json(before) = health(State(state.clone())).await;
        assert_eq!(before.status, "ok");
        assert_eq!(before.checks.network, "hedera-sandbox");
        assert_eq!(before.checks.wallet_session, "disconnected");
        assert!(!before.checks.operator);

        sb.sessions
            .connect("HashPack", &CallOptions::default())
            .await
            .unwrap();
        let Json(after) = health(State(state)).await;
        assert_eq!(after.checks.wallet_session, "connected");
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let Json(response) = liveness().await;
        assert_eq!(response.status, "ok");
    }
}
