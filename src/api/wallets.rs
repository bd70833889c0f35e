// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::{ConnectRequest, WalletListResponse},
    state::AppState,
    wallet::{SessionState, WalletSession},
};

#[utoipa::path(
    get,
    path = "/v1/wallets",
    tag = "Wallets",
    responses((status = 200, body = WalletListResponse))
)]
pub async fn list_wallets(State(state): State<AppState>) -> Json<WalletListResponse> {
    Json(WalletListResponse {
        wallets: state.sessions.registry().list_wallets(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Wallets",
    responses((status = 200, body = SessionState))
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.sessions.state().await)
}

#[utoipa::path(
    post,
    path = "/v1/session/connect",
    request_body = ConnectRequest,
    tag = "Wallets",
    responses(
        (status = 200, body = WalletSession),
        (status = 400, description = "Wallet not installed"),
        (status = 409, description = "A session exists or is being established"),
        (status = 504, description = "Wallet did not respond in time")
    )
)]
pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<WalletSession>, ApiError> {
    let session = state
        .sessions
        .connect(&request.wallet, &state.call_options())
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/v1/session/replace",
    request_body = ConnectRequest,
    tag = "Wallets",
    responses(
        (status = 200, body = WalletSession),
        (status = 400, description = "Wallet not installed")
    )
)]
pub async fn replace_session(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<WalletSession>, ApiError> {
    let session = state
        .sessions
        .replace_session(&request.wallet, &state.call_options())
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/v1/session",
    tag = "Wallets",
    responses((status = 204))
)]
pub async fn disconnect_wallet(State(state): State<AppState>) -> StatusCode {
    state.sessions.disconnect().await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::AccountId;
    use crate::distribution::tests::{RECIPIENT, TREASURY};
    use crate::state::tests::test_state;
    use crate::wallet::WalletProvider;

    fn connect_request(wallet: &str) -> Json<ConnectRequest> {
        Json(ConnectRequest {
            wallet: wallet.to_string(),
        })
    }

    #[tokio::test]
    async fn lists_both_providers() {
        let (state, sb) = test_state();
        sb.hashpack.eject();

        let Json(response) = list_wallets(State(state)).await;
        assert_eq!(response.wallets.len(), 2);
        let hashpack = response
            .wallets
            .iter()
            .find(|w| w.provider == WalletProvider::HashPack)
            .unwrap();
        assert_eq!(hashpack.name, "HashPack");
        assert!(!hashpack.is_installed);
    }

    #[tokio::test]
    async fn connect_then_disconnect() {
        let (state, _sb) = test_state();

        let Json(session) = connect_wallet(State(state.clone()), connect_request("HashPack"))
            .await
            .unwrap();
        assert_eq!(session.account_id, AccountId::from_num(TREASURY));
        assert!(session.connected);

        let Json(current) = get_session(State(state.clone())).await;
        assert_eq!(current, SessionState::Connected { session });

        let status = disconnect_wallet(State(state.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let Json(current) = get_session(State(state)).await;
        assert_eq!(current, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn second_connect_conflicts_until_replaced() {
        let (state, _sb) = test_state();
        connect_wallet(State(state.clone()), connect_request("HashPack"))
            .await
            .unwrap();

        let err = connect_wallet(State(state.clone()), connect_request("Blade"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let Json(session) = replace_session(State(state), connect_request("blade"))
            .await
            .unwrap();
        assert_eq!(session.provider, WalletProvider::Blade);
        assert_eq!(session.account_id, AccountId::from_num(RECIPIENT));
    }

    #[tokio::test]
    async fn unknown_wallet_is_a_bad_request() {
        let (state, _sb) = test_state();
        let err = connect_wallet(State(state), connect_request("MetaMask"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
