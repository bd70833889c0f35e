// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::actor::UserId,
    blockchain::{AccountId, TokenId},
    error::ApiError,
    models::{CreateTokenRequest, CreatedToken, TokenBalanceResponse},
    state::AppState,
    storage::TokenRecord,
};

#[utoipa::path(
    get,
    path = "/v1/tokens",
    tag = "Tokens",
    responses((status = 200, description = "Active tokens, newest first", body = [TokenRecord]))
)]
pub async fn list_tokens(
    State(state): State<AppState>,
) -> Result<Json<Vec<TokenRecord>>, ApiError> {
    Ok(Json(state.distributions.list_active_tokens().await?))
}

#[utoipa::path(
    post,
    path = "/v1/tokens",
    request_body = CreateTokenRequest,
    params(("x-user-id" = String, Header, description = "Calling user")),
    tag = "Tokens",
    responses(
        (status = 201, body = CreatedToken),
        (status = 409, description = "No wallet connected"),
        (status = 422, description = "Missing or invalid fields"),
        (status = 502, description = "Ledger or mirror store failure")
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<CreatedToken>), ApiError> {
    let created = state
        .distributions
        .create_token(user.as_str(), request, &state.call_options())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/v1/tokens/{token_id}/balance/{account_id}",
    params(
        ("token_id" = String, Path, description = "Token id (`0.0.N`)"),
        ("account_id" = String, Path, description = "Account id (`0.0.N`)")
    ),
    tag = "Tokens",
    responses(
        (status = 200, body = TokenBalanceResponse),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn token_balance(
    Path((token_id, account_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    let token: TokenId = token_id.parse().map_err(ApiError::bad_request)?;
    let account: AccountId = account_id.parse().map_err(ApiError::bad_request)?;

    let balance = state
        .ledger
        .get_token_balance(&account, &token, &state.call_options())
        .await?;

    Ok(Json(TokenBalanceResponse {
        account_id: account.to_string(),
        token_id: token.to_string(),
        balance,
    }))
}
